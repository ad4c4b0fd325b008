use std::fmt;

use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

use ragdex_core::config::TokenizerConfig;

pub const STOP_WORDS: [&str; 60] = [
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

/// Simple tokenizer + lowercaser + stop-word filter, then a minimum length.
///
/// The same settings must be used for indexing and querying.
#[derive(Clone)]
pub struct Tokenizer {
	config: TokenizerConfig,
	analyzer: TextAnalyzer,
}

pub fn build_analyzer(stop_words: bool) -> TextAnalyzer {
	if stop_words {
		TextAnalyzer::builder(SimpleTokenizer::default())
			.filter(LowerCaser)
			.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
			.build()
	} else {
		TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build()
	}
}

impl Tokenizer {
	pub fn new(config: TokenizerConfig) -> Self {
		let analyzer = build_analyzer(config.stop_words);
		Self { config, analyzer }
	}

	pub fn config(&self) -> &TokenizerConfig {
		&self.config
	}

	pub fn tokenize(&self, text: &str) -> Vec<String> {
		// token_stream takes &mut self
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut tokens = Vec::new();
		while stream.advance() {
			let token = &stream.token().text;
			if token.chars().count() >= self.config.min_token_len {
				tokens.push(token.clone());
			}
		}
		tokens
	}
}

impl Default for Tokenizer {
	fn default() -> Self {
		Self::new(TokenizerConfig::default())
	}
}

impl PartialEq for Tokenizer {
	fn eq(&self, other: &Self) -> bool {
		self.config == other.config
	}
}

impl fmt::Debug for Tokenizer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Tokenizer").field("config", &self.config).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn with(stop_words: bool, min_token_len: usize) -> Tokenizer {
		Tokenizer::new(TokenizerConfig { stop_words, min_token_len, ..TokenizerConfig::default() })
	}

	#[test]
	fn lowercases_and_strips_punctuation() {
		let t = Tokenizer::default();
		assert_eq!(t.tokenize("Install the CLI, and run!"), vec!["install", "cli", "run"]);
		assert_eq!(t.tokenize("xyzzy-nonexistent-term"), vec!["xyzzy", "nonexistent", "term"]);
	}

	#[test]
	fn stop_words_can_be_kept() {
		assert_eq!(with(false, 1).tokenize("The API"), vec!["the", "api"]);
	}

	#[test]
	fn short_tokens_are_dropped() {
		assert_eq!(with(true, 3).tokenize("go to db setup"), vec!["setup"]);
	}

	#[test]
	fn non_ascii_is_kept() {
		let t = Tokenizer::default();
		assert_eq!(t.tokenize("Ünïcode Straße 東京"), vec!["ünïcode", "straße", "東京"]);
	}

	#[test]
	fn empty_and_stop_word_only_input() {
		let t = Tokenizer::default();
		assert!(t.tokenize("").is_empty());
		assert!(t.tokenize("the and of").is_empty());
	}

	#[test]
	fn repeated_calls_do_not_share_stream_state() {
		let t = Tokenizer::default();
		assert_eq!(t.tokenize("alpha beta"), t.tokenize("alpha beta"));
		assert_eq!(t.tokenize("gamma"), vec!["gamma"]);
	}
}
