use proptest::prelude::*;
use ragdex_core::chunking::Chunker;
use ragdex_core::config::{ChunkingConfig, ScoringConfig, TokenizerConfig};
use ragdex_core::types::{Chunk, Document};
use ragdex_text::{QueryScorer, TfIdfIndex};

fn two_docs() -> Vec<Document> {
	vec![
		Document::new("a", "Getting Started", "Install the CLI and run your first command"),
		Document::new("b", "API Reference", "Use the API key to authenticate requests"),
	]
}

fn build(docs: &[Document]) -> TfIdfIndex {
	let corpus = Chunker::new(ChunkingConfig::default()).chunk_all(docs);
	TfIdfIndex::build(corpus.chunks, &TokenizerConfig::default())
}

fn plain_chunk(id: &str, title: &str, text: &str) -> Chunk {
	Chunk {
		chunk_id: id.to_string(),
		document_id: id.to_string(),
		title: title.to_string(),
		section: None,
		text: text.to_string(),
		category: String::new(),
		keywords: Vec::new(),
		chunk_index: 0,
	}
}

#[test]
fn install_cli_ranks_getting_started_first() {
	let index = build(&two_docs());
	let config = ScoringConfig::default();
	let scorer = QueryScorer::new(&index, &config);

	let results = scorer.search("install CLI", 10);
	assert!(!results.is_empty());
	assert_eq!(results[0].chunk.title, "Getting Started");
	let best_b = results.iter().filter(|r| r.chunk.document_id == "b").map(|r| r.score).fold(0.0, f32::max);
	assert!(results[0].score > best_b);

	let top = scorer.search("install CLI", 1);
	assert_eq!(top.len(), 1);
	assert_eq!(top[0].chunk.title, "Getting Started");
}

#[test]
fn title_only_terms_match_when_headings_are_indexed() {
	let corpus = Chunker::new(ChunkingConfig::default()).chunk_all(&two_docs());
	let config = ScoringConfig::default();

	let plain = TfIdfIndex::build(corpus.chunks.clone(), &TokenizerConfig::default());
	assert!(QueryScorer::new(&plain, &config).search("getting", 5).is_empty());

	let tokenizer = TokenizerConfig { index_headings: true, ..TokenizerConfig::default() };
	let headed = TfIdfIndex::build(corpus.chunks, &tokenizer);
	let results = QueryScorer::new(&headed, &config).search("getting", 5);
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].chunk.title, "Getting Started");
	assert_eq!(QueryScorer::new(&headed, &config).search("reference", 5)[0].chunk.document_id, "b");
}

#[test]
fn unknown_terms_and_empty_queries_return_nothing() {
	let index = build(&two_docs());
	let config = ScoringConfig::default();
	let scorer = QueryScorer::new(&index, &config);
	assert!(scorer.search("xyzzy-nonexistent-term", 5).is_empty());
	assert!(scorer.search("", 5).is_empty());
	assert!(scorer.search("   ", 5).is_empty());
	assert!(scorer.search("the and of", 5).is_empty());
	assert!(scorer.search("install", 0).is_empty());
}

#[test]
fn empty_index_answers_nothing() {
	let index = build(&[]);
	assert!(index.is_empty());
	let config = ScoringConfig::default();
	assert!(QueryScorer::new(&index, &config).search("install", 5).is_empty());
}

#[test]
fn build_is_deterministic() {
	let docs = two_docs();
	let first = build(&docs);
	let second = build(&docs);
	assert_eq!(first, second);
	assert_eq!(
		serde_json::to_string(&first).expect("json"),
		serde_json::to_string(&second).expect("json")
	);
}

#[test]
fn serialized_index_round_trips_with_postings() {
	let index = build(&two_docs());
	let json = serde_json::to_string(&index).expect("json");
	let restored: TfIdfIndex = serde_json::from_str(&json).expect("parse");
	let config = ScoringConfig::default();
	let results = QueryScorer::new(&restored, &config).search("api key", 3);
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].chunk.document_id, "b");
}

#[test]
fn title_match_strictly_increases_score() {
	let index = TfIdfIndex::build(
		vec![
			plain_chunk("plain", "Overview", "configure the proxy server"),
			plain_chunk("titled", "Proxy", "configure the proxy server"),
		],
		&TokenizerConfig::default(),
	);
	let config = ScoringConfig::default();
	let results = QueryScorer::new(&index, &config).search("proxy", 10);
	assert_eq!(results.len(), 2);
	assert_eq!(results[0].chunk.chunk_id, "titled");
	assert!(results[0].score > results[1].score);
}

#[test]
fn section_and_keyword_boosts_stack() {
	let mut sectioned = plain_chunk("s", "Doc", "enable tracing output");
	sectioned.section = Some("Tracing".to_string());
	let mut both = sectioned.clone();
	both.chunk_id = "sk".to_string();
	both.keywords = vec!["tracing".to_string()];
	let index = TfIdfIndex::build(
		vec![plain_chunk("p", "Doc", "enable tracing output"), sectioned, both],
		&TokenizerConfig::default(),
	);
	let config = ScoringConfig::default();
	let results = QueryScorer::new(&index, &config).search("tracing", 10);
	let ids: Vec<&str> = results.iter().map(|r| r.chunk.chunk_id.as_str()).collect();
	assert_eq!(ids, vec!["sk", "s", "p"]);
	let ratio = results[0].score / results[2].score;
	assert!((ratio - config.section_boost * config.keyword_boost).abs() < 1e-4);
}

#[test]
fn ties_keep_insertion_order() {
	let index = TfIdfIndex::build(
		vec![
			plain_chunk("first", "Doc", "shared words here"),
			plain_chunk("other", "Doc", "unrelated text"),
			plain_chunk("second", "Doc", "shared words here"),
		],
		&TokenizerConfig::default(),
	);
	let config = ScoringConfig::default();
	let results = QueryScorer::new(&index, &config).search("shared", 10);
	let ids: Vec<&str> = results.iter().map(|r| r.chunk.chunk_id.as_str()).collect();
	assert_eq!(ids, vec!["first", "second"]);
	assert_eq!(results[0].score, results[1].score);
}

#[test]
fn cosine_normalization_favours_focused_chunks() {
	let index = TfIdfIndex::build(
		vec![
			plain_chunk("long", "Doc", "proxy alpha beta gamma delta epsilon zeta"),
			plain_chunk("short", "Doc", "proxy setup"),
		],
		&TokenizerConfig::default(),
	);
	let config = ScoringConfig::default();
	let results = QueryScorer::new(&index, &config).search("proxy", 10);
	assert_eq!(results[0].chunk.chunk_id, "short");
}

fn arb_docs() -> impl Strategy<Value = Vec<Document>> {
	proptest::collection::vec(("[a-z]{1,6}", "[a-z ]{0,60}"), 0..12).prop_map(|entries| {
		entries
			.into_iter()
			.enumerate()
			.map(|(i, (title, body))| Document::new(format!("doc{i}"), title, body))
			.collect()
	})
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(100))]

	#[test]
	fn top_k_is_bounded_sorted_and_positive(
		docs in arb_docs(),
		query in "[a-z ]{0,20}",
		k in 0usize..8,
	) {
		let index = build(&docs);
		let config = ScoringConfig::default();
		let results = QueryScorer::new(&index, &config).search(&query, k);
		prop_assert!(results.len() <= k);
		prop_assert!(results.iter().all(|r| r.score > 0.0));
		for pair in results.windows(2) {
			prop_assert!(pair[0].score >= pair[1].score);
			if pair[0].score == pair[1].score {
				prop_assert!(pair[0].position < pair[1].position);
			}
		}
	}

	#[test]
	fn rebuilding_gives_identical_index(docs in arb_docs()) {
		prop_assert_eq!(build(&docs), build(&docs));
	}
}
