//! TF-IDF index over chunks.
//!
//! Built once from the full ordered chunk sequence and immutable afterwards.
//! `tf = count / chunk token count`, `idf = ln((1 + N) / (1 + df)) + 1`, and
//! each chunk vector stores only its non-zero `tf × idf` weights. Vocabulary
//! and vectors are ordered maps so two builds over the same input are
//! bit-identical and serialize to the same bytes.
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use ragdex_core::config::TokenizerConfig;
use ragdex_core::error::Error;
use ragdex_core::types::Chunk;

use crate::tokenize::Tokenizer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermStats {
	/// Number of chunks containing the term at least once.
	pub document_frequency: u32,
	pub idf: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkVector {
	pub weights: BTreeMap<String, f32>,
	/// L2 norm of `weights`.
	pub norm: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
	/// Position of the chunk in [`TfIdfIndex::chunks`].
	pub chunk: u32,
	pub weight: f32,
}

/// Tokenized title/section/keyword fields, used for query-time boosts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldTerms {
	pub title: HashSet<String>,
	pub section: HashSet<String>,
	pub keywords: HashSet<String>,
}

/// Serialized form of an index; see [`TfIdfIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexParts {
	pub tokenizer: TokenizerConfig,
	pub chunks: Vec<Chunk>,
	pub terms: BTreeMap<String, TermStats>,
	pub vectors: Vec<ChunkVector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexParts")]
pub struct TfIdfIndex {
	tokenizer: TokenizerConfig,
	chunks: Vec<Chunk>,
	terms: BTreeMap<String, TermStats>,
	vectors: Vec<ChunkVector>,
	#[serde(skip)]
	postings: HashMap<String, Vec<Posting>>,
	#[serde(skip)]
	fields: Vec<FieldTerms>,
	#[serde(skip)]
	analyzer: Tokenizer,
}

impl TfIdfIndex {
	/// Index an ordered chunk sequence. An empty sequence yields a valid empty index.
	pub fn build(chunks: Vec<Chunk>, tokenizer_config: &TokenizerConfig) -> Self {
		let tokenizer = Tokenizer::new(tokenizer_config.clone());

		let mut counts: Vec<(BTreeMap<String, u32>, usize)> = Vec::with_capacity(chunks.len());
		let mut document_frequency: BTreeMap<String, u32> = BTreeMap::new();
		for chunk in &chunks {
			let tokens = if tokenizer_config.index_headings {
				let mut tokens = tokenizer.tokenize(&chunk.title);
				if let Some(section) = chunk.section.as_deref() {
					tokens.extend(tokenizer.tokenize(section));
				}
				tokens.extend(tokenizer.tokenize(&chunk.text));
				tokens
			} else {
				tokenizer.tokenize(&chunk.text)
			};
			let total = tokens.len();
			let mut term_counts: BTreeMap<String, u32> = BTreeMap::new();
			for token in tokens {
				*term_counts.entry(token).or_insert(0) += 1;
			}
			for term in term_counts.keys() {
				*document_frequency.entry(term.clone()).or_insert(0) += 1;
			}
			counts.push((term_counts, total));
		}

		let n = chunks.len();
		let terms: BTreeMap<String, TermStats> = document_frequency
			.into_iter()
			.map(|(term, df)| (term, TermStats { document_frequency: df, idf: smoothed_idf(n, df) }))
			.collect();

		let vectors: Vec<ChunkVector> = counts
			.into_iter()
			.map(|(term_counts, total)| {
				let weights: BTreeMap<String, f32> = term_counts
					.into_iter()
					.filter_map(|(term, count)| {
						let idf = terms.get(&term)?.idf;
						let weight = count as f32 / total as f32 * idf;
						(weight > 0.0).then_some((term, weight))
					})
					.collect();
				let norm = l2_norm(&weights);
				ChunkVector { weights, norm }
			})
			.collect();

		debug!(chunks = n, vocabulary = terms.len(), "built tf-idf index");
		Self::assemble(tokenizer, chunks, terms, vectors)
	}

	pub fn empty(tokenizer_config: &TokenizerConfig) -> Self {
		Self::build(Vec::new(), tokenizer_config)
	}

	fn assemble(
		analyzer: Tokenizer,
		chunks: Vec<Chunk>,
		terms: BTreeMap<String, TermStats>,
		vectors: Vec<ChunkVector>,
	) -> Self {
		let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
		for (position, vector) in vectors.iter().enumerate() {
			for (term, weight) in &vector.weights {
				postings
					.entry(term.clone())
					.or_default()
					.push(Posting { chunk: position as u32, weight: *weight });
			}
		}
		let fields = chunks
			.iter()
			.map(|chunk| FieldTerms {
				title: analyzer.tokenize(&chunk.title).into_iter().collect(),
				section: chunk
					.section
					.as_deref()
					.map(|s| analyzer.tokenize(s).into_iter().collect())
					.unwrap_or_default(),
				keywords: chunk.keywords.iter().flat_map(|k| analyzer.tokenize(k)).collect(),
			})
			.collect();
		let tokenizer = analyzer.config().clone();
		Self { tokenizer, chunks, terms, vectors, postings, fields, analyzer }
	}

	/// The analyzer chunks were indexed with; queries must go through the same one.
	pub fn tokenizer(&self) -> &Tokenizer {
		&self.analyzer
	}

	pub fn tokenizer_config(&self) -> &TokenizerConfig {
		&self.tokenizer
	}

	pub fn chunks(&self) -> &[Chunk] {
		&self.chunks
	}

	pub fn len(&self) -> usize {
		self.chunks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chunks.is_empty()
	}

	pub fn vocabulary_size(&self) -> usize {
		self.terms.len()
	}

	pub fn terms(&self) -> &BTreeMap<String, TermStats> {
		&self.terms
	}

	pub fn term(&self, term: &str) -> Option<&TermStats> {
		self.terms.get(term)
	}

	pub fn vectors(&self) -> &[ChunkVector] {
		&self.vectors
	}

	pub fn vector(&self, position: usize) -> Option<&ChunkVector> {
		self.vectors.get(position)
	}

	pub fn postings(&self, term: &str) -> &[Posting] {
		self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn fields(&self, position: usize) -> Option<&FieldTerms> {
		self.fields.get(position)
	}

	pub fn into_parts(self) -> IndexParts {
		IndexParts { tokenizer: self.tokenizer, chunks: self.chunks, terms: self.terms, vectors: self.vectors }
	}
}

impl TryFrom<IndexParts> for TfIdfIndex {
	type Error = Error;

	/// Rejects bodies whose vectors don't line up with the chunks or use unknown terms.
	fn try_from(parts: IndexParts) -> Result<Self, Self::Error> {
		if parts.vectors.len() != parts.chunks.len() {
			return Err(Error::SnapshotParse(format!(
				"{} vectors for {} chunks",
				parts.vectors.len(),
				parts.chunks.len()
			)));
		}
		for vector in &parts.vectors {
			for (term, weight) in &vector.weights {
				if !parts.terms.contains_key(term) {
					return Err(Error::SnapshotParse(format!("vector term '{term}' missing from vocabulary")));
				}
				if !weight.is_finite() || *weight < 0.0 {
					return Err(Error::SnapshotParse(format!("invalid weight {weight} for term '{term}'")));
				}
			}
		}
		Ok(Self::assemble(Tokenizer::new(parts.tokenizer), parts.chunks, parts.terms, parts.vectors))
	}
}

fn smoothed_idf(total_chunks: usize, document_frequency: u32) -> f32 {
	((1 + total_chunks) as f32 / (1 + document_frequency) as f32).ln() + 1.0
}

fn l2_norm(weights: &BTreeMap<String, f32>) -> f32 {
	weights.values().map(|w| w * w).sum::<f32>().sqrt()
}
