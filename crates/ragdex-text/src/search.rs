//! Ranked retrieval over a [`TfIdfIndex`].
//!
//! `score = Σ qtf(t) × idf(t) × w(chunk, t)` over the query terms the chunk
//! contains, optionally divided by the chunk vector norm, then multiplied by
//! the title/section/keyword boosts whose field shares a term with the query.
//! Only chunks that share a term are visited.
use std::collections::{BTreeMap, HashSet};

use ragdex_core::config::ScoringConfig;
use ragdex_core::types::{Chunk, RetrievedChunk};

use crate::index::{FieldTerms, TfIdfIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk<'a> {
	pub chunk: &'a Chunk,
	/// Position in the index; the tie-breaker.
	pub position: usize,
	pub score: f32,
}

impl ScoredChunk<'_> {
	pub fn to_retrieved(&self) -> RetrievedChunk {
		RetrievedChunk::from_chunk(self.chunk, self.score)
	}
}

pub struct QueryScorer<'a> {
	index: &'a TfIdfIndex,
	config: &'a ScoringConfig,
}

impl<'a> QueryScorer<'a> {
	pub fn new(index: &'a TfIdfIndex, config: &'a ScoringConfig) -> Self {
		Self { index, config }
	}

	/// Top `k` chunks with a positive score, best first; equal scores keep index order.
	pub fn search(&self, query: &str, k: usize) -> Vec<ScoredChunk<'a>> {
		if k == 0 || self.index.is_empty() {
			return Vec::new();
		}
		let tokens = self.index.tokenizer().tokenize(query);
		if tokens.is_empty() {
			return Vec::new();
		}
		let query_len = tokens.len() as f32;
		let mut query_counts: BTreeMap<&str, u32> = BTreeMap::new();
		for token in &tokens {
			*query_counts.entry(token.as_str()).or_insert(0) += 1;
		}

		let mut accumulated = vec![0f32; self.index.len()];
		let mut touched: Vec<usize> = Vec::new();
		for (term, count) in &query_counts {
			let Some(stats) = self.index.term(term) else {
				continue;
			};
			let query_weight = *count as f32 / query_len * stats.idf;
			for posting in self.index.postings(term) {
				let position = posting.chunk as usize;
				if accumulated[position] == 0.0 {
					touched.push(position);
				}
				accumulated[position] += query_weight * posting.weight;
			}
		}
		touched.sort_unstable();
		touched.dedup();

		let query_terms: HashSet<&str> = query_counts.keys().copied().collect();
		let mut results: Vec<ScoredChunk<'a>> = touched
			.into_iter()
			.filter_map(|position| {
				let mut score = accumulated[position];
				if self.config.cosine_normalize {
					let norm = self.index.vector(position).map_or(0.0, |v| v.norm);
					if norm > 0.0 {
						score /= norm;
					}
				}
				if let Some(fields) = self.index.fields(position) {
					score *= self.boost(fields, &query_terms);
				}
				(score > 0.0).then(|| ScoredChunk { chunk: &self.index.chunks()[position], position, score })
			})
			.collect();

		results.sort_by(|a, b| b.score.total_cmp(&a.score));
		results.truncate(k);
		results
	}

	/// Product of the boosts whose field shares at least one term with the query.
	pub fn boost(&self, fields: &FieldTerms, query_terms: &HashSet<&str>) -> f32 {
		let hits = |field: &HashSet<String>| query_terms.iter().any(|t| field.contains(*t));
		let mut boost = 1.0;
		if hits(&fields.title) {
			boost *= self.config.title_boost;
		}
		if hits(&fields.section) {
			boost *= self.config.section_boost;
		}
		if hits(&fields.keywords) {
			boost *= self.config.keyword_boost;
		}
		boost
	}
}
