//! ragdex-retrieve
//!
//! The surface the assistant talks to: ranked chunks for a query, plus the
//! context block that goes into the prompt.
use std::sync::Arc;

use ragdex_core::config::ScoringConfig;
use ragdex_core::traits::Retriever;
use ragdex_core::types::RetrievedChunk;
use ragdex_store::IndexStore;
use ragdex_text::QueryScorer;
use tracing::{debug, error};

pub struct RetrievalFacade {
    store: Arc<IndexStore>,
    scoring: ScoringConfig,
}

impl RetrievalFacade {
    pub fn new(store: Arc<IndexStore>, scoring: ScoringConfig) -> Self {
        Self { store, scoring }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Like [`RetrievalFacade::retrieve`] but surfaces index load failures.
    pub fn try_retrieve(&self, query: &str, limit: usize) -> anyhow::Result<Vec<RetrievedChunk>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let loaded = self.store.load()?;
        let results: Vec<RetrievedChunk> = QueryScorer::new(&loaded.index, &self.scoring)
            .search(query, limit)
            .iter()
            .map(|hit| hit.to_retrieved())
            .collect();
        debug!(query, limit, hits = results.len(), "retrieved");
        Ok(results)
    }

    /// Up to `limit` chunks, best first. Never fails: an index that cannot be
    /// loaded is logged and answers with no results.
    pub fn retrieve(&self, query: &str, limit: usize) -> Vec<RetrievedChunk> {
        self.try_retrieve(query, limit).unwrap_or_else(|e| {
            error!(error = %e, "index unavailable; returning no results");
            Vec::new()
        })
    }

    pub fn retrieve_default(&self, query: &str) -> Vec<RetrievedChunk> {
        self.retrieve(query, self.scoring.default_limit)
    }

    /// Forces a rebuild on the next query.
    pub fn clear_index(&self) {
        self.store.clear();
    }

    pub fn format_context(&self, results: &[RetrievedChunk]) -> String {
        format_context(results, self.scoring.context_max_chars)
    }
}

impl Retriever for RetrievalFacade {
    fn retrieve(&self, query: &str, limit: usize) -> Vec<RetrievedChunk> {
        RetrievalFacade::retrieve(self, query, limit)
    }

    fn clear_index(&self) {
        RetrievalFacade::clear_index(self);
    }
}

/// Numbered context block, one entry per result:
///
/// ```text
/// [1] Title > Section
/// chunk text
/// ```
///
/// Whole entries are appended while they fit in `max_chars` (counted in
/// chars); a first entry that is too long on its own is cut to the bound.
pub fn format_context(results: &[RetrievedChunk], max_chars: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for (i, result) in results.iter().enumerate() {
        let separator = if out.is_empty() { "" } else { "\n\n" };
        let heading = match &result.section {
            Some(section) => format!("[{}] {} > {}", i + 1, result.title, section),
            None => format!("[{}] {}", i + 1, result.title),
        };
        let entry = format!("{separator}{heading}\n{}", result.text.trim());
        let len = entry.chars().count();
        if used + len > max_chars {
            if out.is_empty() {
                out.extend(entry.chars().take(max_chars));
            }
            break;
        }
        used += len;
        out.push_str(&entry);
    }
    out
}
