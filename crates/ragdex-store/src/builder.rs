//! Runtime index build: documents → chunks → TF-IDF index, plus the content
//! hash that identifies what an index was built from.
use ragdex_core::chunking::Chunker;
use ragdex_core::config::IndexSettings;
use ragdex_core::error::Result;
use ragdex_core::types::Document;
use ragdex_text::TfIdfIndex;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub index: TfIdfIndex,
    pub content_hash: String,
    /// Documents that passed validation.
    pub document_count: usize,
    pub skipped: usize,
}

pub fn build_index(documents: &[Document], settings: &IndexSettings) -> Result<BuiltIndex> {
    build_index_with(documents, settings, |_| {})
}

/// Build while reporting each document as it is chunked (progress bars).
pub fn build_index_with<F>(documents: &[Document], settings: &IndexSettings, on_document: F) -> Result<BuiltIndex>
where
    F: FnMut(&Document),
{
    let content_hash = content_hash(documents, settings)?;
    let chunker = Chunker::new(settings.chunking.clone());
    let corpus = chunker.chunk_all_with(documents, on_document);
    debug!(documents = corpus.documents, chunks = corpus.chunks.len(), "chunked corpus");
    let index = TfIdfIndex::build(corpus.chunks, &settings.tokenizer);
    Ok(BuiltIndex { index, content_hash, document_count: corpus.documents, skipped: corpus.skipped.len() })
}

/// blake3 over the canonical JSON of the index settings and the documents, in order.
pub fn content_hash(documents: &[Document], settings: &IndexSettings) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&serde_json::to_vec(settings)?);
    for document in documents {
        hasher.update(&serde_json::to_vec(document)?);
        hasher.update(b"\n");
    }
    Ok(hasher.finalize().to_hex().to_string())
}
