use crate::types::{Document, RetrievedChunk};

/// The content-loading collaborator: yields every document available at build time.
///
/// Implementations may hand back documents that fail [`Document::validate`];
/// the index build skips those instead of aborting.
pub trait DocumentSource: Send + Sync {
    fn documents(&self) -> anyhow::Result<Vec<Document>>;
}

/// The surface the chat/assistant collaborator consumes.
///
/// Total over all inputs: "nothing relevant" is an empty `Vec`, never an error.
pub trait Retriever: Send + Sync {
    fn retrieve(&self, query: &str, limit: usize) -> Vec<RetrievedChunk>;
    fn clear_index(&self);
}
