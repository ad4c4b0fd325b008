//! Domain types shared by the chunker, the index and the retrieval facade.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type ChunkId = String;

/// A source content unit handed over by the content-loading collaborator.
///
/// - `id`: stable document identity (relative path, CMS slug, ...)
/// - `title`/`category`: display metadata, inherited by every chunk
/// - `body`: plain text; lines starting with `#` mark section headings
/// - `keywords`: ordered, possibly empty
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: String::new(),
            body: body.into(),
            keywords: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the fields the index cannot do without.
    ///
    /// An empty body is allowed: such a document simply yields no chunks.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::BuildInput {
                document_id: "<unnamed>".to_string(),
                reason: "missing id".to_string(),
            });
        }
        if self.title.trim().is_empty() {
            return Err(Error::BuildInput {
                document_id: self.id.clone(),
                reason: "missing title".to_string(),
            });
        }
        Ok(())
    }
}

/// A bounded slice of a document; the unit of retrieval.
///
/// `chunk_id` is `"{document_id}:{chunk_index}"` and unique within an index.
/// `text` is never empty and never longer than the configured maximum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub document_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub text: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub chunk_index: usize,
}

/// What the retrieval facade hands to the assistant. Higher score is better.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    pub chunk_id: ChunkId,
    pub document_id: String,
    pub title: String,
    pub section: Option<String>,
    pub category: String,
    pub text: String,
    pub score: f32,
}

impl RetrievedChunk {
    pub fn from_chunk(chunk: &Chunk, score: f32) -> Self {
        Self {
            chunk_id: chunk.chunk_id.clone(),
            document_id: chunk.document_id.clone(),
            title: chunk.title.clone(),
            section: chunk.section.clone(),
            category: chunk.category.clone(),
            text: chunk.text.clone(),
            score,
        }
    }
}
