//! ragdex-text
//!
//! Tokenizer, TF-IDF index build and query scoring. See `index` and `search`.
pub mod index;
pub mod search;
pub mod tokenize;

pub use index::{ChunkVector, IndexParts, TermStats, TfIdfIndex};
pub use search::{QueryScorer, ScoredChunk};
pub use tokenize::Tokenizer;
