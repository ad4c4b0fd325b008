//! Heading-aware document chunking.
//!
//! A document body is first cut into sections at markdown-style heading lines;
//! each section becomes one chunk when it fits in `max_chars`. Longer sections
//! are split at paragraph, line, sentence and word boundaries (in that order of
//! preference) and the pieces are greedily merged back up to `max_chars`, with
//! `overlap_chars` of trailing words carried into the next chunk. Lengths are
//! counted in characters, not bytes.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::ChunkingConfig;
use crate::error::Error;
use crate::types::{Chunk, Document};

const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

/// Output of [`Chunker::chunk_all`].
#[derive(Debug, Default)]
pub struct ChunkedCorpus {
    pub chunks: Vec<Chunk>,
    /// Documents that passed validation (including ones that yielded no chunks).
    pub documents: usize,
    /// Malformed or duplicate documents that were left out.
    pub skipped: Vec<Error>,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split one document into chunks. An empty body yields no chunks.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for section in split_sections(&document.body) {
            let pieces = if char_len(&section.text) <= self.config.max_chars {
                vec![section.text]
            } else {
                split_text(&section.text, self.config.max_chars, self.config.overlap_chars)
            };
            for text in pieces {
                let chunk_index = chunks.len();
                chunks.push(Chunk {
                    chunk_id: format!("{}:{}", document.id, chunk_index),
                    document_id: document.id.clone(),
                    title: document.title.clone(),
                    section: section.heading.clone(),
                    text,
                    category: document.category.clone(),
                    keywords: document.keywords.clone(),
                    chunk_index,
                });
            }
        }
        chunks
    }

    /// Chunk a whole corpus in order, skipping malformed documents and repeated ids.
    pub fn chunk_all(&self, documents: &[Document]) -> ChunkedCorpus {
        self.chunk_all_with(documents, |_| {})
    }

    /// Like [`Chunker::chunk_all`], calling `on_document` before each document is handled.
    pub fn chunk_all_with<F>(&self, documents: &[Document], mut on_document: F) -> ChunkedCorpus
    where
        F: FnMut(&Document),
    {
        let mut corpus = ChunkedCorpus::default();
        let mut seen: HashSet<&str> = HashSet::new();
        for document in documents {
            on_document(document);
            if let Err(e) = document.validate() {
                warn!(error = %e, "skipping malformed document");
                corpus.skipped.push(e);
                continue;
            }
            if !seen.insert(document.id.as_str()) {
                let e = Error::BuildInput {
                    document_id: document.id.clone(),
                    reason: "duplicate id".to_string(),
                };
                warn!(error = %e, "skipping malformed document");
                corpus.skipped.push(e);
                continue;
            }
            let chunks = self.chunk(document);
            debug!(document.id = %document.id, chunk_count = chunks.len(), "chunked document");
            corpus.documents += 1;
            corpus.chunks.extend(chunks);
        }
        corpus
    }
}

struct Section {
    heading: Option<String>,
    text: String,
}

/// Parse a heading line (`#` to `######` followed by whitespace) into its text.
fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim().trim_end_matches('#').trim_end())
}

fn split_sections(body: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading: Option<String> = None;
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;

    let mut flush = |heading: &Option<String>, lines: &mut Vec<&str>| {
        let text = lines.join("\n").trim().to_string();
        if !text.is_empty() {
            sections.push(Section { heading: heading.clone(), text });
        }
        lines.clear();
    };

    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }
        match heading_text(line) {
            Some(text) if !in_fence => {
                flush(&heading, &mut lines);
                heading = if text.is_empty() { None } else { Some(text.to_string()) };
            }
            _ => lines.push(line),
        }
    }
    flush(&heading, &mut lines);
    sections
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split an oversized text into chunks of at most `max` characters.
fn split_text(text: &str, max: usize, overlap: usize) -> Vec<String> {
    let pieces = split_recursive(text, max, &SEPARATORS);
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        if piece.trim().is_empty() {
            continue;
        }
        let piece_len = char_len(&piece);
        if current.is_empty() {
            current = piece;
            current_len = piece_len;
        } else if current_len + piece_len <= max {
            current.push_str(&piece);
            current_len += piece_len;
        } else {
            let done = current.trim().to_string();
            let piece = piece.trim_start();
            let piece_len = char_len(piece);
            // one extra character for the joining space
            let budget = overlap.min(max.saturating_sub(piece_len + 1));
            let tail = overlap_tail(&done, budget);
            current = if tail.is_empty() { piece.to_string() } else { format!("{tail} {piece}") };
            current_len = char_len(&current);
            if !done.is_empty() {
                chunks.push(done);
            }
        }
    }
    let last = current.trim();
    if !last.is_empty() {
        chunks.push(last.to_string());
    }
    chunks
}

/// Split at the first separator, recursing with finer separators on segments
/// that are still too long. Every returned piece is at most `max` characters.
fn split_recursive(text: &str, max: usize, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= max {
        return vec![text.to_string()];
    }
    let Some((separator, rest)) = separators.split_first() else {
        return hard_split(text, max);
    };
    let mut pieces = Vec::new();
    for segment in split_keeping_separator(text, separator) {
        if char_len(segment) <= max {
            pieces.push(segment.to_string());
        } else {
            pieces.extend(split_recursive(segment, max, rest));
        }
    }
    pieces
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;
    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        result.push(&text[start..]);
    }
    result
}

fn hard_split(text: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(max.max(1)).map(|c| c.iter().collect()).collect()
}

/// The last `budget` characters of `prev`, trimmed forward to a word boundary.
fn overlap_tail(prev: &str, budget: usize) -> &str {
    if budget == 0 {
        return "";
    }
    let total = char_len(prev);
    if total <= budget {
        return prev;
    }
    let Some((start, _)) = prev.char_indices().nth(total - budget) else {
        return "";
    };
    let starts_on_boundary = prev[..start].ends_with(char::is_whitespace);
    let tail = if starts_on_boundary {
        &prev[start..]
    } else {
        match prev[start..].find(char::is_whitespace) {
            Some(ws) => &prev[start + ws..],
            None => "",
        }
    };
    tail.trim_start()
}
