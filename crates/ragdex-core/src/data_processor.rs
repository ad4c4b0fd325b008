//! Directory-backed document source.
//!
//! Walks a content tree of `.md`, `.mdx` and `.txt` files in sorted order and
//! turns each file into a [`Document`]:
//! - `id`: path relative to the root, without extension, `/`-separated
//! - `category`: the parent directory (`misc` for files at the root)
//! - `title`: front-matter `title:`, else the first `# ` heading, else the file stem
//! - `keywords`: front-matter `keywords:` (comma separated, brackets optional)
//!
//! Front matter is an optional leading block fenced by `---` lines.
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::traits::DocumentSource;
use crate::types::Document;

const EXTENSIONS: [&str; 3] = ["md", "mdx", "txt"];

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    limit: Option<usize>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), limit: None }
    }

    /// Only read the first `limit` files (in sorted order).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn process_directory(&self) -> Result<Vec<Document>> {
        let mut files = self.list_content_files();
        if files.is_empty() {
            info!(root = %self.root.display(), "no content files found");
            return Ok(vec![]);
        }
        if let Some(limit) = self.limit {
            files.truncate(limit);
        }
        let documents = self.read_documents(&files);
        info!(root = %self.root.display(), documents = documents.len(), "loaded documents from directory");
        Ok(documents)
    }

    /// Parse each file in order. A file that can't be read is logged and left out.
    fn read_documents(&self, files: &[PathBuf]) -> Vec<Document> {
        let mut documents = Vec::with_capacity(files.len());
        for file_path in files {
            let content = match self.read_file_content(file_path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %file_path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            let document = self.parse_document(file_path, &content);
            debug!(document.id = %document.id, path = %file_path.display(), "read document");
            documents.push(document);
        }
        documents
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn parse_document(&self, file_path: &Path, content: &str) -> Document {
        let relative_path = file_path.strip_prefix(&self.root).unwrap_or(file_path);
        let id = self.extract_doc_id(relative_path);
        let (front_matter, body) = split_front_matter(content);
        let body = if file_path.extension().and_then(|s| s.to_str()) == Some("mdx") {
            strip_mdx_statements(body)
        } else {
            body.to_string()
        };

        let mut title = None;
        let mut category = None;
        let mut keywords = Vec::new();
        for (key, value) in front_matter {
            match key {
                "title" => title = Some(value.to_string()),
                "category" => category = Some(value.to_string()),
                "keywords" | "tags" => keywords = parse_list(value),
                _ => {}
            }
        }
        let title = title
            .filter(|t| !t.is_empty())
            .or_else(|| first_h1(&body))
            .unwrap_or_else(|| file_stem(relative_path));
        let category = category
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.get_facet_from_path(relative_path));

        Document { id, title, category, body, keywords }
    }

    fn extract_doc_id(&self, relative_path: &Path) -> String {
        let without_ext = relative_path.with_extension("");
        without_ext
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn get_facet_from_path(&self, relative_path: &Path) -> String {
        if let Some(parent) = relative_path.parent() {
            if let Some(facet) = parent.to_str() {
                if !facet.is_empty() {
                    return facet.replace('\\', "/");
                }
            }
        }
        "misc".to_string()
    }

    fn list_content_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
            if EXTENSIONS.contains(&ext) {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        files
    }
}

impl DocumentSource for DirectorySource {
    fn documents(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            anyhow::bail!("content directory {} does not exist", self.root.display());
        }
        self.process_directory()
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
}

/// Split a leading `---` fenced block into `key: value` pairs and return the rest.
fn split_front_matter(content: &str) -> (Vec<(&str, &str)>, &str) {
    let trimmed = content.trim_start_matches('\u{feff}');
    let Some(rest) = trimmed.strip_prefix("---") else {
        return (Vec::new(), content);
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return (Vec::new(), content);
    };
    let mut pairs = Vec::new();
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let line = line.trim_end();
        if line == "---" {
            return (pairs, &rest[offset..]);
        }
        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            pairs.push((key.trim(), value));
        }
    }
    // unterminated block: treat the whole file as body
    (Vec::new(), content)
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn first_h1(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn strip_mdx_statements(body: &str) -> String {
    body.lines()
        .filter(|line| !(line.starts_with("import ") || line.starts_with("export ")))
        .collect::<Vec<_>>()
        .join("\n")
}
