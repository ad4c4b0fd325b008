//! Shared plumbing for the ragdex binaries: logging, settings, source
//! selection, the offline snapshot build and snapshot verification.
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use ragdex_core::config::{resolve_with_base, Config, IndexSettings, Settings};
use ragdex_core::data_processor::DirectorySource;
use ragdex_core::source::JsonFileSource;
use ragdex_core::traits::DocumentSource;
use ragdex_core::types::{Document, RetrievedChunk};
use ragdex_retrieve::RetrievalFacade;
use ragdex_store::{build_index, build_index_with, IndexStore, Snapshot};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG`-driven logging to stderr, `info` by default.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Validated settings plus the directory relative paths resolve against.
pub struct App {
    pub settings: Settings,
    pub base: PathBuf,
}

impl App {
    pub fn load() -> anyhow::Result<Self> {
        let config = Config::load().map_err(|e| {
            eprintln!("Error loading config: {e}");
            e
        })?;
        let settings = config.settings()?;
        let base = env::current_dir()?;
        info!(env = config.env_name(), base = %base.display(), "configuration loaded");
        Ok(Self { settings, base })
    }

    pub fn from_settings(settings: Settings, base: PathBuf) -> Self {
        Self { settings, base }
    }

    /// `--json` beats `--docs`/positional dir, which beat `data.documents_json`, then `data.docs_dir`.
    pub fn source(&self, docs_dir: Option<PathBuf>, json: Option<PathBuf>) -> Arc<dyn DocumentSource> {
        if let Some(path) = json {
            return Arc::new(JsonFileSource::new(path));
        }
        if let Some(dir) = docs_dir {
            return Arc::new(DirectorySource::new(dir));
        }
        match self.settings.data.documents_json.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(path) => Arc::new(JsonFileSource::new(resolve_with_base(&self.base, path))),
            None => Arc::new(DirectorySource::new(resolve_with_base(&self.base, &self.settings.data.docs_dir))),
        }
    }

    pub fn snapshot_path(&self, explicit: Option<PathBuf>) -> Option<PathBuf> {
        explicit.or_else(|| self.settings.data.resolved_snapshot_path(&self.base))
    }

    /// `snapshot` overrides `data.snapshot_path`.
    pub fn store(&self, source: Arc<dyn DocumentSource>, snapshot: Option<PathBuf>) -> IndexStore {
        let store = IndexStore::from_settings(source, &self.settings, &self.base);
        match snapshot {
            Some(path) => store.with_snapshot_path(path),
            None => store,
        }
    }

    pub fn facade(&self, source: Arc<dyn DocumentSource>, snapshot: Option<PathBuf>) -> RetrievalFacade {
        RetrievalFacade::new(Arc::new(self.store(source, snapshot)), self.settings.scoring.clone())
    }
}

/// Flags and positionals, in the order given. Flags listed in `valued` consume the next argument.
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub positional: Vec<String>,
    pub flags: Vec<(String, Option<String>)>,
}

impl Args {
    pub fn parse<I: IntoIterator<Item = String>>(args: I, valued: &[&str]) -> anyhow::Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg.starts_with("--") || (arg.starts_with('-') && arg.len() == 2) {
                if valued.contains(&arg.as_str()) {
                    let Some(value) = args.next() else {
                        anyhow::bail!("{arg} requires a value");
                    };
                    parsed.flags.push((arg, Some(value)));
                } else {
                    parsed.flags.push((arg, None));
                }
            } else {
                parsed.positional.push(arg);
            }
        }
        Ok(parsed)
    }

    pub fn has(&self, names: &[&str]) -> bool {
        self.flags.iter().any(|(flag, _)| names.contains(&flag.as_str()))
    }

    pub fn value(&self, names: &[&str]) -> Option<&str> {
        self.flags
            .iter()
            .rev()
            .find(|(flag, _)| names.contains(&flag.as_str()))
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn path(&self, names: &[&str]) -> Option<PathBuf> {
        self.value(names).map(PathBuf::from)
    }

    pub fn usize(&self, names: &[&str]) -> anyhow::Result<Option<usize>> {
        self.value(names)
            .map(|v| {
                v.parse::<usize>()
                    .map_err(|_| anyhow::anyhow!("{} requires a number, got '{v}'", names.first().copied().unwrap_or("flag")))
            })
            .transpose()
    }
}

/// Chunk and index `documents` with a progress bar, returning the snapshot to persist.
pub fn build_snapshot(documents: &[Document], settings: &IndexSettings) -> anyhow::Result<Snapshot> {
    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let built = build_index_with(documents, settings, |document| {
        pb.set_message(document.id.clone());
        pb.inc(1);
    })?;
    pb.finish_with_message("indexed");
    Ok(Snapshot::from_build(built, settings.clone()))
}

/// Largest tolerated difference between stored and rebuilt weights.
pub const WEIGHT_TOLERANCE: f32 = 1e-6;

/// Compare a snapshot with a fresh build from `documents`. Empty means they agree.
pub fn verify_snapshot(snapshot: &Snapshot, documents: &[Document], settings: &IndexSettings) -> anyhow::Result<Vec<String>> {
    let fresh = build_index(documents, settings)?;
    let mut problems = Vec::new();
    if snapshot.settings != *settings {
        problems.push("index settings differ from the current configuration".to_string());
    }
    if snapshot.content_hash != fresh.content_hash {
        problems.push(format!("content hash {} != {}", snapshot.content_hash, fresh.content_hash));
    }
    if snapshot.chunk_count != fresh.index.len() {
        problems.push(format!("chunk count {} != {}", snapshot.chunk_count, fresh.index.len()));
        return Ok(problems);
    }

    let stored = &snapshot.index;
    if stored.vocabulary_size() != fresh.index.vocabulary_size() {
        problems.push(format!("vocabulary size {} != {}", stored.vocabulary_size(), fresh.index.vocabulary_size()));
    }
    for (term, stats) in fresh.index.terms() {
        match stored.term(term) {
            None => problems.push(format!("term '{term}' missing from snapshot")),
            Some(s) if s.document_frequency != stats.document_frequency || (s.idf - stats.idf).abs() > WEIGHT_TOLERANCE => {
                problems.push(format!("term '{term}' stats differ"));
            }
            Some(_) => {}
        }
    }
    for (position, (a, b)) in stored.chunks().iter().zip(fresh.index.chunks()).enumerate() {
        if a != b {
            problems.push(format!("chunk {position} ('{}') differs", b.chunk_id));
        }
    }
    for (position, (a, b)) in stored.vectors().iter().zip(fresh.index.vectors()).enumerate() {
        let same_terms = a.weights.len() == b.weights.len() && a.weights.keys().eq(b.weights.keys());
        let close = a.weights.values().zip(b.weights.values()).all(|(x, y)| (x - y).abs() <= WEIGHT_TOLERANCE);
        if !same_terms || !close {
            problems.push(format!("vector {position} differs"));
        }
    }
    Ok(problems)
}

pub fn print_results(results: &[RetrievedChunk]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for (i, r) in results.iter().enumerate() {
        let section = r.section.as_deref().map(|s| format!(" > {s}")).unwrap_or_default();
        println!("{:>2}. [{:.4}] {}{} ({})", i + 1, r.score, r.title, section, r.chunk_id);
        println!("    {}", preview(&r.text, 160));
    }
}

/// First `max` chars of `text` on one line.
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}...")
    }
}

pub fn display(path: Option<&Path>) -> String {
    path.map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
}
