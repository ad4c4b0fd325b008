//! Process-wide holder of the active index.
//!
//! The first `load()` populates the slot from the snapshot, or by building
//! from the document source when the snapshot is missing or unusable; later
//! calls hand out the same `Arc` until `clear()`. The slow path runs under a
//! dedicated build mutex and re-checks the slot, so concurrent first callers
//! trigger a single build.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use ragdex_core::config::{IndexSettings, Settings};
use ragdex_core::traits::DocumentSource;
use ragdex_text::TfIdfIndex;

use crate::builder::{build_index, content_hash};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexOrigin {
    Snapshot,
    Runtime,
}

/// An index together with what it was built from.
#[derive(Debug)]
pub struct LoadedIndex {
    pub index: TfIdfIndex,
    pub origin: IndexOrigin,
    pub content_hash: String,
    pub document_count: usize,
    pub built_at: DateTime<Utc>,
}

impl LoadedIndex {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            index: snapshot.index,
            origin: IndexOrigin::Snapshot,
            content_hash: snapshot.content_hash,
            document_count: snapshot.document_count,
            built_at: snapshot.built_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub origin: IndexOrigin,
    pub documents: usize,
    pub chunks: usize,
    pub vocabulary: usize,
    pub content_hash: String,
    pub built_at: DateTime<Utc>,
}

pub struct IndexStore {
    source: Arc<dyn DocumentSource>,
    settings: IndexSettings,
    snapshot_path: Option<PathBuf>,
    rebuild_if_stale: bool,
    current: RwLock<Option<Arc<LoadedIndex>>>,
    build_lock: Mutex<()>,
    loads: AtomicUsize,
    builds: AtomicUsize,
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("snapshot_path", &self.snapshot_path)
            .field("rebuild_if_stale", &self.rebuild_if_stale)
            .field("loaded", &self.is_loaded())
            .field("loads", &self.loads())
            .field("builds", &self.builds())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct IndexStoreBuilder {
    settings: IndexSettings,
    snapshot_path: Option<PathBuf>,
    rebuild_if_stale: bool,
}

impl IndexStoreBuilder {
    pub fn settings(mut self, settings: IndexSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn rebuild_if_stale(mut self, enabled: bool) -> Self {
        self.rebuild_if_stale = enabled;
        self
    }

    pub fn build(self, source: Arc<dyn DocumentSource>) -> IndexStore {
        IndexStore {
            source,
            settings: self.settings,
            snapshot_path: self.snapshot_path,
            rebuild_if_stale: self.rebuild_if_stale,
            current: RwLock::new(None),
            build_lock: Mutex::new(()),
            loads: AtomicUsize::new(0),
            builds: AtomicUsize::new(0),
        }
    }
}

impl IndexStore {
    /// Runtime-build only; no snapshot.
    pub fn new(source: Arc<dyn DocumentSource>, settings: IndexSettings) -> Self {
        Self::builder().settings(settings).build(source)
    }

    pub fn builder() -> IndexStoreBuilder {
        IndexStoreBuilder::default()
    }

    /// Store wired from validated application settings; `base` resolves a relative snapshot path.
    pub fn from_settings(source: Arc<dyn DocumentSource>, settings: &Settings, base: &Path) -> Self {
        let mut builder = Self::builder()
            .settings(settings.index_settings())
            .rebuild_if_stale(settings.store.rebuild_if_stale);
        if let Some(path) = settings.data.resolved_snapshot_path(base) {
            builder = builder.snapshot_path(path);
        }
        builder.build(source)
    }

    /// Replace the snapshot location before first use.
    pub fn with_snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub fn source(&self) -> &Arc<dyn DocumentSource> {
        &self.source
    }

    /// The active index, populating it on first use.
    pub fn load(&self) -> anyhow::Result<Arc<LoadedIndex>> {
        if let Some(loaded) = self.get() {
            return Ok(loaded);
        }
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(loaded) = self.get() {
            return Ok(loaded);
        }
        let loaded = Arc::new(self.populate()?);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&loaded));
        self.loads.fetch_add(1, Ordering::SeqCst);
        info!(
            origin = ?loaded.origin,
            documents = loaded.document_count,
            chunks = loaded.index.len(),
            vocabulary = loaded.index.vocabulary_size(),
            "index loaded"
        );
        Ok(loaded)
    }

    /// The active index without loading.
    pub fn get(&self) -> Option<Arc<LoadedIndex>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Drop the active index; the next `load()` repopulates it.
    pub fn clear(&self) {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.current.write().unwrap_or_else(PoisonError::into_inner).take();
        if previous.is_some() {
            info!("index cleared");
        }
    }

    /// Times the slot was populated, from either origin.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Times an index was built from documents.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn origin(&self) -> Option<IndexOrigin> {
        self.get().map(|l| l.origin)
    }

    pub fn stats(&self) -> Option<IndexStats> {
        self.get().map(|l| IndexStats {
            origin: l.origin,
            documents: l.document_count,
            chunks: l.index.len(),
            vocabulary: l.index.vocabulary_size(),
            content_hash: l.content_hash.clone(),
            built_at: l.built_at,
        })
    }

    fn populate(&self) -> anyhow::Result<LoadedIndex> {
        let mut documents = None;
        if let Some(path) = &self.snapshot_path {
            match Snapshot::read_if_exists(path) {
                Ok(Some(snapshot)) => {
                    if snapshot.settings != self.settings {
                        warn!(path = %path.display(), "snapshot was built with different index settings");
                    }
                    if !self.rebuild_if_stale {
                        return Ok(LoadedIndex::from_snapshot(snapshot));
                    }
                    let current = match self.source.documents() {
                        Ok(docs) => docs,
                        Err(e) => {
                            warn!(error = %e, "cannot load documents for staleness check; using snapshot");
                            return Ok(LoadedIndex::from_snapshot(snapshot));
                        }
                    };
                    if content_hash(&current, &self.settings)? == snapshot.content_hash {
                        debug!("snapshot is current");
                        return Ok(LoadedIndex::from_snapshot(snapshot));
                    }
                    info!(path = %path.display(), "snapshot is stale; rebuilding");
                    documents = Some(current);
                }
                Ok(None) => debug!(path = %path.display(), "no snapshot; building at runtime"),
                Err(e) => warn!(path = %path.display(), error = %e, "snapshot unusable; building at runtime"),
            }
        }

        let documents = match documents {
            Some(docs) => docs,
            None => self.source.documents()?,
        };
        let built = build_index(&documents, &self.settings)?;
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(LoadedIndex {
            index: built.index,
            origin: IndexOrigin::Runtime,
            content_hash: built.content_hash,
            document_count: built.document_count,
            built_at: Utc::now(),
        })
    }
}
