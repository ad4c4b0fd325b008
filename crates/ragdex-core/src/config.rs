//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys use `__`, e.g. `APP_SCORING__TITLE_BOOST=3.0`). Every key is
//! optional; [`Config::settings`] fills the gaps with defaults and validates.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name };
        config.validate_for_env()?;
        Ok(config)
    }

    /// Builds a config from an already assembled figment, skipping file lookup.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment, env_name: "test".to_string() }
    }

    pub fn from_toml_str(toml: &str) -> Self {
        Self::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// Extracts the full typed settings tree and validates it.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self) -> anyhow::Result<()> {
        match self.env_name.as_str() {
            "prod" | "production" => {
                // Production serves a prebuilt snapshot; a runtime build is only the fallback.
                let settings = self.settings()?;
                if settings.data.snapshot_path.is_none() {
                    return Err(anyhow::anyhow!("data.snapshot_path must be set in production"));
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataConfig,
    pub chunking: ChunkingConfig,
    pub tokenizer: TokenizerConfig,
    pub scoring: ScoringConfig,
    pub store: StoreConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.tokenizer.validate()?;
        self.scoring.validate()
    }

    /// The subset of settings that determines index contents.
    pub fn index_settings(&self) -> IndexSettings {
        IndexSettings { chunking: self.chunking.clone(), tokenizer: self.tokenizer.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root of the markdown/text tree read by `DirectorySource`.
    pub docs_dir: String,
    /// JSON array of documents; preferred over `docs_dir` when set.
    pub documents_json: Option<String>,
    pub snapshot_path: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            docs_dir: "content".to_string(),
            documents_json: None,
            snapshot_path: Some("data/rag-index.json".to_string()),
        }
    }
}

impl DataConfig {
    /// `snapshot_path` resolved against `base`; unset or blank means no snapshot.
    pub fn resolved_snapshot_path(&self, base: &Path) -> Option<PathBuf> {
        self.snapshot_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| resolve_with_base(base, p))
    }
}

/// Chunk length bounds, in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_chars: 1000, overlap_chars: 100 }
    }
}

impl ChunkingConfig {
    pub fn builder() -> ChunkingConfigBuilder {
        ChunkingConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(Error::InvalidConfig("chunking.max_chars must be greater than zero".to_string()));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap_chars ({}) must be less than chunking.max_chars ({})",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChunkingConfigBuilder {
    config: ChunkingConfig,
}

impl ChunkingConfigBuilder {
    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.config.max_chars = max_chars;
        self
    }

    pub fn overlap_chars(mut self, overlap_chars: usize) -> Self {
        self.config.overlap_chars = overlap_chars;
        self
    }

    pub fn build(self) -> Result<ChunkingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Drop the fixed English stop-word list.
    pub stop_words: bool,
    /// Tokens shorter than this (in characters) are dropped.
    pub min_token_len: usize,
    /// Also index each chunk's title and section label, so terms that only
    /// occur there still match. Off: those fields only drive boosts.
    pub index_headings: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { stop_words: true, min_token_len: 1, index_headings: false }
    }
}

impl TokenizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_token_len == 0 {
            return Err(Error::InvalidConfig("tokenizer.min_token_len must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Query-time tuning. Boosts multiply the base TF-IDF score and stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub title_boost: f32,
    pub section_boost: f32,
    pub keyword_boost: f32,
    /// Divide by the chunk vector norm so long chunks don't win on length alone.
    pub cosine_normalize: bool,
    pub default_limit: usize,
    /// Upper bound for the context block handed to the assistant.
    pub context_max_chars: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            title_boost: 2.0,
            section_boost: 1.5,
            keyword_boost: 1.3,
            cosine_normalize: true,
            default_limit: 5,
            context_max_chars: 4000,
        }
    }
}

impl ScoringConfig {
    pub fn builder() -> ScoringConfigBuilder {
        ScoringConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("title_boost", self.title_boost),
            ("section_boost", self.section_boost),
            ("keyword_boost", self.keyword_boost),
        ] {
            if !value.is_finite() || value < 1.0 {
                return Err(Error::InvalidConfig(format!("scoring.{name} must be >= 1.0, got {value}")));
            }
        }
        if self.default_limit == 0 {
            return Err(Error::InvalidConfig("scoring.default_limit must be greater than zero".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoringConfigBuilder {
    config: ScoringConfig,
}

impl ScoringConfigBuilder {
    pub fn title_boost(mut self, boost: f32) -> Self {
        self.config.title_boost = boost;
        self
    }

    pub fn section_boost(mut self, boost: f32) -> Self {
        self.config.section_boost = boost;
        self
    }

    pub fn keyword_boost(mut self, boost: f32) -> Self {
        self.config.keyword_boost = boost;
        self
    }

    pub fn cosine_normalize(mut self, enabled: bool) -> Self {
        self.config.cosine_normalize = enabled;
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    pub fn context_max_chars(mut self, max_chars: usize) -> Self {
        self.config.context_max_chars = max_chars;
        self
    }

    pub fn build(self) -> Result<ScoringConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Compare the snapshot's content hash with the live documents and rebuild on mismatch.
    pub rebuild_if_stale: bool,
}

/// Everything that changes what an index build produces; recorded in snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    pub chunking: ChunkingConfig,
    pub tokenizer: TokenizerConfig,
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_defaults() {
        let settings = Config::from_toml_str("").settings().expect("settings");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let cfg = Config::from_toml_str("[scoring]\ntitle_boost = 3.5\n[chunking]\nmax_chars = 400\n");
        let settings = cfg.settings().expect("settings");
        assert_eq!(settings.scoring.title_boost, 3.5);
        assert_eq!(settings.scoring.section_boost, 1.5);
        assert_eq!(settings.chunking.max_chars, 400);
        assert_eq!(settings.chunking.overlap_chars, 100);
    }

    #[test]
    fn boosts_below_one_are_rejected() {
        let cfg = Config::from_toml_str("[scoring]\nkeyword_boost = 0.5\n");
        assert!(cfg.settings().is_err());
        assert!(ScoringConfig::builder().title_boost(0.9).build().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_max() {
        assert!(ChunkingConfig::builder().max_chars(50).overlap_chars(50).build().is_err());
        assert!(ChunkingConfig::builder().max_chars(0).overlap_chars(0).build().is_err());
        let ok = ChunkingConfig::builder().max_chars(50).overlap_chars(10).build().expect("valid");
        assert_eq!(ok.max_chars, 50);
    }

    #[test]
    fn blank_snapshot_path_means_none() {
        let base = Path::new("/srv/app");
        let data = Config::from_toml_str("[data]\nsnapshot_path = \"  \"\n").settings().expect("settings").data;
        assert_eq!(data.resolved_snapshot_path(base), None);
        assert_eq!(
            DataConfig::default().resolved_snapshot_path(base),
            Some(PathBuf::from("/srv/app/data/rag-index.json"))
        );
    }

    #[test]
    fn index_headings_is_read_from_toml() {
        let settings = Config::from_toml_str("[tokenizer]\nindex_headings = true\n").settings().expect("settings");
        assert!(settings.tokenizer.index_headings);
        assert!(settings.index_settings().tokenizer.stop_words);
        assert!(!Settings::default().tokenizer.index_headings);
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let base = Path::new("/srv/app");
        assert_eq!(resolve_with_base(base, "/tmp/x.json"), PathBuf::from("/tmp/x.json"));
        assert_eq!(resolve_with_base(base, "data/x.json"), PathBuf::from("/srv/app/data/x.json"));
    }
}
