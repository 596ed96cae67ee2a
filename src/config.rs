//! Layered configuration for the pipeline.
//!
//! - Default values
//! - `axon.toml` configuration file
//! - `AXON_`-prefixed environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables use double underscores to separate nested levels:
//! - `AXON_INDEXING__PARALLEL_THREADS=8` sets `indexing.parallel_threads`
//! - `AXON_COUPLING__MIN_STRENGTH=0.4` sets `coupling.min_strength`
//! - `AXON_EMBEDDING__ENABLED=false` sets `embedding.enabled`

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Persistence directory, spec.md §6: `.axon/` under the repo root.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub languages: HashMap<String, LanguageConfig>,

    #[serde(default)]
    pub coupling: CouplingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Extra ignore globs layered on top of the composed `.gitignore` rules
    /// (spec.md §4.1).
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Declared source roots used by the import resolver for
    /// package-absolute specifiers (spec.md §4.4).
    #[serde(default)]
    pub source_roots: Vec<String>,

    /// BFS depth bound for the flow detector (spec.md §4.9, D=6).
    #[serde(default = "default_flow_depth")]
    pub flow_max_depth: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LanguageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CouplingConfig {
    /// Sliding window, in days, over the version-control log (spec.md §4.11).
    #[serde(default = "default_coupling_window_days")]
    pub window_days: i64,
    /// Minimum co-change count before a pair is considered (spec.md §4.11).
    #[serde(default = "default_coupling_min_co_changes")]
    pub min_co_changes: u32,
    /// Minimum coupling strength for an edge to be emitted (spec.md §4.11).
    #[serde(default = "default_coupling_min_strength")]
    pub min_strength: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// The embedding phase is entirely skippable by configuration
    /// (spec.md §4.12).
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_embedding_dim")]
    pub dimensions: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_storage_path() -> PathBuf {
    PathBuf::from(".axon")
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_flow_depth() -> usize {
    6
}
fn default_true() -> bool {
    true
}
fn default_coupling_window_days() -> i64 {
    180
}
fn default_coupling_min_co_changes() -> u32 {
    3
}
fn default_coupling_min_strength() -> f32 {
    0.3
}
fn default_embedding_dim() -> usize {
    384
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            storage_path: default_storage_path(),
            indexing: IndexingConfig::default(),
            languages: default_languages(),
            coupling: CouplingConfig::default(),
            embedding: EmbeddingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            ignore_patterns: vec![
                "node_modules/**".to_string(),
                ".git/**".to_string(),
                "*.generated.*".to_string(),
            ],
            source_roots: Vec::new(),
            flow_max_depth: default_flow_depth(),
        }
    }
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            window_days: default_coupling_window_days(),
            min_co_changes: default_coupling_min_co_changes(),
            min_strength: default_coupling_min_strength(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dimensions: default_embedding_dim(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

fn default_languages() -> HashMap<String, LanguageConfig> {
    let mut langs = HashMap::new();
    langs.insert(
        "python".to_string(),
        LanguageConfig { enabled: true, extensions: vec!["py".into(), "pyi".into()] },
    );
    langs.insert(
        "typescript".to_string(),
        LanguageConfig { enabled: true, extensions: vec!["ts".into(), "tsx".into(), "mts".into(), "cts".into()] },
    );
    langs.insert(
        "javascript".to_string(),
        LanguageConfig { enabled: true, extensions: vec!["js".into(), "jsx".into(), "mjs".into(), "cjs".into()] },
    );
    langs.insert(
        "csharp".to_string(),
        LanguageConfig { enabled: true, extensions: vec!["cs".into()] },
    );
    langs
}

impl Settings {
    /// Load configuration layering defaults, `axon.toml` in the repo root
    /// (if present), and `AXON_`-prefixed environment overrides.
    pub fn load(repo_root: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        let config_path = repo_root.as_ref().join("axon.toml");
        Self::load_from(config_path)
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed("AXON_").map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn language_enabled(&self, key: &str) -> bool {
        self.languages.get(key).map(|c| c.enabled).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_settings_enable_all_four_languages() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(settings.language_enabled("python"));
        assert!(settings.language_enabled("csharp"));
        assert_eq!(settings.coupling.min_strength, 0.3);
        assert_eq!(settings.coupling.min_co_changes, 3);
    }

    #[test]
    fn load_from_toml_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("axon.toml");
        std::fs::write(
            &path,
            r#"
[coupling]
min_strength = 0.5

[languages.python]
enabled = false
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.coupling.min_strength, 0.5);
        assert!(!settings.language_enabled("python"));
        // untouched defaults survive layering
        assert_eq!(settings.coupling.min_co_changes, 3);
    }

    #[test]
    fn save_then_reload_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("axon.toml");
        let mut settings = Settings::default();
        settings.coupling.window_days = 90;
        settings.save(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.coupling.window_days, 90);
    }
}
