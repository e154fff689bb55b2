//! Configuration module for label search.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.labelseek/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `LS_` and use double underscores
//! to separate nested levels:
//! - `LS_DATA__CSV_PATH=survey.csv` sets `data.csv_path`
//! - `LS_SEMANTIC_SEARCH__THRESHOLD=0.35` sets `semantic_search.threshold`
//! - `LS_SEMANTIC_SEARCH__MODEL=bge-small-en-v1.5` sets `semantic_search.model`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".labelseek";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .labelseek is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Corpus location and column names
    #[serde(default)]
    pub data: DataConfig,

    /// Embedding cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Semantic search settings
    #[serde(default)]
    pub semantic_search: SemanticSearchConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DataConfig {
    /// Path to the corpus CSV
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,

    /// Column holding the text that gets embedded
    #[serde(default = "default_label_column")]
    pub label_column: String,

    /// Column holding the categorical domain tag
    #[serde(default = "default_domain_column")]
    pub domain_column: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Directory for cached corpus embeddings
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SemanticSearchConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Minimum similarity for a row to be returned (exclusive)
    #[serde(default = "default_similarity_threshold")]
    pub threshold: f32,

    /// Maximum number of results, unlimited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Domains left out of the embedded corpus
    #[serde(default)]
    pub exclude_domains: Vec<String>,

    /// Where downloaded model weights are kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_cache_dir: Option<PathBuf>,

    /// Texts per model call when embedding the corpus
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_csv_path() -> PathBuf {
    PathBuf::from("data/labels.csv")
}
fn default_label_column() -> String {
    "label".to_string()
}
fn default_domain_column() -> String {
    "domain".to_string()
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(".labelseek/cache")
}
fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}
fn default_similarity_threshold() -> f32 {
    crate::semantic::thresholds::DEFAULT
}
fn default_batch_size() -> usize {
    256
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            debug: false,
            data: DataConfig::default(),
            cache: CacheConfig::default(),
            semantic_search: SemanticSearchConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            label_column: default_label_column(),
            domain_column: default_domain_column(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

impl Default for SemanticSearchConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            threshold: default_similarity_threshold(),
            limit: None,
            exclude_domains: Vec::new(),
            model_cache_dir: None,
            batch_size: default_batch_size(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore
            // stays part of the field name
            .merge(Env::prefixed("LS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for a .labelseek directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .labelseek is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'labelseek init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Resolve a configured path against the workspace root.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.workspace_root {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Corpus CSV path, resolved against the workspace root.
    pub fn csv_path(&self) -> PathBuf {
        self.resolve_path(&self.data.csv_path)
    }

    /// Embedding cache directory, resolved against the workspace root.
    pub fn cache_dir(&self) -> PathBuf {
        self.resolve_path(&self.cache.dir)
    }

    /// Directory for downloaded model weights.
    ///
    /// Defaults to the user cache directory so models are shared across projects.
    pub fn models_dir(&self) -> PathBuf {
        if let Some(dir) = &self.semantic_search.model_cache_dir {
            return self.resolve_path(dir);
        }
        dirs::cache_dir()
            .map(|dir| dir.join("labelseek").join("models"))
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("models"))
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Create the settings file under `root`.
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# labelseek configuration file

# Version of the configuration schema
version = 1

# Global debug mode
debug = false

[data]
# Corpus CSV (relative to the workspace root)
csv_path = "data/labels.csv"

# Column holding the text to search
label_column = "label"

# Column holding the domain tag used for filtering
domain_column = "domain"

[cache]
# Where corpus embeddings are cached, one file per (model, domain subset)
dir = ".labelseek/cache"

[semantic_search]
# Embedding model. Supported: {supported}
model = "all-MiniLM-L6-v2"

# Results must score strictly above this cosine similarity
threshold = {threshold}

# Maximum number of results (unset = unlimited)
# limit = 50

# Domains left out of the embedded corpus, e.g. ["imaging"]
exclude_domains = []

# Texts per model call when embedding the corpus
batch_size = 256

# Where model weights are downloaded (defaults to the user cache directory)
# model_cache_dir = ".labelseek/models"
"#,
            supported = crate::vector::SupportedModel::supported_names(),
            threshold = crate::semantic::thresholds::DEFAULT,
        );

        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}
