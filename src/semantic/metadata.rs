//! Metadata sidecar for cached corpus embeddings.
//!
//! Tracks which model and corpus produced a cache file so a stale or
//! misaligned cache is rejected instead of silently mis-scoring rows.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata written next to every embedding cache file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Name of the embedding model used
    pub model_name: String,

    /// Dimension of embeddings
    pub dimension: usize,

    /// Number of embeddings stored (one per corpus row)
    pub embedding_count: usize,

    /// Domains left out of the embedded corpus, sorted
    #[serde(default)]
    pub excluded_domains: Vec<String>,

    /// SHA-256 of the corpus labels in row order
    pub corpus_fingerprint: String,

    /// Unix timestamp when created
    pub created_at: i64,

    /// Version of the metadata format
    pub version: u32,
}

impl CacheMetadata {
    /// Current metadata version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create new metadata with current timestamp
    pub fn new(
        model_name: impl Into<String>,
        dimension: usize,
        embedding_count: usize,
        excluded_domains: Vec<String>,
        corpus_fingerprint: String,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            dimension,
            embedding_count,
            excluded_domains,
            corpus_fingerprint,
            created_at: chrono::Utc::now().timestamp(),
            version: Self::CURRENT_VERSION,
        }
    }

    /// Creation time formatted for display.
    pub fn created_display(&self) -> String {
        chrono::DateTime::from_timestamp(self.created_at, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| self.created_at.to_string())
    }

    /// Save metadata to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), SearchError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| SearchError::Storage {
                message: format!("Failed to serialize cache metadata: {e}"),
                suggestion: "This is likely a bug in the code".to_string(),
            })?;

        std::fs::write(path, json).map_err(|e| SearchError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Load metadata from a JSON file
    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let json = std::fs::read_to_string(path).map_err(|e| SearchError::Storage {
            message: format!("Failed to read cache metadata '{}': {e}", path.display()),
            suggestion: "Run 'labelseek index --force' to rebuild the embedding cache"
                .to_string(),
        })?;

        let metadata: Self =
            serde_json::from_str(&json).map_err(|e| SearchError::Storage {
                message: format!("Failed to parse cache metadata: {e}"),
                suggestion:
                    "The metadata file may be corrupted. Run 'labelseek index --force'"
                        .to_string(),
            })?;

        // Check version compatibility
        if metadata.version > Self::CURRENT_VERSION {
            return Err(SearchError::Storage {
                message: format!(
                    "Cache metadata version {} is newer than supported version {}",
                    metadata.version,
                    Self::CURRENT_VERSION
                ),
                suggestion: "Upgrade labelseek or rebuild the cache".to_string(),
            });
        }

        Ok(metadata)
    }
}
