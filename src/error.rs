//! Error types for label search
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use crate::vector::{VectorError, VectorStorageError};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for corpus loading, caching and ranking
#[derive(Error, Debug)]
pub enum SearchError {
    /// Configuration errors
    #[error("Unsupported embedding model '{model}'. Supported models: {supported}")]
    UnsupportedModel { model: String, supported: String },

    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    /// Corpus errors
    #[error("Data file not found: '{path}'")]
    DataNotFound { path: PathBuf },

    #[error("Failed to read CSV '{path}': {source}")]
    CsvRead { path: PathBuf, source: csv::Error },

    #[error("Column '{column}' not found in '{path}'. Available columns: {available}")]
    MissingColumn {
        path: PathBuf,
        column: String,
        available: String,
    },

    /// Model errors
    #[error("Failed to initialize embedding model '{model}': {reason}")]
    ModelInit { model: String, reason: String },

    #[error("Failed to generate embedding: {0}")]
    Embedding(#[from] VectorError),

    /// Cache errors
    #[error(
        "Embedding cache '{path}' has {cache_rows} rows but the corpus has {corpus_rows}. Refusing to score against a misaligned cache"
    )]
    CacheMismatch {
        path: PathBuf,
        cache_rows: usize,
        corpus_rows: usize,
    },

    #[error(
        "Embedding matrix has {embedding_rows} rows but the corpus has {corpus_rows}"
    )]
    MisalignedEmbeddings {
        embedding_rows: usize,
        corpus_rows: usize,
    },

    #[error("Embedding cache '{path}' was built from different labels than the current corpus")]
    CacheStale { path: PathBuf },

    #[error("Storage error: {message}\nSuggestion: {suggestion}")]
    Storage { message: String, suggestion: String },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;

impl SearchError {
    /// Get a stable status code for this error type.
    ///
    /// Used in JSON output for programmatic error handling.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::UnsupportedModel { .. } => "UNSUPPORTED_MODEL",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::DataNotFound { .. } => "DATA_NOT_FOUND",
            Self::CsvRead { .. } => "CSV_READ_ERROR",
            Self::MissingColumn { .. } => "MISSING_COLUMN",
            Self::ModelInit { .. } => "MODEL_INIT_ERROR",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::CacheMismatch { .. } => "CACHE_MISMATCH",
            Self::MisalignedEmbeddings { .. } => "MISALIGNED_EMBEDDINGS",
            Self::CacheStale { .. } => "CACHE_STALE",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::UnsupportedModel { .. } => vec![
                "Set semantic_search.model in .labelseek/settings.toml to a supported model",
                "Or pass --model with one of the supported names",
            ],
            Self::DataNotFound { .. } => vec![
                "Check data.csv_path in .labelseek/settings.toml",
                "Or pass --data with the path to the corpus CSV",
            ],
            Self::MissingColumn { .. } => vec![
                "Set data.label_column and data.domain_column to match the CSV header",
            ],
            Self::CacheMismatch { .. } | Self::CacheStale { .. } => vec![
                "Run 'labelseek index --force' to rebuild the embedding cache",
            ],
            Self::ModelInit { .. } => vec![
                "Ensure you have an internet connection for the first-time model download",
                "Check that semantic_search.model_cache_dir is writable",
            ],
            Self::Storage { .. } | Self::FileWrite { .. } => vec![
                "Check disk space and permissions in the cache directory",
            ],
            _ => vec![],
        }
    }
}

impl From<VectorStorageError> for SearchError {
    fn from(e: VectorStorageError) -> Self {
        SearchError::Storage {
            message: e.to_string(),
            suggestion: "The cache file may be corrupted. Run 'labelseek index --force'"
                .to_string(),
        }
    }
}
