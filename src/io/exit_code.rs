//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - the command completed and, for search, found hits
//! - `1`: General error - unspecified failure
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::SearchError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Search ran but nothing scored above the cutoff (code 3)
    NotFound = 3,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Embedding cache is stale, misaligned or unreadable (code 7)
    CacheCorrupted = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// `Success` when there are hits, `NotFound` when empty.
    pub fn from_hits<T>(hits: &[T]) -> Self {
        if hits.is_empty() {
            ExitCode::NotFound
        } else {
            ExitCode::Success
        }
    }

    /// Convert a `SearchError` to the appropriate exit code.
    ///
    /// Maps specific error types to semantic exit codes that scripts
    /// can use to determine appropriate recovery actions.
    pub fn from_error(error: &SearchError) -> Self {
        match error {
            SearchError::UnsupportedModel { .. }
            | SearchError::ConfigError { .. }
            | SearchError::MissingColumn { .. } => ExitCode::ConfigError,

            SearchError::DataNotFound { .. }
            | SearchError::CsvRead { .. }
            | SearchError::FileWrite { .. } => ExitCode::IoError,

            SearchError::CacheMismatch { .. }
            | SearchError::CacheStale { .. }
            | SearchError::MisalignedEmbeddings { .. }
            | SearchError::Storage { .. } => ExitCode::CacheCorrupted,

            SearchError::ModelInit { .. } | SearchError::Embedding(_) => ExitCode::GeneralError,
        }
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::NotFound => "No matching labels",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::CacheCorrupted => "Embedding cache unusable",
        }
    }
}
