//! Format definitions for CLI output.
//!
//! Provides structured format types for consistent JSON responses.

use crate::error::SearchError;
use crate::io::exit_code::ExitCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default)
    Text,
    /// JSON for scripts
    Json,
}

impl OutputFormat {
    /// Create format from JSON flag.
    #[must_use]
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }

    /// Check if format is JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Standard JSON response format.
///
/// Provides consistent structure for both success and error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonResponse<T = serde_json::Value>
where
    T: Serialize,
{
    /// Status: "success" or "error"
    pub status: String,

    /// Result code (e.g., "OK", "NOT_FOUND", "CACHE_MISMATCH")
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Actual data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Error details and suggestions (only for errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,

    /// Exit code for shell scripts
    pub exit_code: u8,

    /// Metadata (execution time, version, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

/// Error details for JSON responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Recovery suggestions
    pub suggestions: Vec<String>,
}

/// Response metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Version of the tool
    pub version: String,
    /// Embedding model that produced the scores
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Timestamp of the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Execution time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ResponseMeta {
    /// Metadata stamped with the crate version and current time.
    pub fn now() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            model: None,
            timestamp: Some(format_utc_timestamp()),
            execution_time_ms: None,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn with_elapsed(mut self, elapsed: std::time::Duration) -> Self {
        self.execution_time_ms = Some(elapsed.as_millis() as u64);
        self
    }
}

impl<T> JsonResponse<T>
where
    T: Serialize,
{
    /// Create a success response with data.
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            code: "OK".to_string(),
            message: "Operation completed successfully".to_string(),
            data: Some(data),
            error: None,
            exit_code: ExitCode::Success as u8,
            meta: None,
        }
    }

    /// A successful run that produced no hits. `data` still carries the
    /// (empty) payload so consumers see a stable shape.
    pub fn empty(data: T, message: &str) -> Self {
        Self {
            status: "success".to_string(),
            code: "NOT_FOUND".to_string(),
            message: message.to_string(),
            data: Some(data),
            error: None,
            exit_code: ExitCode::NotFound as u8,
            meta: None,
        }
    }

    /// Add metadata to the response.
    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl JsonResponse<serde_json::Value> {
    /// Create a generic error response.
    pub fn error(code: ExitCode, message: &str, suggestions: Vec<&str>) -> Self {
        Self {
            status: "error".to_string(),
            code: format!("{code:?}").to_uppercase(),
            message: message.to_string(),
            data: None,
            error: Some(ErrorDetails {
                suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            }),
            exit_code: code as u8,
            meta: None,
        }
    }

    /// Create an error response from SearchError.
    pub fn from_error(error: &SearchError) -> Self {
        Self {
            status: "error".to_string(),
            code: error.status_code().to_string(),
            message: error.to_string(),
            data: None,
            error: Some(ErrorDetails {
                suggestions: error
                    .recovery_suggestions()
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
            exit_code: ExitCode::from_error(error) as u8,
            meta: None,
        }
    }
}

/// Format current time as UTC timestamp string.
///
/// Returns a string in the format "YYYY-MM-DD HH:MM:SS UTC".
pub fn format_utc_timestamp() -> String {
    let now = Utc::now();
    now.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_output_format_from_flag() {
        assert_eq!(OutputFormat::from_json_flag(true), OutputFormat::Json);
        assert_eq!(OutputFormat::from_json_flag(false), OutputFormat::Text);
    }

    #[test]
    fn test_json_response_success() {
        #[derive(Serialize)]
        struct TestData {
            label: String,
            score: f32,
        }

        let data = TestData {
            label: "Hours of sleep".to_string(),
            score: 0.5,
        };

        let response = JsonResponse::success(data).with_meta(ResponseMeta::now());
        assert_eq!(response.status, "success");
        assert_eq!(response.code, "OK");
        assert_eq!(response.exit_code, 0);
        assert!(response.data.is_some());
        assert!(response.error.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["label"], "Hours of sleep");
        assert!(json["meta"]["version"].is_string());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_json_response_empty_keeps_data() {
        let response = JsonResponse::empty(Vec::<u8>::new(), "No labels scored above 0.2");
        assert_eq!(response.code, "NOT_FOUND");
        assert_eq!(response.exit_code, 3);
        assert_eq!(response.data.as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_json_response_from_error() {
        let err = SearchError::CacheStale {
            path: PathBuf::from(".labelseek/cache/m__all.vec"),
        };
        let response = JsonResponse::from_error(&err);
        assert_eq!(response.status, "error");
        assert_eq!(response.code, "CACHE_STALE");
        assert_eq!(response.exit_code, 7);
        assert!(!response.error.unwrap().suggestions.is_empty());
    }
}
