//! Error types for enrichment operations.

use thiserror::Error;

/// Errors from the understanding service and its transport.
#[derive(Error, Debug)]
pub enum EnrichError {
    /// Understanding service is unreachable.
    #[error("Service not reachable at {base_url}")]
    ServiceUnreachable { base_url: String },

    /// Request timed out.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for enrichment operations.
pub type EnrichResult<T> = Result<T, EnrichError>;

impl EnrichError {
    /// Whether this error is a likely-temporary quota/rate-limit signal.
    /// Transient exhaustion escalates to the batch-stopping sentinel;
    /// everything else only skips the item.
    pub fn is_transient(&self) -> bool {
        match self {
            EnrichError::Api { status, message } => {
                if *status == 429 {
                    return true;
                }
                let lowered = message.to_lowercase();
                lowered.contains("quota")
                    || lowered.contains("rate limit")
                    || lowered.contains("resource_exhausted")
            }
            EnrichError::Http(e) => e.status().map(|s| s.as_u16() == 429).unwrap_or(false),
            _ => false,
        }
    }
}
