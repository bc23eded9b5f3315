//! Wire types for the understanding service and the auxiliary fetcher.

use serde::{Deserialize, Serialize};

/// Request body for the understanding service's analyze endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub model: String,
    pub prompt: String,
    /// Desired shape of the structured response.
    pub schema: serde_json::Value,
}

/// The structured response fields requested from the service.
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "topic": { "type": "string" },
            "tags": { "type": "array", "items": { "type": "string" } },
            "summaryHtml": { "type": "string" },
            "urls": { "type": "array", "items": { "type": "string" } },
            "normalizedDate": { "type": "string" }
        },
        "required": ["topic", "tags", "summaryHtml", "urls", "normalizedDate"]
    })
}

/// Request body for both fetcher endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct FetchRequest {
    pub url: String,
}

/// Success envelope from the auxiliary fetcher.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Error envelope from the auxiliary fetcher.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchErrorResponse {
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}
