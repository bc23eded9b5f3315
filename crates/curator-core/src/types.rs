//! Core domain types for the curator ingestion pipeline.

use crate::urlnorm;
use serde::{Deserialize, Serialize};

/// Reserved topic signalling that the understanding service ran out of quota.
/// Stops the whole batch.
pub const TOPIC_QUOTA_ERROR: &str = "Error Cuota API";

/// Reserved topic signalling a failed analysis for a single item.
/// Skips the item, the batch continues.
pub const TOPIC_ANALYSIS_ERROR: &str = "Error en Análisis";

/// Default topic when the service returns no classification.
pub const TOPIC_UNCLASSIFIED: &str = "Sin clasificar";

/// One unit of work submitted to the pipeline. Lives only for the duration
/// of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    /// A raw message file already read into memory.
    File { name: String, text: String },
    /// A plain link to analyze.
    Url(String),
    /// A video link analyzed through the transcript flow.
    VideoUrl(String),
}

impl SourceItem {
    /// Identity used for pre-filtering and progress reporting: the file
    /// name for file items, the URL otherwise.
    pub fn identity(&self) -> &str {
        match self {
            SourceItem::File { name, .. } => name,
            SourceItem::Url(url) | SourceItem::VideoUrl(url) => url,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, SourceItem::File { .. })
    }
}

/// Structured output of the content extractor for file items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub source_name: String,
    pub raw_date: String,
    pub raw_subject: String,
    pub body_text: String,
}

/// Normalized output of the enrichment client.
///
/// `topic` is never empty (defaults to [`TOPIC_UNCLASSIFIED`]); `tags` and
/// `urls` are always present with trimmed non-empty elements. The two
/// reserved topics carry batch control flow, not classifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub topic: String,
    pub tags: Vec<String>,
    pub summary_html: String,
    pub urls: Vec<String>,
    pub normalized_date: String,
    /// Non-fatal grounding advisories from the transcript flow. Logged,
    /// never persisted and never blocking.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<String>,
}

impl AnalysisResult {
    /// Whether this result carries the batch-stopping quota sentinel.
    pub fn is_quota_error(&self) -> bool {
        self.topic == TOPIC_QUOTA_ERROR
    }

    /// Whether this result carries the item-skipping failure sentinel.
    pub fn is_analysis_error(&self) -> bool {
        self.topic == TOPIC_ANALYSIS_ERROR
    }
}

/// Outcome status of a stored record, derived from its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Completed,
    Error,
}

/// A record before insertion; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub source_name: String,
    pub sent_at: String,
    pub topic: String,
    pub tags: Vec<String>,
    pub summary_html: String,
    pub urls: Vec<String>,
}

impl NewRecord {
    /// Build an insertable record from an analysis result.
    pub fn from_analysis(source_name: impl Into<String>, analysis: &AnalysisResult) -> Self {
        Self {
            source_name: source_name.into(),
            sent_at: analysis.normalized_date.clone(),
            topic: analysis.topic.clone(),
            tags: analysis.tags.clone(),
            summary_html: analysis.summary_html.clone(),
            urls: analysis.urls.clone(),
        }
    }

    /// Build an error record for an item that failed extraction or analysis.
    pub fn failure(
        source_name: impl Into<String>,
        sent_at: impl Into<String>,
        message: &str,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            sent_at: sent_at.into(),
            topic: TOPIC_ANALYSIS_ERROR.to_string(),
            tags: Vec::new(),
            summary_html: format!("<p>{}</p>", message),
            urls: Vec::new(),
        }
    }

    /// Normalized forms of every URL carried by this record.
    pub fn normalized_urls(&self) -> Vec<String> {
        urlnorm::normalize_all(&self.urls)
    }
}

/// A persisted record as read back from the store. Immutable once written;
/// the only lifecycle transition left is deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub source_name: String,
    pub sent_at: String,
    pub topic: String,
    pub tags: Vec<String>,
    pub summary_html: String,
    pub urls: Vec<String>,
}

impl StoredRecord {
    /// Status is not a column of its own: a record is an error record
    /// exactly when it carries the analysis-failure sentinel topic.
    pub fn status(&self) -> RecordStatus {
        if self.topic == TOPIC_ANALYSIS_ERROR {
            RecordStatus::Error
        } else {
            RecordStatus::Completed
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self.status() {
            RecordStatus::Error => Some(&self.summary_html),
            RecordStatus::Completed => None,
        }
    }
}
