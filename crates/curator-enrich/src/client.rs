//! Understanding-service client and the `Analyzer` seam.

use crate::error::{EnrichError, EnrichResult};
use crate::fetcher::{FetchClient, FetchedContent};
use crate::normalize::{self, ShapeContext};
use crate::prompt;
use crate::retry::RetryPolicy;
use crate::transcript;
use crate::types::{response_schema, AnalyzeRequest};
use async_trait::async_trait;
use curator_config::{Config, ServiceConfig};
use curator_core::{
    AnalysisResult, ExtractedRecord, TOPIC_ANALYSIS_ERROR, TOPIC_QUOTA_ERROR,
};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// The analysis seam the pipeline depends on.
///
/// Expected failure modes never surface as errors: exhausted retries come
/// back as sentinel-topic results so the pipeline can tell "stop the batch"
/// (quota) from "skip this item" (everything else).
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze_record(&self, record: &ExtractedRecord) -> AnalysisResult;
    async fn analyze_url(&self, url: &str, transcript_flow: bool) -> AnalysisResult;
}

/// Low-level HTTP client for the understanding service.
#[derive(Clone)]
pub struct UnderstandingClient {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl UnderstandingClient {
    pub fn from_config(config: &ServiceConfig) -> EnrichResult<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(EnrichError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout,
        })
    }

    /// One analysis call; the retry policy lives a level up.
    pub async fn analyze(&self, prompt: &str) -> EnrichResult<serde_json::Value> {
        let url = format!("{}/v1/analyze", self.base_url);
        let request = AnalyzeRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            schema: response_schema(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EnrichError::ServiceUnreachable {
                        base_url: self.base_url.clone(),
                    }
                } else if e.is_timeout() {
                    EnrichError::Timeout {
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    EnrichError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EnrichError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: serde_json::Value = response.json().await?;
        Ok(body)
    }
}

/// High-level enrichment client: aux fetching, retry, response shaping.
#[derive(Clone)]
pub struct EnrichClient {
    service: UnderstandingClient,
    fetcher: Option<FetchClient>,
    retry: RetryPolicy,
}

impl EnrichClient {
    pub fn from_config(config: &Config) -> EnrichResult<Self> {
        let fetcher = if config.fetcher.enabled {
            Some(FetchClient::from_config(&config.fetcher)?)
        } else {
            None
        };

        Ok(Self {
            service: UnderstandingClient::from_config(&config.service)?,
            fetcher,
            retry: RetryPolicy::from_config(&config.pipeline),
        })
    }

    async fn request(&self, operation: &str, prompt: &str) -> EnrichResult<serde_json::Value> {
        self.retry
            .run(operation, || self.service.analyze(prompt))
            .await
    }

    async fn fetch_aux(&self, url: &str, transcript_flow: bool) -> Option<FetchedContent> {
        let fetcher = self.fetcher.as_ref()?;
        if transcript_flow {
            fetcher.youtube_transcript(url).await
        } else {
            fetcher.scrape_url(url).await
        }
    }
}

/// Sentinel result for an error that exhausted its retries.
pub(crate) fn sentinel_result(source_label: &str, err: &EnrichError) -> AnalysisResult {
    let (topic, summary_html) = if err.is_transient() {
        (
            TOPIC_QUOTA_ERROR,
            "<p>API quota exhausted; retry the batch later.</p>".to_string(),
        )
    } else {
        (
            TOPIC_ANALYSIS_ERROR,
            format!("<p>Analysis failed for {source_label}: {err}</p>"),
        )
    };

    AnalysisResult {
        topic: topic.to_string(),
        tags: Vec::new(),
        summary_html,
        urls: Vec::new(),
        normalized_date: normalize::normalize_date(None, None),
        advisories: Vec::new(),
    }
}

#[async_trait]
impl Analyzer for EnrichClient {
    async fn analyze_record(&self, record: &ExtractedRecord) -> AnalysisResult {
        let prompt = prompt::record_prompt(record);

        match self.request("analyze_record", &prompt).await {
            Ok(raw) => normalize::shape_result(
                &raw,
                &ShapeContext {
                    source_label: &record.source_name,
                    input_url: None,
                    aux_date: None,
                },
            ),
            Err(e) => {
                warn!(source = %record.source_name, error = %e, "Record analysis exhausted retries");
                sentinel_result(&record.source_name, &e)
            }
        }
    }

    async fn analyze_url(&self, url: &str, transcript_flow: bool) -> AnalysisResult {
        let aux = self.fetch_aux(url, transcript_flow).await;

        // A transcript only drives the analysis when it looks like real
        // speech; junk falls back to the plain URL prompt.
        let transcript_text = if transcript_flow {
            aux.as_ref()
                .filter(|a| transcript::is_usable_transcript(&a.content))
                .map(|a| a.content.clone())
        } else {
            None
        };
        if transcript_flow && transcript_text.is_none() && aux.is_some() {
            debug!(url, "Fetched transcript failed validation, analyzing without it");
        }

        let prompt = match &transcript_text {
            Some(text) => prompt::transcript_prompt(url, text),
            None => {
                let page = if transcript_flow {
                    None
                } else {
                    aux.as_ref().map(|a| a.content.as_str())
                };
                prompt::url_prompt(url, page)
            }
        };

        let aux_date = aux.as_ref().and_then(|a| a.date.as_deref());

        let mut result = match self.request("analyze_url", &prompt).await {
            Ok(raw) => normalize::shape_result(
                &raw,
                &ShapeContext {
                    source_label: url,
                    input_url: Some(url),
                    aux_date,
                },
            ),
            Err(e) => {
                warn!(url, error = %e, "URL analysis exhausted retries");
                return sentinel_result(url, &e);
            }
        };

        if let Some(text) = &transcript_text {
            let advisories = transcript::grounding_advisories(
                &result.topic,
                &result.tags,
                &result.summary_html,
                text,
            );
            for advisory in &advisories {
                warn!(url, advisory = %advisory, "Transcript grounding advisory");
            }
            result.advisories = advisories;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = ServiceConfig::default();
        let client = UnderstandingClient::from_config(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_transient_exhaustion_maps_to_quota_sentinel() {
        let err = EnrichError::Api {
            status: 429,
            message: "quota".to_string(),
        };
        let result = sentinel_result("a.eml", &err);
        assert!(result.is_quota_error());
        assert!(!result.is_analysis_error());
    }

    #[test]
    fn test_persistent_exhaustion_maps_to_failure_sentinel() {
        let err = EnrichError::Api {
            status: 500,
            message: "broken".to_string(),
        };
        let result = sentinel_result("a.eml", &err);
        assert!(result.is_analysis_error());
        assert!(result.summary_html.contains("a.eml"));
        // A well-formed timestamp even on the failure path
        assert_eq!(result.normalized_date.len(), 19);
    }
}
