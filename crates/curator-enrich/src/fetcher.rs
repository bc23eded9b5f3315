//! Best-effort auxiliary content fetcher.
//!
//! Anything that goes wrong here (transport errors, error envelopes,
//! non-2xx statuses) means "no auxiliary content available" and is never
//! fatal to the pipeline.

use crate::error::{EnrichError, EnrichResult};
use crate::types::{FetchErrorResponse, FetchRequest, FetchResponse};
use curator_config::FetcherConfig;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Auxiliary content for a URL, when the fetcher could produce any.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub content: String,
    pub author: Option<String>,
    pub date: Option<String>,
}

/// Client for the optional scrape/transcript collaborator.
#[derive(Clone)]
pub struct FetchClient {
    client: Client,
    base_url: String,
}

impl FetchClient {
    pub fn from_config(config: &FetcherConfig) -> EnrichResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(EnrichError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a page scrape for any URL.
    pub async fn scrape_url(&self, url: &str) -> Option<FetchedContent> {
        self.fetch("/api/scrape-url", url).await
    }

    /// Fetch a transcript for a video URL.
    pub async fn youtube_transcript(&self, url: &str) -> Option<FetchedContent> {
        self.fetch("/api/youtube-transcript", url).await
    }

    async fn fetch(&self, path: &str, url: &str) -> Option<FetchedContent> {
        let endpoint = format!("{}{}", self.base_url, path);
        let request = FetchRequest { url: url.to_string() };

        let response = match self.client.post(&endpoint).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, endpoint, error = %e, "Auxiliary fetch failed, continuing without it");
                return None;
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response
                .json::<FetchErrorResponse>()
                .await
                .map(|e| e.message.unwrap_or(e.error))
                .unwrap_or_default();
            warn!(url, status, detail, "Auxiliary fetch returned an error, continuing without it");
            return None;
        }

        match response.json::<FetchResponse>().await {
            Ok(body) if !body.content.trim().is_empty() => {
                debug!(url, chars = body.content.len(), "Auxiliary content fetched");
                Some(FetchedContent {
                    content: body.content,
                    author: body.author,
                    date: body.date,
                })
            }
            Ok(_) => {
                debug!(url, "Auxiliary fetch returned empty content");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "Could not decode auxiliary fetch response");
                None
            }
        }
    }
}
