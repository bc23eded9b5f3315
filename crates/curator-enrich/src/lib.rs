//! Curator Enrich - Client for the external content-understanding service.
//!
//! This crate provides:
//! - The low-level HTTP client for the understanding service
//! - A best-effort auxiliary content fetcher (page scrapes, transcripts)
//! - Capped exponential-backoff retry shared by both analysis paths
//! - Response shaping into the invariants of [`curator_core::AnalysisResult`]
//! - Transcript validation and grounding advisories for the video flow

mod client;
mod error;
mod fetcher;
mod normalize;
mod prompt;
mod retry;
mod transcript;
mod types;

pub use client::{Analyzer, EnrichClient, UnderstandingClient};
pub use error::{EnrichError, EnrichResult};
pub use fetcher::{FetchClient, FetchedContent};
pub use retry::RetryPolicy;
