//! Curator Ingest - Content extraction and the batch ingestion pipeline.
//!
//! This crate provides:
//! - The message-file extractor (headers, body, quoted-printable, redaction)
//! - The sequential, rate-limited pipeline orchestrating extraction,
//!   enrichment and per-item persistence
//! - The observer seam the presentation layer consumes progress through

mod error;
pub mod extract;
mod observer;
mod pipeline;

pub use error::{IngestError, IngestResult};
pub use observer::{BatchObserver, BatchState, NoopObserver, Progress};
pub use pipeline::{BatchOutcome, BatchReport, Pipeline};
