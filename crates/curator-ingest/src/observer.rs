//! Observer seam between the pipeline and the presentation layer.

use curator_core::StoredRecord;

/// Pipeline state as visible to the caller. `Completed` and the cancelled
/// return to `Idle` end a batch; a new batch starts again from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Extracting,
    Enriching,
    Persisting,
    Completed,
    Error,
}

/// Per-item progress, reported after every item regardless of outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 1-based index of the item just handled.
    pub index: usize,
    pub total: usize,
    pub identity: String,
}

/// Callbacks the pipeline drives. All methods default to no-ops so
/// callers implement only what they render.
pub trait BatchObserver: Send {
    fn on_state(&mut self, _state: BatchState) {}
    fn on_progress(&mut self, _progress: Progress) {}
    /// The full, freshly re-read store contents after each persisted item.
    fn on_records(&mut self, _records: &[StoredRecord]) {}
    /// Aggregate outcome line; empty string clears any transient message.
    fn on_summary(&mut self, _message: &str) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}
