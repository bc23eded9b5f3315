//! The sequential, rate-limited ingestion pipeline.
//!
//! One batch at a time, items in strict input order, one enrichment call
//! in flight at most. Every item is persisted the moment its outcome is
//! known, so cancellation or a batch-stopping error never loses completed
//! work.

use crate::error::IngestResult;
use crate::extract;
use crate::observer::{BatchObserver, BatchState, Progress};
use curator_core::{AnalysisResult, NewRecord, SourceItem};
use curator_db::Database;
use curator_enrich::Analyzer;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every surviving item was handled.
    Completed,
    /// The understanding service signalled quota exhaustion; remaining
    /// items were not touched.
    QuotaExhausted,
    /// Cancelled between items; everything handled so far is persisted.
    Cancelled,
    /// Pre-filtering removed every item.
    NothingToDo,
}

/// Aggregate result of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    /// Items whose outcome (success or item-level failure) was recorded.
    pub processed: usize,
    /// Items recorded with the analysis-failure sentinel.
    pub failed: usize,
    /// Items removed by pre-filtering before the loop started.
    pub filtered: usize,
    /// Records the store refused as duplicates at append time.
    pub skipped_duplicates: usize,
}

/// The core orchestrator.
pub struct Pipeline {
    db: Database,
    analyzer: Arc<dyn Analyzer>,
    pacing: Duration,
}

impl Pipeline {
    pub fn new(db: Database, analyzer: Arc<dyn Analyzer>, pacing: Duration) -> Self {
        Self { db, analyzer, pacing }
    }

    /// Process one batch. The token is observed before each item and once
    /// per second during the inter-item pause; an in-flight enrichment
    /// call always runs to completion first.
    pub async fn run_batch(
        &self,
        items: Vec<SourceItem>,
        cancel: CancellationToken,
        observer: &mut dyn BatchObserver,
    ) -> IngestResult<BatchReport> {
        let submitted = items.len();
        let existing = self.db.file_names()?;
        let queue: Vec<SourceItem> = items
            .into_iter()
            .filter(|item| !(item.is_file() && existing.contains(item.identity())))
            .collect();

        let mut report = BatchReport {
            outcome: BatchOutcome::Completed,
            processed: 0,
            failed: 0,
            filtered: submitted - queue.len(),
            skipped_duplicates: 0,
        };

        if queue.is_empty() {
            info!(submitted, "Nothing to ingest: every item is already stored");
            observer.on_summary("Nothing to do: all items are already stored");
            observer.on_state(BatchState::Idle);
            report.outcome = BatchOutcome::NothingToDo;
            return Ok(report);
        }

        let total = queue.len();
        info!(total, filtered = report.filtered, "Starting batch");

        for (index, item) in queue.iter().enumerate() {
            if cancel.is_cancelled() {
                report.outcome = BatchOutcome::Cancelled;
                break;
            }

            // Pace every item after the first, staying responsive to
            // cancellation during the pause.
            if index > 0 && !self.pace(&cancel).await {
                report.outcome = BatchOutcome::Cancelled;
                break;
            }

            let analysis = self.analyze_item(item, observer).await;

            if analysis.is_quota_error() {
                warn!(identity = item.identity(), "Quota exhausted, stopping batch");
                observer.on_state(BatchState::Error);
                observer.on_progress(Progress {
                    index: index + 1,
                    total,
                    identity: item.identity().to_string(),
                });
                report.outcome = BatchOutcome::QuotaExhausted;
                break;
            }

            if analysis.is_analysis_error() {
                report.failed += 1;
            }

            observer.on_state(BatchState::Persisting);
            let record = NewRecord::from_analysis(item.identity(), &analysis);
            let appended = self.db.append(std::slice::from_ref(&record))?;
            report.skipped_duplicates += appended.skipped;

            // Re-read so the caller always sees the latest persisted state.
            let visible = self.db.get_all()?;
            observer.on_records(&visible);

            report.processed += 1;
            observer.on_progress(Progress {
                index: index + 1,
                total,
                identity: item.identity().to_string(),
            });
        }

        match report.outcome {
            BatchOutcome::Completed => {
                observer.on_state(BatchState::Completed);
                if report.failed > 0 {
                    observer.on_summary(&format!(
                        "Batch finished: {} of {} items failed analysis",
                        report.failed, total
                    ));
                } else {
                    observer.on_summary("");
                }
            }
            BatchOutcome::Cancelled => {
                info!(processed = report.processed, total, "Batch cancelled");
                observer.on_summary(&format!(
                    "Cancelled after {} of {} items",
                    report.processed, total
                ));
                observer.on_state(BatchState::Idle);
            }
            BatchOutcome::QuotaExhausted => {
                observer.on_summary(
                    "API quota exhausted; wait a while and submit the remaining items again",
                );
            }
            BatchOutcome::NothingToDo => {}
        }

        Ok(report)
    }

    async fn analyze_item(
        &self,
        item: &SourceItem,
        observer: &mut dyn BatchObserver,
    ) -> AnalysisResult {
        match item {
            SourceItem::File { name, text } => {
                observer.on_state(BatchState::Extracting);
                match extract::extract(name, text) {
                    Ok(record) => {
                        observer.on_state(BatchState::Enriching);
                        self.analyzer.analyze_record(&record).await
                    }
                    Err(e) => {
                        warn!(source = %name, error = %e, "Extraction failed");
                        failure_result(name, &e.to_string())
                    }
                }
            }
            SourceItem::Url(url) => {
                observer.on_state(BatchState::Enriching);
                self.analyzer.analyze_url(url, false).await
            }
            SourceItem::VideoUrl(url) => {
                observer.on_state(BatchState::Enriching);
                self.analyzer.analyze_url(url, true).await
            }
        }
    }

    /// Sleep the configured pacing in one-second steps, checking the
    /// token between steps. Returns false when cancelled.
    async fn pace(&self, cancel: &CancellationToken) -> bool {
        let mut remaining = self.pacing;
        while remaining > Duration::ZERO {
            if cancel.is_cancelled() {
                return false;
            }
            let step = remaining.min(Duration::from_secs(1));
            tokio::time::sleep(step).await;
            remaining -= step;
        }
        !cancel.is_cancelled()
    }
}

/// Item-level failure as an analysis result, mirroring what the enrich
/// client returns for exhausted non-transient retries.
fn failure_result(source_name: &str, message: &str) -> AnalysisResult {
    let record = NewRecord::failure(source_name, chrono_now(), message);
    AnalysisResult {
        topic: record.topic,
        tags: record.tags,
        summary_html: record.summary_html,
        urls: record.urls,
        normalized_date: record.sent_at,
        advisories: Vec::new(),
    }
}

fn chrono_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use async_trait::async_trait;
    use curator_core::{ExtractedRecord, TOPIC_ANALYSIS_ERROR, TOPIC_QUOTA_ERROR};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn ok_result(topic: &str, urls: &[&str]) -> AnalysisResult {
        AnalysisResult {
            topic: topic.to_string(),
            tags: vec!["tag".to_string()],
            summary_html: "<p>summary</p>".to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
            normalized_date: "2024-01-01 00:00:00".to_string(),
            advisories: Vec::new(),
        }
    }

    fn sentinel(topic: &str) -> AnalysisResult {
        AnalysisResult {
            topic: topic.to_string(),
            tags: Vec::new(),
            summary_html: "<p>sentinel</p>".to_string(),
            urls: Vec::new(),
            normalized_date: "2024-01-01 00:00:00".to_string(),
            advisories: Vec::new(),
        }
    }

    /// Analyzer that replays canned results keyed by item identity and
    /// records the order it was called in.
    struct ScriptedAnalyzer {
        responses: HashMap<String, AnalysisResult>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedAnalyzer {
        fn new(responses: Vec<(&str, AnalysisResult)>) -> Arc<Self> {
            Arc::new(Self {
                responses: responses
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn respond(&self, identity: &str) -> AnalysisResult {
            self.calls.lock().unwrap().push(identity.to_string());
            self.responses
                .get(identity)
                .cloned()
                .unwrap_or_else(|| ok_result("Tech", &[]))
        }
    }

    #[async_trait]
    impl Analyzer for ScriptedAnalyzer {
        async fn analyze_record(&self, record: &ExtractedRecord) -> AnalysisResult {
            self.respond(&record.source_name)
        }

        async fn analyze_url(&self, url: &str, _transcript_flow: bool) -> AnalysisResult {
            self.respond(url)
        }
    }

    fn file_item(name: &str) -> SourceItem {
        SourceItem::File {
            name: name.to_string(),
            text: format!("Subject: {name}\n\nbody of {name}"),
        }
    }

    fn pipeline(analyzer: Arc<ScriptedAnalyzer>) -> (Pipeline, Database) {
        let db = Database::open_in_memory().unwrap();
        (
            Pipeline::new(db.clone(), analyzer, Duration::ZERO),
            db,
        )
    }

    #[tokio::test]
    async fn test_batch_processes_in_input_order() {
        let analyzer = ScriptedAnalyzer::new(vec![
            ("a.eml", ok_result("One", &["https://example.com/1"])),
            ("b.eml", ok_result("Two", &["https://example.com/2"])),
            ("c.eml", ok_result("Three", &["https://example.com/3"])),
        ]);
        let (pipeline, db) = pipeline(analyzer.clone());

        let report = pipeline
            .run_batch(
                vec![file_item("a.eml"), file_item("b.eml"), file_item("c.eml")],
                CancellationToken::new(),
                &mut NoopObserver,
            )
            .await
            .unwrap();

        assert_eq!(report.outcome, BatchOutcome::Completed);
        assert_eq!(report.processed, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(analyzer.calls(), vec!["a.eml", "b.eml", "c.eml"]);

        let all = db.get_all().unwrap();
        assert_eq!(all.len(), 3);
        // Newest first: insertion followed input order
        assert_eq!(all[0].source_name, "c.eml");
        assert_eq!(all[2].source_name, "a.eml");
    }

    #[tokio::test]
    async fn test_quota_sentinel_halts_batch() {
        let analyzer = ScriptedAnalyzer::new(vec![
            ("a.eml", ok_result("One", &[])),
            ("b.eml", sentinel(TOPIC_QUOTA_ERROR)),
            ("c.eml", ok_result("Three", &[])),
        ]);
        let (pipeline, db) = pipeline(analyzer.clone());

        struct StateRecorder(Vec<BatchState>);
        impl BatchObserver for StateRecorder {
            fn on_state(&mut self, state: BatchState) {
                self.0.push(state);
            }
        }
        let mut recorder = StateRecorder(Vec::new());

        let report = pipeline
            .run_batch(
                vec![file_item("a.eml"), file_item("b.eml"), file_item("c.eml")],
                CancellationToken::new(),
                &mut recorder,
            )
            .await
            .unwrap();

        assert_eq!(report.outcome, BatchOutcome::QuotaExhausted);
        assert_eq!(report.processed, 1);
        // c.eml was never analyzed
        assert_eq!(analyzer.calls(), vec!["a.eml", "b.eml"]);
        // The quota item itself is not persisted
        assert_eq!(db.count().unwrap(), 1);
        assert!(recorder.0.contains(&BatchState::Error));
    }

    #[tokio::test]
    async fn test_failure_sentinel_skips_item_only() {
        let analyzer = ScriptedAnalyzer::new(vec![
            ("a.eml", ok_result("One", &[])),
            ("b.eml", sentinel(TOPIC_ANALYSIS_ERROR)),
            ("c.eml", ok_result("Three", &[])),
        ]);
        let (pipeline, db) = pipeline(analyzer.clone());

        let report = pipeline
            .run_batch(
                vec![file_item("a.eml"), file_item("b.eml"), file_item("c.eml")],
                CancellationToken::new(),
                &mut NoopObserver,
            )
            .await
            .unwrap();

        assert_eq!(report.outcome, BatchOutcome::Completed);
        assert_eq!(report.processed, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(analyzer.calls().len(), 3);

        // The failed item is persisted as an error record
        let all = db.get_all().unwrap();
        assert_eq!(all.len(), 3);
        let failed: Vec<_> = all.iter().filter(|r| r.topic == TOPIC_ANALYSIS_ERROR).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].source_name, "b.eml");
    }

    #[tokio::test]
    async fn test_cancellation_keeps_completed_work() {
        let analyzer = ScriptedAnalyzer::new(vec![]);
        let (pipeline, db) = pipeline(analyzer.clone());

        /// Cancels the batch as soon as the first item reports progress.
        struct CancelAfterFirst(CancellationToken);
        impl BatchObserver for CancelAfterFirst {
            fn on_progress(&mut self, progress: Progress) {
                if progress.index == 1 {
                    self.0.cancel();
                }
            }
        }

        let token = CancellationToken::new();
        let mut observer = CancelAfterFirst(token.clone());

        let report = pipeline
            .run_batch(
                vec![file_item("a.eml"), file_item("b.eml"), file_item("c.eml")],
                token,
                &mut observer,
            )
            .await
            .unwrap();

        assert_eq!(report.outcome, BatchOutcome::Cancelled);
        assert_eq!(report.processed, 1);
        assert_eq!(analyzer.calls(), vec!["a.eml"]);
        assert_eq!(db.count().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_pacing_pause() {
        let analyzer = ScriptedAnalyzer::new(vec![]);
        let db = Database::open_in_memory().unwrap();
        let pipeline = Pipeline::new(db.clone(), analyzer.clone(), Duration::from_secs(15));

        // Cancel while the pipeline is pausing before the second item
        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        let report = pipeline
            .run_batch(
                vec![file_item("a.eml"), file_item("b.eml")],
                token,
                &mut NoopObserver,
            )
            .await
            .unwrap();

        assert_eq!(report.outcome, BatchOutcome::Cancelled);
        assert_eq!(report.processed, 1);
        // The second item was never analyzed, the first stayed persisted
        assert_eq!(analyzer.calls(), vec!["a.eml"]);
        assert_eq!(db.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_prefilter_short_circuits() {
        let analyzer = ScriptedAnalyzer::new(vec![]);
        let (pipeline, db) = pipeline(analyzer.clone());

        // Seed the store with a.eml so the batch has nothing left
        pipeline
            .run_batch(
                vec![file_item("a.eml")],
                CancellationToken::new(),
                &mut NoopObserver,
            )
            .await
            .unwrap();
        assert_eq!(db.count().unwrap(), 1);

        let report = pipeline
            .run_batch(
                vec![file_item("a.eml")],
                CancellationToken::new(),
                &mut NoopObserver,
            )
            .await
            .unwrap();

        assert_eq!(report.outcome, BatchOutcome::NothingToDo);
        assert_eq!(report.filtered, 1);
        assert_eq!(report.processed, 0);
        assert_eq!(analyzer.calls(), vec!["a.eml"]);
    }

    #[tokio::test]
    async fn test_unreadable_file_becomes_error_record() {
        let analyzer = ScriptedAnalyzer::new(vec![]);
        let (pipeline, db) = pipeline(analyzer.clone());

        let report = pipeline
            .run_batch(
                vec![
                    SourceItem::File {
                        name: "empty.eml".to_string(),
                        text: "   ".to_string(),
                    },
                    file_item("b.eml"),
                ],
                CancellationToken::new(),
                &mut NoopObserver,
            )
            .await
            .unwrap();

        assert_eq!(report.outcome, BatchOutcome::Completed);
        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 2);
        // The analyzer never saw the unreadable item
        assert_eq!(analyzer.calls(), vec!["b.eml"]);

        let all = db.get_all().unwrap();
        let error_record = all.iter().find(|r| r.source_name == "empty.eml").unwrap();
        assert_eq!(error_record.topic, TOPIC_ANALYSIS_ERROR);
    }

    #[tokio::test]
    async fn test_duplicate_url_items_skipped_at_append() {
        let analyzer = ScriptedAnalyzer::new(vec![
            (
                "https://example.com/post",
                ok_result("One", &["https://example.com/post"]),
            ),
            (
                "https://example.com/post?utm_source=mail",
                ok_result("One again", &["https://example.com/post?utm_source=mail"]),
            ),
        ]);
        let (pipeline, db) = pipeline(analyzer.clone());

        let report = pipeline
            .run_batch(
                vec![
                    SourceItem::Url("https://example.com/post".to_string()),
                    SourceItem::Url("https://example.com/post?utm_source=mail".to_string()),
                ],
                CancellationToken::new(),
                &mut NoopObserver,
            )
            .await
            .unwrap();

        assert_eq!(report.outcome, BatchOutcome::Completed);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(db.count().unwrap(), 1);
    }
}
