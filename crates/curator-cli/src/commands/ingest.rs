//! Ingest command implementation.

use anyhow::Result;
use colored::Colorize;
use curator_config::Config;
use curator_core::{SourceItem, StoredRecord};
use curator_enrich::EnrichClient;
use curator_ingest::{BatchObserver, BatchOutcome, BatchState, Pipeline, Progress};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Extensions accepted when walking a directory.
const FILE_EXTENSIONS: [&str; 2] = ["eml", "txt"];

pub async fn run(sources: Vec<String>, force_transcript: bool, dry_run: bool) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let db = super::open_database()?;

    let items = collect_items(&sources, force_transcript)?;
    if items.is_empty() {
        println!("{}", "No supported sources found.".yellow());
        return Ok(());
    }

    if dry_run {
        for item in &items {
            let kind = match item {
                SourceItem::File { .. } => "file",
                SourceItem::Url(_) => "url",
                SourceItem::VideoUrl(_) => "video",
            };
            println!("{} [{kind}] {}", "Would process:".cyan(), item.identity());
        }
        return Ok(());
    }

    let analyzer = Arc::new(EnrichClient::from_config(&config)?);
    let pipeline = Pipeline::new(
        db,
        analyzer,
        Duration::from_secs(config.pipeline.pacing_seconds),
    );

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{}", "Cancelling after the current item...".yellow());
            ctrl_c_token.cancel();
        }
    });

    let total = items.len();
    let mut observer = ProgressObserver::new(total as u64);
    let report = pipeline.run_batch(items, token, &mut observer).await?;
    observer.finish();

    match report.outcome {
        BatchOutcome::Completed => {
            if report.failed > 0 {
                println!(
                    "{} {} processed, {} failed analysis",
                    "Done with errors:".yellow().bold(),
                    report.processed,
                    report.failed
                );
            } else {
                println!("{} {} items processed", "Done:".green().bold(), report.processed);
            }
        }
        BatchOutcome::QuotaExhausted => {
            println!(
                "{} API quota exhausted after {} items; wait a while and run again",
                "Stopped:".red().bold(),
                report.processed
            );
        }
        BatchOutcome::Cancelled => {
            println!(
                "{} {} of {} items persisted",
                "Cancelled:".yellow().bold(),
                report.processed,
                total
            );
        }
        BatchOutcome::NothingToDo => {
            println!("{}", "Nothing to do: all items are already stored.".yellow());
        }
    }

    if report.filtered > 0 {
        println!("  {} already-stored items filtered before the run", report.filtered);
    }
    if report.skipped_duplicates > 0 {
        println!("  {} duplicates skipped at save time", report.skipped_duplicates);
    }

    Ok(())
}

/// Expand CLI arguments into pipeline items: URLs by scheme, files read
/// into memory, directories walked for supported extensions.
fn collect_items(sources: &[String], force_transcript: bool) -> Result<Vec<SourceItem>> {
    let mut items = Vec::new();

    for source in sources {
        if source.starts_with("http://") || source.starts_with("https://") {
            if force_transcript || is_video_host(source) {
                items.push(SourceItem::VideoUrl(source.clone()));
            } else {
                items.push(SourceItem::Url(source.clone()));
            }
            continue;
        }

        let path = Path::new(source);
        if path.is_file() {
            items.push(read_file_item(path)?);
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
            {
                let ext = entry.path().extension().and_then(|e| e.to_str());
                if ext.map(|e| FILE_EXTENSIONS.contains(&e)).unwrap_or(false) {
                    items.push(read_file_item(entry.path())?);
                }
            }
        } else {
            anyhow::bail!("Source does not exist: {source}");
        }
    }

    Ok(items)
}

fn read_file_item(path: &Path) -> Result<SourceItem> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();
    let text = std::fs::read_to_string(path)?;
    Ok(SourceItem::File { name, text })
}

fn is_video_host(raw: &str) -> bool {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .map(|host| {
            let host = host.trim_start_matches("www.");
            host == "youtube.com" || host == "youtu.be"
        })
        .unwrap_or(false)
}

/// Renders pipeline callbacks as an indicatif bar.
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BatchObserver for ProgressObserver {
    fn on_state(&mut self, state: BatchState) {
        let label = match state {
            BatchState::Extracting => "extracting",
            BatchState::Enriching => "analyzing",
            BatchState::Persisting => "saving",
            BatchState::Completed | BatchState::Idle | BatchState::Error => "",
        };
        if !label.is_empty() {
            self.bar.set_message(label.to_string());
        }
    }

    fn on_progress(&mut self, progress: Progress) {
        self.bar.set_position(progress.index as u64);
        self.bar.set_message(progress.identity);
    }

    fn on_records(&mut self, _records: &[StoredRecord]) {}

    fn on_summary(&mut self, message: &str) {
        if !message.is_empty() {
            self.bar.println(message.to_string());
        }
    }
}
