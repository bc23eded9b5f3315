//! List command implementation.

use anyhow::Result;
use colored::Colorize;
use curator_core::RecordStatus;

pub fn run(limit: usize) -> Result<()> {
    let db = super::open_database()?;
    let records = db.get_all()?;

    if records.is_empty() {
        println!("{}", "No records stored yet.".yellow());
        return Ok(());
    }

    for record in records.iter().take(limit) {
        let status = match record.status() {
            RecordStatus::Completed => "ok ".green(),
            RecordStatus::Error => "err".red(),
        };
        println!(
            "{:>5} {} {} {} {}",
            record.id.cyan(),
            status,
            record.sent_at.dimmed(),
            record.topic.bold(),
            record.source_name
        );
        if !record.tags.is_empty() {
            println!("      tags: {}", record.tags.join(", ").dimmed());
        }
    }

    if records.len() > limit {
        println!("... and {} more (use --limit)", records.len() - limit);
    }

    Ok(())
}
