//! Stats command implementation.

use anyhow::Result;
use colored::Colorize;
use curator_core::RecordStatus;
use std::collections::BTreeMap;

pub fn run() -> Result<()> {
    let db = super::open_database()?;
    let records = db.get_all()?;

    let errors = records
        .iter()
        .filter(|r| r.status() == RecordStatus::Error)
        .count();

    println!("{} {}", "Records:".bold(), records.len());
    println!("{} {}", "Failed analyses:".bold(), errors);

    let mut by_topic: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &records {
        *by_topic.entry(record.topic.as_str()).or_default() += 1;
    }

    if !by_topic.is_empty() {
        println!("{}", "By topic:".bold());
        let mut topics: Vec<_> = by_topic.into_iter().collect();
        topics.sort_by(|a, b| b.1.cmp(&a.1));
        for (topic, count) in topics {
            println!("  {:>4}  {}", count, topic);
        }
    }

    Ok(())
}
