//! Import command implementation.

use anyhow::Result;
use colored::Colorize;

pub fn run(file: &str) -> Result<()> {
    let db = super::open_database()?;
    let blob = std::fs::read(file)?;

    let report = db.import_merge(&blob)?;

    println!(
        "{} {} imported, {} skipped",
        "Merge finished:".green().bold(),
        report.imported,
        report.skipped
    );
    for error in &report.errors {
        println!("  {} {}", "row error:".red(), error);
    }

    Ok(())
}
