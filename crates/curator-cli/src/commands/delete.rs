//! Delete command implementation.

use anyhow::Result;
use colored::Colorize;

pub fn run(ids: Vec<String>) -> Result<()> {
    let db = super::open_database()?;
    let deleted = db.delete_by_ids(&ids)?;
    println!("{} {} record(s)", "Deleted:".green().bold(), deleted);
    Ok(())
}
