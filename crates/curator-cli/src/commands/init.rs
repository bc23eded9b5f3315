//! Init command implementation.

use anyhow::Result;
use colored::Colorize;
use curator_config::Config;
use curator_db::Database;

pub fn run() -> Result<()> {
    let paths = super::app_paths()?;
    paths.ensure_dirs()?;

    if paths.config_file.exists() {
        println!("{} {}", "Config exists:".yellow(), paths.config_file.display());
    } else {
        Config::create_default_file(&paths.config_file)?;
        println!("{} {}", "Created config:".green().bold(), paths.config_file.display());
    }

    Database::open(&paths.database_file)?;
    println!(
        "{} {}",
        "Record store ready:".green().bold(),
        paths.database_file.display()
    );

    Ok(())
}
