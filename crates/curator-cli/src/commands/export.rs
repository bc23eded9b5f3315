//! Export command implementation.

use anyhow::Result;
use colored::Colorize;

pub fn run(out: Option<String>) -> Result<()> {
    let paths = super::app_paths()?;
    let db = super::open_database()?;

    let target = match out {
        Some(path) => std::path::PathBuf::from(path),
        None => paths.export_dir.join(format!(
            "records-{}.db",
            chrono_date()
        )),
    };

    // The dated side copy into the export dir is best effort; writing the
    // requested target is not.
    let blob = db.export_with_copy(&paths.export_dir)?;
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, &blob)?;

    println!(
        "{} {} ({} bytes)",
        "Exported:".green().bold(),
        target.display(),
        blob.len()
    );
    Ok(())
}

fn chrono_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
