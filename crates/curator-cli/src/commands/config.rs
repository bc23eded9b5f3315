//! Config command implementation.

use anyhow::Result;
use colored::Colorize;
use curator_config::Config;

pub fn show() -> Result<()> {
    let paths = super::app_paths()?;
    if paths.config_file.exists() {
        print!("{}", std::fs::read_to_string(&paths.config_file)?);
    } else {
        println!("# No config file yet; defaults in effect. Run `curator init`.");
        print!("{}", Config::default_config_string());
    }
    Ok(())
}

pub fn path() -> Result<()> {
    let paths = super::app_paths()?;
    println!("{}", paths.config_file.display());
    Ok(())
}

pub fn edit_default() -> Result<()> {
    let paths = super::app_paths()?;
    let existed = paths.config_file.exists();
    Config::create_default_file(&paths.config_file)?;
    if existed {
        println!(
            "{} {}",
            "Reset config to defaults:".yellow(),
            paths.config_file.display()
        );
    } else {
        println!(
            "{} {}",
            "Created config:".green().bold(),
            paths.config_file.display()
        );
    }
    println!("Open it in your editor to adjust the settings.");
    Ok(())
}
