//! Curator CLI - Ingest message files and links into a classified,
//! deduplicated local store.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Curator - classify and archive message files and links
#[derive(Parser)]
#[command(name = "curator")]
#[command(version)]
#[command(about = "Classify and archive message files and links", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize curator (create config and database)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Ingest message files, directories, or URLs
    Ingest {
        /// Files, directories, or URLs to process
        #[arg(required = true)]
        sources: Vec<String>,

        /// Force the transcript flow for every URL, not just video hosts
        #[arg(long)]
        transcript: bool,

        /// Show what would be processed without calling the service
        #[arg(long)]
        dry_run: bool,
    },

    /// List stored records, newest first
    List {
        /// Maximum number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete records by id
    Delete {
        /// Record ids to delete
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Export the record store to a file
    Export {
        /// Output path (defaults to a dated file in the export directory)
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Merge an exported store into this one
    Import {
        /// Path of the exported store file
        file: String,
    },

    /// Show store statistics
    Stats,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
    /// Write the commented default config to the config path for editing
    EditDefault,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::EditDefault => commands::config::edit_default(),
        },
        Commands::Ingest {
            sources,
            transcript,
            dry_run,
        } => commands::ingest::run(sources, transcript, dry_run).await,
        Commands::List { limit } => commands::list::run(limit),
        Commands::Delete { ids } => commands::delete::run(ids),
        Commands::Export { out } => commands::export::run(out),
        Commands::Import { file } => commands::import::run(&file),
        Commands::Stats => commands::stats::run(),
    }
}
