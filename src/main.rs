//! # Docspell migration CLI (`dsmig`)
//!
//! ## Usage
//!
//! ```bash
//! dsmig [--config ./config/migrate.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dsmig migrate` | Upload every pending document to Paperless |
//! | `dsmig count` | Count pending and already imported descriptors |
//! | `dsmig undo` | Rename every `metadata.json.done` back to `metadata.json` |
//!
//! Settings are read from environment variables (a `.env` file in the
//! working directory is loaded first) and optionally from a TOML file;
//! environment variables win.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docspell_migrate::config;
use docspell_migrate::count;
use docspell_migrate::migrate::{self, MigrateOptions};
use docspell_migrate::paperless::PaperlessClient;
use docspell_migrate::progress::ProgressMode;
use docspell_migrate::undo;

/// Migrate a Docspell export into Paperless-ngx.
#[derive(Parser)]
#[command(
    name = "dsmig",
    about = "Migrate a Docspell export into Paperless-ngx",
    version,
    long_about = "Walks a Docspell export for metadata.json descriptors, uploads each \
    document's attachments with its correspondent, tags and document type to the \
    Paperless-ngx REST API, and renames finished descriptors to metadata.json.done \
    so interrupted runs can resume."
)]
struct Cli {
    /// Optional TOML configuration file. Environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress output on stderr.
    #[arg(long, global = true, value_enum, default_value = "human")]
    progress: ProgressMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload every pending document to Paperless.
    ///
    /// Documents are processed one at a time. The first error stops the
    /// run; documents already uploaded stay marked done.
    Migrate {
        /// Maximum number of pending documents to process.
        #[arg(long)]
        limit: Option<usize>,

        /// Check descriptors and attachment files without uploading. Needs
        /// only the input folder.
        #[arg(long)]
        dry_run: bool,
    },

    /// Count pending and already imported descriptors.
    Count,

    /// Mark every imported descriptor as pending again.
    Undo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Count => {
            let input = config::load_input_folder(cli.config.as_deref())?;
            count::run_count(&input)?;
        }
        Commands::Undo => {
            let input = config::load_input_folder(cli.config.as_deref())?;
            undo::run_undo(&input)?;
        }
        Commands::Migrate {
            limit,
            dry_run: true,
        } => {
            let input = config::load_input_folder(cli.config.as_deref())?;
            let reporter = cli.progress.reporter();
            let summary = migrate::run_dry_run(&input, limit, reporter.as_ref())?;

            println!("migrate (dry-run)");
            println!("  pending documents: {}", summary.total);
            println!("  ready to upload: {}", summary.checked);
            println!("  without attachments: {}", summary.skipped);
        }
        Commands::Migrate {
            limit,
            dry_run: false,
        } => {
            let cfg = config::load_config(cli.config.as_deref())?;
            let client = PaperlessClient::new(&cfg.paperless)?;
            let reporter = cli.progress.reporter();
            let options = MigrateOptions {
                limit,
                dry_run: false,
            };

            let summary =
                migrate::run_migration(&client, &cfg, &options, reporter.as_ref()).await?;

            println!("migrate");
            println!("  pending documents: {}", summary.total);
            println!("  migrated documents: {}", summary.migrated);
            println!("  attachments uploaded: {}", summary.attachments_uploaded);
            println!("  skipped (no attachments): {}", summary.skipped);
            println!("ok");
        }
    }

    Ok(())
}
