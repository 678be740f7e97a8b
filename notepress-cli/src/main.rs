//! # notepress CLI
//!
//! Command-line interface for exporting published notes into a
//! static-site content directory.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notepress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults are used when it does not exist)
    #[arg(long, default_value = "notepress.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Defaults to `export`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export published notes into the site content directory
    Export(ExportArgs),

    /// Show what an export would write without touching the output
    Check {
        #[command(flatten)]
        paths: PathArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Fail when any document had to be skipped
        #[arg(long)]
        strict: bool,
    },

    /// Write a starter notepress.yml
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// IndexNow helpers for announcing changed pages
    Indexnow {
        #[command(subcommand)]
        command: IndexNowCommands,
    },
}

#[derive(clap::Args, Default)]
pub struct PathArgs {
    /// Source notes directory (overrides paths.source)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Output directory (overrides paths.output)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Default)]
pub struct ExportArgs {
    #[command(flatten)]
    paths: PathArgs,

    /// Keep files from previous runs in the output directory
    #[arg(long)]
    no_clean: bool,
}

#[derive(Subcommand)]
pub enum IndexNowCommands {
    /// Print URLs affected by a diff of the content repository
    Urls {
        /// Path to the content repository working tree
        #[arg(long, default_value = "content")]
        content_dir: PathBuf,

        /// Notes directory inside the content repository
        #[arg(long, default_value = "notes")]
        notes_dir: String,

        /// Old content commit SHA
        #[arg(long, default_value = "")]
        old_sha: String,

        /// New content commit SHA
        #[arg(long, default_value = "")]
        new_sha: String,

        /// Host to emit URLs for (must match the sitemap host)
        #[arg(long)]
        host: String,

        /// Base URL (default: base_url from the config, else https://<host>)
        #[arg(long)]
        base_url: Option<String>,

        /// Also emit affected /tags/ URLs
        #[arg(long)]
        include_taxonomies: bool,
    },

    /// Submit sitemap URL changes to IndexNow
    Submit {
        /// Sitemap URL or local path
        #[arg(long)]
        sitemap: String,

        /// Host name to submit
        #[arg(long)]
        host: String,

        /// IndexNow key
        #[arg(long, env = "INDEXNOW_KEY")]
        key: String,

        /// Key file URL (default: https://<host>/<key>.txt)
        #[arg(long)]
        key_location: Option<String>,

        /// IndexNow API endpoint (overrides indexnow.endpoint)
        #[arg(long)]
        endpoint: Option<String>,

        /// Previous snapshot JSON path
        #[arg(long)]
        snapshot_in: Option<PathBuf>,

        /// Write the current snapshot JSON to this path
        #[arg(long)]
        snapshot_out: Option<PathBuf>,

        /// Also submit URLs removed from the sitemap
        #[arg(long)]
        include_deletions: bool,

        /// Max URLs per request (overrides indexnow.batch_size)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Compute batches but do not submit
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command.unwrap_or_else(|| Commands::Export(ExportArgs::default())) {
        Commands::Export(args) => commands::export_site(&cli.config, &args),
        Commands::Check {
            paths,
            json,
            strict,
        } => commands::check_site(&cli.config, &paths, json, strict),
        Commands::Init { path } => commands::init_project(path.as_deref()),
        Commands::Indexnow { command } => match command {
            IndexNowCommands::Urls {
                content_dir,
                notes_dir,
                old_sha,
                new_sha,
                host,
                base_url,
                include_taxonomies,
            } => {
                let opts = commands::UrlsOptions {
                    content_dir,
                    notes_dir,
                    old_sha,
                    new_sha,
                    host,
                    base_url,
                    include_taxonomies,
                };
                commands::indexnow_urls(&cli.config, opts)
            }
            IndexNowCommands::Submit {
                sitemap,
                host,
                key,
                key_location,
                endpoint,
                snapshot_in,
                snapshot_out,
                include_deletions,
                batch_size,
                dry_run,
            } => {
                let opts = commands::SubmitOptions {
                    sitemap,
                    host,
                    key,
                    key_location,
                    endpoint,
                    snapshot_in,
                    snapshot_out,
                    include_deletions,
                    batch_size,
                    dry_run,
                };
                commands::indexnow_submit(&cli.config, opts).await
            }
        },
    }
}
