//! Bug ledger CLI entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod cmd;

#[derive(Parser)]
#[command(
    name = "bugledger",
    version,
    about = "Track bugs, sprints, and the penalties attached to them"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Port for the web server
        #[arg(long)]
        port: Option<u16>,
        /// Path to the SQLite database
        #[arg(long)]
        db: Option<PathBuf>,
        /// Path to a config file (default: bugledger.toml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Open the UI in a browser after startup
        #[arg(long)]
        open: bool,
        /// Development mode: permissive CORS, binds to all interfaces
        #[arg(long)]
        dev: bool,
        /// Write logs to daily-rotated files in this directory instead of stderr
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Create the database and exit
    Init {
        /// Path to the SQLite database
        #[arg(long)]
        db: Option<PathBuf>,
        /// Path to a config file (default: bugledger.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            db,
            config,
            open,
            dev,
            log_dir,
        } => {
            let _guard = init_tracing(log_dir.as_deref())?;
            cmd::cmd_serve(config, port, db, open, dev).await
        }
        Commands::Init { db, config } => {
            let _guard = init_tracing(None)?;
            cmd::cmd_init(config, db)
        }
    }
}

/// Install the tracing subscriber. The returned guard flushes the file
/// writer and must stay alive for the life of the process.
fn init_tracing(
    log_dir: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bugledger=info".into());

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "bugledger.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}
