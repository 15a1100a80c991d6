//! `bugledger serve` and `bugledger init` — run the web server, set up the
//! database.

use anyhow::Result;
use std::path::PathBuf;

use bugledger::config::AppConfig;
use bugledger::db::LedgerDb;
use bugledger::server::start_server;

/// Initialize the database and exit.
pub fn cmd_init(config_path: Option<PathBuf>, db_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::with_cli_args(config_path.as_deref(), None, db_path, false)?;
    let db_path = config.db_path();

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let _db = LedgerDb::new(&db_path)?;
    println!("Database initialized at {}", db_path.display());
    Ok(())
}

/// Launch the web server.
pub async fn cmd_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    db_path: Option<PathBuf>,
    open_browser: bool,
    dev: bool,
) -> Result<()> {
    let config = AppConfig::with_cli_args(config_path.as_deref(), port, db_path, dev)?;
    let server_config = config.server_config();

    if open_browser && !server_config.dev_mode {
        let url = format!("http://localhost:{}", server_config.port);
        tokio::spawn(async move {
            // Give the listener a moment to come up
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                eprintln!("Failed to open browser: {}", e);
            }
        });
    }

    start_server(server_config).await
}
