//! Layered configuration.
//!
//! Settings are read from `bugledger.toml`, then `BUGLEDGER_*` environment
//! variables, then CLI flags. Later layers win.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! port = 3000
//! dev = false
//!
//! [storage]
//! db_path = "data/bugledger.db"
//!
//! [auth]
//! bootstrap_admin_email = "admin@bugledger.local"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::server::ServerConfig;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "bugledger.toml";

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Development mode (permissive CORS, binds to all interfaces)
    #[serde(default)]
    pub dev: bool,
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            dev: false,
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/bugledger.db")
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Auth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSection {
    /// Email promoted to super admin when its developer row is first created
    #[serde(default = "default_admin_email")]
    pub bootstrap_admin_email: String,
}

fn default_admin_email() -> String {
    "admin@bugledger.local".to_string()
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            bootstrap_admin_email: default_admin_email(),
        }
    }
}

/// The complete bugledger.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerToml {
    /// Server settings
    #[serde(default)]
    pub server: ServerSection,
    /// Storage settings
    #[serde(default)]
    pub storage: StorageSection,
    /// Auth settings
    #[serde(default)]
    pub auth: AuthSection,
}

impl LedgerToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse bugledger.toml")
    }

    /// Load configuration from `path`, or defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize bugledger.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Get the port (env can override file).
    pub fn port(&self) -> u16 {
        std::env::var("BUGLEDGER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.server.port)
    }

    /// Get dev mode (env can override file).
    pub fn dev(&self) -> bool {
        if let Ok(v) = std::env::var("BUGLEDGER_DEV") {
            return v != "false" && v != "0";
        }
        self.server.dev
    }

    /// Get the database path (env can override file).
    pub fn db_path(&self) -> PathBuf {
        std::env::var("BUGLEDGER_DB")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.storage.db_path.clone())
    }

    /// Get the bootstrap admin email (env can override file).
    pub fn bootstrap_admin_email(&self) -> String {
        std::env::var("BUGLEDGER_ADMIN_EMAIL")
            .ok()
            .unwrap_or_else(|| self.auth.bootstrap_admin_email.clone())
    }
}

/// Runtime configuration that merges the file, environment, and CLI layers.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Parsed bugledger.toml configuration
    pub toml: LedgerToml,
    /// CLI override: port
    pub cli_port: Option<u16>,
    /// CLI override: database path
    pub cli_db_path: Option<PathBuf>,
    /// CLI override: development mode
    pub cli_dev: bool,
}

impl AppConfig {
    /// Load configuration. An explicit `config_path` must exist; the default
    /// location is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let toml = match config_path {
            Some(path) => LedgerToml::load(path)?,
            None => LedgerToml::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
        };
        Ok(Self {
            toml,
            cli_port: None,
            cli_db_path: None,
            cli_dev: false,
        })
    }

    /// Load configuration with CLI overrides applied on top.
    pub fn with_cli_args(
        config_path: Option<&Path>,
        port: Option<u16>,
        db_path: Option<PathBuf>,
        dev: bool,
    ) -> Result<Self> {
        let mut config = Self::load(config_path)?;
        config.cli_port = port;
        config.cli_db_path = db_path;
        config.cli_dev = dev;
        Ok(config)
    }

    /// Get the port (CLI → env → file → default).
    pub fn port(&self) -> u16 {
        self.cli_port.unwrap_or_else(|| self.toml.port())
    }

    /// Get the database path (CLI → env → file → default).
    pub fn db_path(&self) -> PathBuf {
        self.cli_db_path
            .clone()
            .unwrap_or_else(|| self.toml.db_path())
    }

    /// Get dev mode. The CLI flag can only enable it.
    pub fn dev(&self) -> bool {
        self.cli_dev || self.toml.dev()
    }

    /// Get the bootstrap admin email (env → file → default).
    pub fn bootstrap_admin_email(&self) -> String {
        self.toml.bootstrap_admin_email()
    }

    /// Assemble the server configuration from the effective settings.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            port: self.port(),
            db_path: self.db_path(),
            bootstrap_admin_email: self.bootstrap_admin_email(),
            dev_mode: self.dev(),
        }
    }
}
