//! Configuration management
//!
//! Configuration is loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults, so the
//! application runs without any config file at all.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::Destination;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// View template configuration
    #[serde(default)]
    pub views: ViewConfig,
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Destination catalog
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for paths no route claims
    #[serde(default = "default_public_path")]
    pub public_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_path: default_public_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_path() -> PathBuf {
    PathBuf::from("public")
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/wanderlist.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// View template configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Directory holding `*.html` templates. When it does not exist the
    /// templates compiled into the binary are used.
    #[serde(default = "default_views_path")]
    pub path: PathBuf,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            path: default_views_path(),
        }
    }
}

fn default_views_path() -> PathBuf {
    PathBuf::from("views")
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session ID
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in days
    #[serde(default = "default_expiration_days")]
    pub expiration_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            expiration_days: default_expiration_days(),
        }
    }
}

impl SessionConfig {
    /// Cookie max-age in seconds
    pub fn max_age_seconds(&self) -> i64 {
        self.expiration_days * 24 * 60 * 60
    }
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_expiration_days() -> i64 {
    7
}

/// Upper bound on `session.expiration_days` (ten years)
pub const MAX_SESSION_EXPIRATION_DAYS: i64 = 3650;

/// Destination catalog configuration
///
/// Order matters: search results are returned in the order declared here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_destinations")]
    pub destinations: Vec<Destination>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            destinations: default_destinations(),
        }
    }
}

fn default_destinations() -> Vec<Destination> {
    vec![
        Destination::new("Inca Trail to Machu Picchu", "/inca"),
        Destination::new("Annapurna Circuit", "/annapurna"),
        Destination::new("Bali Island", "/bali"),
        Destination::new("Santorini Island", "/santorini"),
        Destination::new("Paris", "/paris"),
        Destination::new("Rome", "/rome"),
    ]
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - WANDERLIST_SERVER_HOST
    /// - WANDERLIST_SERVER_PORT
    /// - WANDERLIST_SERVER_PUBLIC_PATH
    /// - WANDERLIST_DATABASE_DRIVER
    /// - WANDERLIST_DATABASE_URL
    /// - WANDERLIST_VIEWS_PATH
    /// - WANDERLIST_SESSION_COOKIE_NAME
    /// - WANDERLIST_SESSION_EXPIRATION_DAYS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "session.cookie_name cannot be empty".to_string(),
            ));
        }

        let days = self.session.expiration_days;
        if !(1..=MAX_SESSION_EXPIRATION_DAYS).contains(&days) {
            return Err(ConfigError::ValidationError(format!(
                "session.expiration_days must be between 1 and {}: {}",
                MAX_SESSION_EXPIRATION_DAYS, days
            )));
        }

        for destination in &self.catalog.destinations {
            if destination.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "catalog destination names cannot be empty".to_string(),
                ));
            }
            if !destination.link.starts_with('/') {
                return Err(ConfigError::ValidationError(format!(
                    "catalog link for '{}' must start with '/': {}",
                    destination.name, destination.link
                )));
            }
        }

        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("WANDERLIST_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("WANDERLIST_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(public_path) = std::env::var("WANDERLIST_SERVER_PUBLIC_PATH") {
            self.server.public_path = PathBuf::from(public_path);
        }

        // Database configuration
        if let Ok(driver) = std::env::var("WANDERLIST_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("WANDERLIST_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(path) = std::env::var("WANDERLIST_VIEWS_PATH") {
            self.views.path = PathBuf::from(path);
        }

        // Session configuration
        if let Ok(name) = std::env::var("WANDERLIST_SESSION_COOKIE_NAME") {
            self.session.cookie_name = name;
        }
        if let Ok(days) = std::env::var("WANDERLIST_SESSION_EXPIRATION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                if days > 0 {
                    self.session.expiration_days = days;
                }
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches WANDERLIST_* variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "WANDERLIST_SERVER_HOST",
    "WANDERLIST_SERVER_PORT",
    "WANDERLIST_SERVER_PUBLIC_PATH",
    "WANDERLIST_DATABASE_DRIVER",
    "WANDERLIST_DATABASE_URL",
    "WANDERLIST_VIEWS_PATH",
    "WANDERLIST_SESSION_COOKIE_NAME",
    "WANDERLIST_SESSION_EXPIRATION_DAYS",
];
