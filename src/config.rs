//! Configuration loading.
//!
//! Loads the TOML config from `$FACTCHECK_CONFIG_PATH`, or from
//! `~/.factcheck/config.toml` when unset. A missing file means defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the per-user directory holding the database, logs and config.
const CONFIG_DIR_NAME: &str = ".factcheck";

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite settings (`[database]`).
    pub database: DatabaseConfig,
    /// Coordinator settings (`[service]`).
    pub service: ServiceConfig,
    /// Tracing settings (`[logging]`).
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// `explicit` (the `--config` flag) wins over `$FACTCHECK_CONFIG_PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => Self::config_path_with(env),
        };
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(env);
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides. A missing file yields
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("invalid config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve the config path using a custom env resolver.
    pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(p) = env("FACTCHECK_CONFIG_PATH") {
            return PathBuf::from(p);
        }
        config_dir()
            .map(|dir| dir.join("config.toml"))
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// Apply environment variable overrides.
    ///
    /// Takes a resolver function so tests never touch the process
    /// environment. Unparseable numbers are logged and ignored.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Database.
        if let Some(v) = env("FACTCHECK_DB_PATH") {
            self.database.path = PathBuf::from(v);
        }
        override_number(
            &env,
            "FACTCHECK_DB_MAX_CONNECTIONS",
            &mut self.database.max_connections,
        );
        override_number(
            &env,
            "FACTCHECK_DB_BUSY_TIMEOUT_SECS",
            &mut self.database.busy_timeout_secs,
        );

        // Service.
        override_number(
            &env,
            "FACTCHECK_TX_TIMEOUT_SECS",
            &mut self.service.transaction_timeout_secs,
        );

        // Logging.
        if let Some(v) = env("FACTCHECK_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env("FACTCHECK_LOG_DIR") {
            self.logging.dir = Some(PathBuf::from(v));
        }
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML or mistyped fields.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

fn override_number<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    target: &mut T,
) {
    if let Some(v) = env(var) {
        match v.trim().parse() {
            Ok(n) => *target = n,
            Err(_) => tracing::warn!(var, value = %v, "ignoring invalid env override"),
        }
    }
}

/// Resolve the per-user directory (`~/.factcheck/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(CONFIG_DIR_NAME))
}

// ── Database config ─────────────────────────────────────────────

/// SQLite settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file.
    pub path: PathBuf,
    /// Pool size. Values below one are treated as one.
    pub max_connections: u32,
    /// How long a writer waits for the database lock.
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: config_dir()
                .map(|dir| dir.join("factcheck.db"))
                .unwrap_or_else(|_| PathBuf::from("factcheck.db")),
            max_connections: 4,
            busy_timeout_secs: 5,
        }
    }
}

// ── Service config ──────────────────────────────────────────────

/// Coordinator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deadline for a single unit of work; `0` disables it.
    pub transaction_timeout_secs: u64,
}

impl ServiceConfig {
    /// Deadline as a [`Duration`], or `None` when disabled.
    pub fn transaction_timeout(&self) -> Option<Duration> {
        (self.transaction_timeout_secs > 0)
            .then(|| Duration::from_secs(self.transaction_timeout_secs))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            transaction_timeout_secs: 10,
        }
    }
}

// ── Logging config ──────────────────────────────────────────────

/// Tracing settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for rotated JSON logs; console only when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}
