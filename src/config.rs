use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SqlKeysetError;
use crate::types::Dialect;

pub const DEFAULT_CONNECTION_URL: &str = "database.sqlite3";
pub const DEFAULT_MAX_IDLE_CONNECTIONS: u16 = 30;
pub const DEFAULT_MAX_OPEN_CONNECTIONS: u16 = 100;

/// File name looked up in every configuration directory.
pub const CONFIG_FILE_NAME: &str = "appconfig.cfg";
/// System-wide configuration directory.
pub const SYSTEM_CONFIG_DIR: &str = "/etc/appconfig";
/// Per-user configuration directory, relative to `$HOME`.
pub const USER_CONFIG_DIR: &str = ".appconfig";

/// What the pool initializer needs to know about the database.
///
/// Implemented by [`DatabaseConfig`]; hosts with their own configuration types
/// can implement it directly.
pub trait RelationalDatabaseConfig {
    fn dialect(&self) -> Dialect;
    fn connection_url(&self) -> &str;
    /// Longest a connection may sit idle in the pool; `None` for no limit.
    fn connection_max_idle_time(&self) -> Option<Duration>;
    /// Longest a connection may live; `None` for no limit.
    fn connection_max_lifetime(&self) -> Option<Duration>;
    fn max_idle_connections(&self) -> u16;
    fn max_open_connections(&self) -> u16;
}

/// Database settings, deserializable from JSON with every field optional.
///
/// ```rust
/// use sql_keyset::config::{DatabaseConfig, RelationalDatabaseConfig};
///
/// let cfg = DatabaseConfig::from_json_str(r#"{ "connection-url": "app.db" }"#).unwrap();
/// assert_eq!(cfg.connection_url(), "app.db");
/// assert_eq!(cfg.max_open_connections(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DatabaseConfig {
    pub dialect: Dialect,
    pub connection_url: String,
    /// Zero means idle connections are never reaped.
    pub connxn_max_idle_time_seconds: u64,
    /// Zero means connections are never recycled for age.
    pub connxn_max_lifetime_seconds: u64,
    pub max_idle_connxns: u16,
    pub max_open_connxns: u16,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Sqlite3,
            connection_url: DEFAULT_CONNECTION_URL.to_owned(),
            connxn_max_idle_time_seconds: 0,
            connxn_max_lifetime_seconds: 0,
            max_idle_connxns: DEFAULT_MAX_IDLE_CONNECTIONS,
            max_open_connxns: DEFAULT_MAX_OPEN_CONNECTIONS,
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::new()
    }

    /// Parse a JSON document; missing keys take their defaults.
    ///
    /// # Errors
    /// Returns `SqlKeysetError::ConfigError` if the JSON is malformed or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, SqlKeysetError> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| SqlKeysetError::ConfigError(format!("invalid database config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    /// Returns `SqlKeysetError::IoError` if the file cannot be read, otherwise as
    /// [`DatabaseConfig::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SqlKeysetError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// # Errors
    /// Returns `SqlKeysetError::ConfigError` for an empty connection URL or a pool
    /// that may not open any connection.
    pub fn validate(&self) -> Result<(), SqlKeysetError> {
        if self.connection_url.trim().is_empty() {
            return Err(SqlKeysetError::ConfigError(
                "connection-url must not be empty".into(),
            ));
        }
        if self.max_open_connxns == 0 {
            return Err(SqlKeysetError::ConfigError(
                "max-open-connxns must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn non_zero_seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl RelationalDatabaseConfig for DatabaseConfig {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn connection_url(&self) -> &str {
        &self.connection_url
    }

    fn connection_max_idle_time(&self) -> Option<Duration> {
        non_zero_seconds(self.connxn_max_idle_time_seconds)
    }

    fn connection_max_lifetime(&self) -> Option<Duration> {
        non_zero_seconds(self.connxn_max_lifetime_seconds)
    }

    fn max_idle_connections(&self) -> u16 {
        self.max_idle_connxns
    }

    fn max_open_connections(&self) -> u16 {
        self.max_open_connxns
    }
}

/// Fluent builder for [`DatabaseConfig`].
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfigBuilder {
    cfg: DatabaseConfig,
}

impl DatabaseConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.cfg.dialect = dialect;
        self
    }

    #[must_use]
    pub fn connection_url(mut self, url: impl Into<String>) -> Self {
        self.cfg.connection_url = url.into();
        self
    }

    #[must_use]
    pub fn max_open_connections(mut self, max: u16) -> Self {
        self.cfg.max_open_connxns = max;
        self
    }

    #[must_use]
    pub fn max_idle_connections(mut self, max: u16) -> Self {
        self.cfg.max_idle_connxns = max;
        self
    }

    #[must_use]
    pub fn connection_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.cfg.connxn_max_lifetime_seconds = lifetime.as_secs();
        self
    }

    #[must_use]
    pub fn connection_max_idle_time(mut self, idle: Duration) -> Self {
        self.cfg.connxn_max_idle_time_seconds = idle.as_secs();
        self
    }

    #[must_use]
    pub fn finish(self) -> DatabaseConfig {
        self.cfg
    }

    /// Validate and build the pool.
    ///
    /// # Errors
    ///
    /// Returns `SqlKeysetError` if validation, pool creation, or the initial
    /// connection fails.
    #[cfg(feature = "sqlite")]
    pub async fn build(self) -> Result<crate::pool::ConfigAndPool, SqlKeysetError> {
        crate::pool::create_pool(&self.finish()).await
    }
}

/// Schema migration settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MigrationConfig {
    pub migration_enabled: bool,
    /// Directory of migration files, as `file://<dir>` or a plain path.
    pub migration_source: String,
}

impl MigrationConfig {
    #[must_use]
    pub fn enabled(source: impl Into<String>) -> Self {
        Self {
            migration_enabled: true,
            migration_source: source.into(),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// A complete settings document: the `rdbms` and `migration` sections.
///
/// Usually read with [`AppConfig::load`], which layers every configuration
/// file found on top of the defaults:
///
/// ```json
/// {
///   "rdbms": { "connection-url": "app.sqlite3", "max-open-connxns": 8 },
///   "migration": { "migration-enabled": true, "migration-source": "file://./migrations" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rdbms: DatabaseConfig,
    pub migration: MigrationConfig,
}

impl AppConfig {
    /// Where settings are looked up, lowest precedence first: the system
    /// directory, `$HOME/.appconfig`, the working directory, then `explicit`.
    #[must_use]
    pub fn search_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        search_paths_from(home.as_deref(), explicit)
    }

    /// Defaults overlaid by every file in [`AppConfig::search_paths`].
    ///
    /// Search locations that do not exist are skipped; an `explicit` path must
    /// exist.
    ///
    /// # Errors
    /// Returns `SqlKeysetError::IoError` if `explicit` is missing or a file
    /// cannot be read, and `SqlKeysetError::ConfigError` for malformed or
    /// invalid settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SqlKeysetError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(SqlKeysetError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file {} not found", path.display()),
                )));
            }
        }
        Self::load_layered(&Self::search_paths(explicit))
    }

    /// Defaults overlaid by each file in `paths`, later files winning key by
    /// key. Missing files are skipped.
    ///
    /// # Errors
    /// Returns `SqlKeysetError::IoError` if an existing file cannot be read, and
    /// `SqlKeysetError::ConfigError` if a file is not a JSON object or the
    /// merged settings fail validation.
    pub fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<Self, SqlKeysetError> {
        let mut merged = serde_json::to_value(Self::default())
            .map_err(|e| SqlKeysetError::ConfigError(format!("cannot encode defaults: {e}")))?;
        for path in paths {
            let path = path.as_ref();
            let raw = match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "config layer not present");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let layer: JsonValue = serde_json::from_str(&raw).map_err(|e| {
                SqlKeysetError::ConfigError(format!("invalid config {}: {e}", path.display()))
            })?;
            if !layer.is_object() {
                return Err(SqlKeysetError::ConfigError(format!(
                    "config {} must hold a JSON object",
                    path.display()
                )));
            }
            tracing::debug!(path = %path.display(), "applying config layer");
            merge_json(&mut merged, layer);
        }
        let cfg: Self = serde_json::from_value(merged)
            .map_err(|e| SqlKeysetError::ConfigError(format!("invalid config: {e}")))?;
        cfg.rdbms.validate()?;
        Ok(cfg)
    }
}

fn search_paths_from(home: Option<&Path>, explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME)];
    if let Some(home) = home {
        paths.push(home.join(USER_CONFIG_DIR).join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    if let Some(explicit) = explicit {
        paths.push(explicit.to_path_buf());
    }
    paths
}

/// Overlay `layer` onto `base`: objects merge per key, anything else replaces.
fn merge_json(base: &mut JsonValue, layer: JsonValue) {
    match (base, layer) {
        (JsonValue::Object(base), JsonValue::Object(layer)) => {
            for (key, value) in layer {
                merge_json(base.entry(key).or_insert(JsonValue::Null), value);
            }
        }
        (base, layer) => *base = layer,
    }
}

/// Database flags for a host binary; flatten into its `clap` parser.
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    #[arg(long = "db-dialect", value_enum, default_value_t = Dialect::Sqlite3)]
    pub dialect: Dialect,
    #[arg(long = "db-url", default_value = DEFAULT_CONNECTION_URL)]
    pub connection_url: String,
    #[arg(long = "db-max-open-connections", default_value_t = DEFAULT_MAX_OPEN_CONNECTIONS)]
    pub max_open_connections: u16,
    #[arg(long = "db-max-idle-connections", default_value_t = DEFAULT_MAX_IDLE_CONNECTIONS)]
    pub max_idle_connections: u16,
    #[arg(long = "db-max-lifetime-seconds", default_value_t = 0)]
    pub max_lifetime_seconds: u64,
    #[arg(long = "db-max-idle-time-seconds", default_value_t = 0)]
    pub max_idle_time_seconds: u64,
    /// Run pending migrations from this source at startup.
    #[arg(long = "migration-source")]
    pub migration_source: Option<String>,
    /// Settings file applied after the standard configuration locations.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

impl DatabaseArgs {
    #[must_use]
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            dialect: self.dialect,
            connection_url: self.connection_url.clone(),
            connxn_max_idle_time_seconds: self.max_idle_time_seconds,
            connxn_max_lifetime_seconds: self.max_lifetime_seconds,
            max_idle_connxns: self.max_idle_connections,
            max_open_connxns: self.max_open_connections,
        }
    }

    #[must_use]
    pub fn migration_config(&self) -> MigrationConfig {
        self.migration_source
            .as_ref()
            .map_or_else(MigrationConfig::disabled, MigrationConfig::enabled)
    }

    /// Settings from the configuration files, with `--config` as the last layer.
    ///
    /// The `--db-*` flags are not part of this result; use
    /// [`DatabaseArgs::database_config`] for flag-driven setups.
    ///
    /// # Errors
    /// As [`AppConfig::load`].
    pub fn load_config(&self) -> Result<AppConfig, SqlKeysetError> {
        AppConfig::load(self.config.as_deref())
    }
}
