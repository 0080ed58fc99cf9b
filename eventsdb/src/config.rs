//! Application configuration management.
//!
//! Configuration is loaded from an optional YAML file with environment
//! variable overrides. Sources are merged in the following order (later
//! sources override earlier ones):
//!
//! 1. **Defaults** - the values in [`Config::default`]
//! 2. **YAML config file** - `eventsdb.yaml` by default
//! 3. **`DB*` environment variables** - the variables the deployment
//!    environment has always used (`DBHOST`, `DBUSER`, `DBPASSWORD`,
//!    `DBDATABASE`), mapped onto the `database` section
//! 4. **`EVENTSDB_`-prefixed environment variables** - any config key, with
//!    double underscores for nesting (e.g. `EVENTSDB_FALLBACK__MODE=strict`)
//!
//! ```bash
//! # Point at a different database server
//! DBHOST=db.internal DBUSER=svc DBPASSWORD=... DBDATABASE=events_db
//!
//! # Surface database errors instead of silently serving the fallback data
//! EVENTSDB_FALLBACK__MODE=strict
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file path, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "eventsdb.yaml";

/// Main application configuration.
///
/// All fields have defaults, so an empty environment yields a working
/// configuration pointed at a local MariaDB instance.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Connection settings for the MariaDB store.
    pub database: DatabaseConfig,
    /// What to do when the database path fails.
    pub fallback: FallbackConfig,
}

/// MariaDB connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database server host.
    pub host: String,
    /// Database user.
    pub user: String,
    /// Database password.
    pub password: String,
    /// Database (schema) name.
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: "events_user".to_string(),
            password: "letmein!".to_string(),
            name: "events_db".to_string(),
        }
    }
}

/// Fallback policy settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackConfig {
    pub mode: FallbackMode,
}

/// Policy for recovering from connection or query failures.
///
/// `Silent` matches the behavior the application has always had: callers get
/// a normal response served from the in-memory store, and the failure is only
/// visible in the logs. `Strict` surfaces [`DbError::Unavailable`] and
/// [`DbError::Query`] to the caller instead.
///
/// [`DbError::Unavailable`]: crate::db::errors::DbError::Unavailable
/// [`DbError::Query`]: crate::db::errors::DbError::Query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    #[default]
    Silent,
    Strict,
}

impl Config {
    /// Load configuration from the default file path and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific YAML file (which may be absent)
    /// and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file(path))
            // The bare DB* variables predate this crate; map them onto the
            // database section so existing deployments keep working.
            .merge(
                Env::raw()
                    .only(&["DBHOST", "DBUSER", "DBPASSWORD", "DBDATABASE"])
                    .map(|key| {
                        if key.as_str().eq_ignore_ascii_case("DBHOST") {
                            "database__host".into()
                        } else if key.as_str().eq_ignore_ascii_case("DBUSER") {
                            "database__user".into()
                        } else if key.as_str().eq_ignore_ascii_case("DBPASSWORD") {
                            "database__password".into()
                        } else {
                            "database__name".into()
                        }
                    })
                    .split("__"),
            )
            .merge(Env::prefixed("EVENTSDB_").split("__"))
    }
}
