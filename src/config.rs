use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Clinic Scheduler";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_BIND_ADDR: &str = "CLINIC_BIND_ADDR";
pub const ENV_DB_PATH: &str = "CLINIC_DB_PATH";
pub const ENV_TOKEN_SECRET: &str = "CLINIC_TOKEN_SECRET";
pub const ENV_TOKEN_TTL_SECS: &str = "CLINIC_TOKEN_TTL_SECS";
pub const ENV_STORE: &str = "CLINIC_STORE";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
/// Login tokens live one hour unless overridden.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "clinic_scheduler_lib=debug,tower=info,info"
    } else {
        "clinic_scheduler_lib=info,warn"
    }
}

/// Get the application data directory
/// ~/ClinicScheduler/ when a home directory exists, else the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ClinicScheduler")
}

/// Default location of the SQLite database.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("clinic.db")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CLINIC_TOKEN_SECRET must be set")]
    MissingSecret,
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Backing store selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

/// Runtime configuration, read from the environment at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub token_secret: String,
    pub token_ttl: Duration,
    pub store: StoreKind,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("db_path", &self.db_path)
            .field("token_ttl_secs", &self.token_ttl.num_seconds())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank values take
    /// their defaults; only the token secret is mandatory.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = get(ENV_BIND_ADDR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                name: ENV_BIND_ADDR,
                value: bind_addr.clone(),
            })?;

        let db_path = get(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let token_secret = get(ENV_TOKEN_SECRET).ok_or(ConfigError::MissingSecret)?;

        let token_ttl = match get(ENV_TOKEN_TTL_SECS) {
            None => Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            Some(raw) => match raw.parse::<i64>() {
                Ok(secs) if secs > 0 => Duration::seconds(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: ENV_TOKEN_TTL_SECS,
                        value: raw,
                    })
                }
            },
        };

        let store = match get(ENV_STORE).as_deref() {
            None | Some("sqlite") => StoreKind::Sqlite,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: ENV_STORE,
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr,
            db_path,
            token_secret,
            token_ttl,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn app_data_dir_named_after_app() {
        assert!(app_data_dir().ends_with("ClinicScheduler"));
        assert!(default_db_path().ends_with("ClinicScheduler/clinic.db"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config =
            AppConfig::from_lookup(lookup(&[(ENV_TOKEN_SECRET, "0123456789abcdef0123456789abcdef")]))
                .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.db_path, default_db_path());
        assert_eq!(config.token_ttl, Duration::hours(1));
        assert_eq!(config.store, StoreKind::Sqlite);
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_TOKEN_SECRET, "s"),
            (ENV_BIND_ADDR, "0.0.0.0:9000"),
            (ENV_DB_PATH, "/tmp/x.db"),
            (ENV_TOKEN_TTL_SECS, "60"),
            (ENV_STORE, "memory"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.token_ttl, Duration::seconds(60));
        assert_eq!(config.store, StoreKind::Memory);
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingSecret)
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(ENV_TOKEN_SECRET, "   ")])),
            Err(ConfigError::MissingSecret)
        ));
    }

    #[test]
    fn bad_values_are_rejected() {
        for (name, value) in [
            (ENV_BIND_ADDR, "not-an-addr"),
            (ENV_TOKEN_TTL_SECS, "0"),
            (ENV_TOKEN_TTL_SECS, "soon"),
            (ENV_STORE, "postgres"),
        ] {
            let result = AppConfig::from_lookup(lookup(&[(ENV_TOKEN_SECRET, "s"), (name, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { .. })),
                "{name}={value} should be rejected"
            );
        }
    }
}
