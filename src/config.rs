use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Hepatica";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the HTTP API.
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Frontend dev servers allowed by CORS when nothing else is configured.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:3001"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Get the application data directory (~/Hepatica/)
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Default SQLite database location
pub fn default_db_path() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join("hepatica.db"))
}

/// Directory holding the optional staging model artifacts
pub fn default_models_dir() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join("models"))
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,hepatica_lib=debug,tower_http=info"
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub models_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub seed_demo: bool,
}

impl AppConfig {
    /// Read configuration from `HEPATICA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup("HEPATICA_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                var: "HEPATICA_BIND",
                value: bind_raw.clone(),
            })?;

        let db_path = match lookup("HEPATICA_DB_PATH") {
            Some(p) => PathBuf::from(p),
            None => default_db_path()?,
        };

        let models_dir = match lookup("HEPATICA_MODELS_DIR") {
            Some(p) => PathBuf::from(p),
            None => default_models_dir()?,
        };

        let cors_origins = match lookup("HEPATICA_CORS_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        let seed_demo = match lookup("HEPATICA_SEED_DEMO") {
            Some(v) => parse_flag("HEPATICA_SEED_DEMO", &v)?,
            None => false,
        };

        Ok(Self {
            bind,
            db_path,
            models_dir,
            cors_origins,
            seed_demo,
        })
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}
