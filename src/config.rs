//! Runtime configuration read from the environment

use std::env;
use std::path::PathBuf;

pub const DB_ENV: &str = "MANUSCRIPT_DB";
pub const ENVIRONMENT_ENV: &str = "MANUSCRIPT_ENV";
pub const LOG_ENV: &str = "MANUSCRIPT_LOG";

const DEFAULT_LOG_FILTER: &str = "manuscript=info";

/// Deployment environment; controls how much error detail callers see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl std::str::FromStr for Environment {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!("unknown environment: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub environment: Environment,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Config {
    /// Build from `MANUSCRIPT_*` variables. Unset or unparseable values fall
    /// back to defaults; `MANUSCRIPT_LOG` falls back to `RUST_LOG`.
    pub fn from_env() -> Self {
        let db_path = env::var(DB_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let environment = env::var(ENVIRONMENT_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let log_filter = env::var(LOG_ENV)
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Self {
            db_path,
            environment,
            log_filter,
        }
    }

    pub fn with_db_path(mut self, db_path: Option<PathBuf>) -> Self {
        if let Some(path) = db_path {
            self.db_path = path;
        }
        self
    }

    pub fn with_environment(mut self, environment: Option<Environment>) -> Self {
        if let Some(environment) = environment {
            self.environment = environment;
        }
        self
    }
}

/// Default database path (`<data dir>/manuscript/manuscript.db`)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("manuscript").join("manuscript.db")
}
