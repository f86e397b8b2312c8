use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub backend_url: String,
    pub api_prefix: String,

    // Local files
    pub token_file: PathBuf,
    pub holiday_store_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_file: String,

    /// Restore the previous cell value when persisting an edit fails.
    pub rollback_on_failure: bool,
    pub request_timeout: Duration,
    pub employee_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let (log_dir, log_file) = split_log_path(&var("LOG_DIR", "logs/dashboard.log"));

        Ok(Self {
            server_addr: var("SERVER_ADDR", "127.0.0.1:8080"),
            backend_url: var("HRM_BACKEND_URL", "http://127.0.0.1:5000/admin"),
            api_prefix: var("API_PREFIX", "/api"),

            token_file: var("TOKEN_FILE", "data/session.token").into(),
            holiday_store_path: var("HOLIDAY_STORE_PATH", "data/holidays.json").into(),
            log_dir,
            log_file,

            rollback_on_failure: parse_flag(&var("ROLLBACK_ON_FAILURE", "false"))
                .context("ROLLBACK_ON_FAILURE must be true or false")?,
            request_timeout: Duration::from_secs(
                var("REQUEST_TIMEOUT_SECS", "30")
                    .parse()
                    .context("REQUEST_TIMEOUT_SECS must be a number of seconds")?,
            ),
            employee_cache_ttl: Duration::from_secs(
                var("EMPLOYEE_CACHE_TTL_SECS", "300")
                    .parse()
                    .context("EMPLOYEE_CACHE_TTL_SECS must be a number of seconds")?,
            ),
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("unrecognised flag value '{}'", other),
    }
}

/// `logs/dashboard.log` -> (`logs`, `dashboard.log`); a bare directory keeps
/// the default file name.
fn split_log_path(raw: &str) -> (PathBuf, String) {
    let path = PathBuf::from(raw);
    match (path.extension(), path.file_name(), path.parent()) {
        (Some(_), Some(name), Some(parent)) => (
            parent.to_path_buf(),
            name.to_string_lossy().into_owned(),
        ),
        _ => (path, "dashboard.log".to_string()),
    }
}
