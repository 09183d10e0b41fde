use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::layout::Strictness;

/// Application configuration loaded from environment variables.
/// Startup fails with context if a variable is present but invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Bundled catalog is used when unset.
    pub layout_catalog_path: Option<PathBuf>,
    /// Enables the external planner when set.
    pub anthropic_api_key: Option<String>,
    pub planner_timeout: Duration,
    pub shuffle_layouts: bool,
    pub strictness: Strictness,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            layout_catalog_path: None,
            anthropic_api_key: None,
            planner_timeout: Duration::from_secs(30),
            shuffle_layouts: false,
            strictness: Strictness::Strict,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let optional = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            port: match optional("PORT") {
                Some(v) => v
                    .trim()
                    .parse::<u16>()
                    .context("PORT must be a valid port number")?,
                None => defaults.port,
            },
            rust_log: optional("RUST_LOG").unwrap_or(defaults.rust_log),
            layout_catalog_path: optional("LAYOUT_CATALOG_PATH").map(PathBuf::from),
            anthropic_api_key: optional("ANTHROPIC_API_KEY"),
            planner_timeout: match optional("PLANNER_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(
                    v.trim()
                        .parse::<u64>()
                        .context("PLANNER_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
                None => defaults.planner_timeout,
            },
            shuffle_layouts: match optional("SHUFFLE_LAYOUTS") {
                Some(v) => parse_bool(&v).context("SHUFFLE_LAYOUTS must be true or false")?,
                None => defaults.shuffle_layouts,
            },
            strictness: match optional("ASSIGNMENT_STRICTNESS") {
                Some(v) => v
                    .parse::<Strictness>()
                    .map_err(|e| anyhow!(e))
                    .context("ASSIGNMENT_STRICTNESS is invalid")?,
                None => defaults.strictness,
            },
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("'{other}' is not a boolean")),
    }
}
