use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

use crate::error::{Result, TidyError};

pub const DEFAULT_BASE_URL: &str = "https://api.ynab.com/v1";

/// Environment configuration, read from `YNAB_*` variables (and `.env`).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub budget_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub duplicate_cleanup_dry_run: bool,
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub payee_cleanup_dry_run: bool,
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub rules_dry_run: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected true or false, got '{other}'"
        ))),
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::prefixed("YNAB_")
            .from_iter(vars)
            .map_err(|e| TidyError::Config(format!("invalid environment: {e}")))?;

        let mut missing = Vec::new();
        if config.api_key.trim().is_empty() {
            missing.push("YNAB_API_KEY");
        }
        if config.budget_id.trim().is_empty() {
            missing.push("YNAB_BUDGET_ID");
        }
        if !missing.is_empty() {
            return Err(TidyError::Config(format!(
                "Missing required configuration: {}",
                missing.join(", ")
            )));
        }
        Ok(config)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ynab-tidy")
}

/// Location of the rules file: `YNAB_RULES_FILE` if set, else the config dir.
pub fn rules_path() -> PathBuf {
    dotenv::dotenv().ok();
    match std::env::var("YNAB_RULES_FILE") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(shellexpand_path(path.trim())),
        _ => config_dir().join("rules.json"),
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
