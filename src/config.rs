//! Process configuration
//!
//! Read once at startup from the environment, after an optional `.env` file
//! has been loaded with [`EnvFile::load`].

use crate::panel::DEFAULT_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Panel connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bot_token: String,
    pub admin_ids: Vec<i64>,
    /// `None` disables forwarding of service requests
    pub admin_group_id: Option<i64>,
    pub admin_topic_id: Option<i32>,
    pub panel: PanelConfig,
    pub database_path: PathBuf,
    pub log_level: String,
}

const DEFAULT_TOPIC_ID: i32 = 1;

/// Outcome of loading the optional `.env` file.
///
/// Loading happens before logging is set up, so the outcome is kept and
/// reported once the subscriber exists.
#[derive(Debug, PartialEq, Eq)]
pub enum EnvFile {
    Loaded(PathBuf),
    Absent,
    Failed(String),
}

impl EnvFile {
    pub fn load() -> Self {
        Self::from_result(dotenvy::dotenv())
    }

    fn from_result(result: Result<PathBuf, dotenvy::Error>) -> Self {
        match result {
            Ok(path) => Self::Loaded(path),
            Err(e) if e.not_found() => Self::Absent,
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    pub fn log(&self) {
        match self {
            Self::Loaded(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
            Self::Absent => {}
            Self::Failed(error) => tracing::warn!(error = %error, "Failed to load .env"),
        }
    }
}

impl Config {
    /// Read the process environment. Call [`EnvFile::load`] first for `.env` support.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let admin_ids = match var("ADMIN_IDS") {
            Some(raw) => parse_id_list(&raw).ok_or(ConfigError::Invalid {
                name: "ADMIN_IDS",
                value: raw,
            })?,
            None => Vec::new(),
        };

        let admin_group_id = parse_opt::<i64>(var("ADMIN_GROUP_ID"), "ADMIN_GROUP_ID")?
            .filter(|id| *id != 0);
        let admin_topic_id = parse_opt::<i32>(var("ADMIN_TOPIC_ID"), "ADMIN_TOPIC_ID")?
            .unwrap_or(DEFAULT_TOPIC_ID);
        let timeout = parse_opt::<u64>(var("PANEL_TIMEOUT_SECS"), "PANEL_TIMEOUT_SECS")?
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        let database_path = var("DATABASE_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.remnabot/remnabot.db"))
            },
            PathBuf::from,
        );

        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
            admin_ids,
            admin_group_id,
            admin_topic_id: (admin_topic_id != 0).then_some(admin_topic_id),
            panel: PanelConfig {
                base_url: required("REMNAWAVE_API_URL")?,
                token: required("REMNAWAVE_API_TOKEN")?,
                timeout,
            },
            database_path,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_opt<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    raw.map(|value| {
        value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value })
    })
    .transpose()
}

/// `1,2,3` or a JSON list `[1, 2, 3]`
fn parse_id_list(raw: &str) -> Option<Vec<i64>> {
    if raw.starts_with('[') {
        return serde_json::from_str(raw).ok();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}
