use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::MediaError;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const MIN_REQUEST_TIMEOUT_SECS: u64 = 5;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Checked in order; the first non-empty value wins.
pub const API_KEY_VARS: &[&str] = &["MEDIAKIT_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// Runtime settings read from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base: String,
    pub request_timeout: Duration,
    pub image_model: Option<String>,
    pub vision_model: Option<String>,
    pub text_model: Option<String>,
    pub events_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            image_model: None,
            vision_model: None,
            text_model: None,
            events_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(non_empty_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base = lookup("MEDIAKIT_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let timeout_secs = lookup("MEDIAKIT_REQUEST_TIMEOUT_SECS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .clamp(MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS);
        Self {
            api_base,
            request_timeout: Duration::from_secs(timeout_secs),
            image_model: lookup("MEDIAKIT_IMAGE_MODEL"),
            vision_model: lookup("MEDIAKIT_VISION_MODEL"),
            text_model: lookup("MEDIAKIT_TEXT_MODEL"),
            events_path: lookup("MEDIAKIT_EVENTS").map(PathBuf::from),
        }
    }
}

/// Loads a `.env` file into the process environment. An explicit path must exist;
/// otherwise the nearest `.env` is used when there is one.
pub fn load_env_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        None => Ok(dotenvy::dotenv().ok()),
    }
}

/// Where the gateway gets its API key. Consulted on every call, never at startup.
pub trait CredentialSource: Send + Sync {
    fn api_key(&self) -> Option<String>;

    fn missing_message(&self) -> String {
        "API key not configured.".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct EnvCredentials {
    vars: Vec<&'static str>,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self {
            vars: API_KEY_VARS.to_vec(),
        }
    }
}

impl CredentialSource for EnvCredentials {
    fn api_key(&self) -> Option<String> {
        self.vars.iter().find_map(|key| non_empty_env(key))
    }

    fn missing_message(&self) -> String {
        format!(
            "API key not configured. Set {} in the environment or a .env file.",
            self.vars.join(" or ")
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub Option<String>);

impl CredentialSource for StaticCredentials {
    fn api_key(&self) -> Option<String> {
        self.0
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

pub(crate) fn require_api_key(source: &dyn CredentialSource) -> Result<String, MediaError> {
    source
        .api_key()
        .ok_or_else(|| MediaError::Configuration(source.missing_message()))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
