use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3-haiku";
pub const DEFAULT_STORE_PATH: &str = "insights.json";

const API_KEY_NAME: &str = "OPENROUTER_API_KEY";
const DEFAULT_SECRETS_PATH: &str = "secrets.json";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API credential found: set OPENROUTER_API_KEY in the secrets file or the environment")]
    MissingCredential,
    #[error("failed to read secrets file {path}")]
    SecretsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse secrets file {path}")]
    SecretsInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid PRATITI_TIMEOUT_SECS value {value:?}: expected a positive number of seconds")]
    InvalidTimeout { value: String },
}

/// Process-wide configuration, resolved once at startup and passed explicitly
/// into the orchestrator and store.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub store_path: PathBuf,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Resolves configuration from the secrets file and environment variables.
    /// A missing credential fails fast here, before any network call is made.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secrets_path =
            env::var("PRATITI_SECRETS").unwrap_or_else(|_| DEFAULT_SECRETS_PATH.to_string());
        let api_key = resolve_api_key(Path::new(&secrets_path))?;

        let endpoint =
            env::var("PRATITI_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let model = env::var("PRATITI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let store_path = env::var("PRATITI_STORE")
            .unwrap_or_else(|_| DEFAULT_STORE_PATH.to_string())
            .into();

        let request_timeout = match env::var("PRATITI_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidTimeout { value: raw })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            endpoint,
            model,
            api_key,
            store_path,
            request_timeout,
        })
    }
}

/// Looks up the bearer credential in the secrets file first, then falls back
/// to the environment variable of the same name.
fn resolve_api_key(secrets_path: &Path) -> Result<String, ConfigError> {
    if secrets_path.exists() {
        if let Some(key) = read_secrets_key(secrets_path)? {
            return Ok(key);
        }
    }

    match env::var(API_KEY_NAME) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ConfigError::MissingCredential),
    }
}

fn read_secrets_key(secrets_path: &Path) -> Result<Option<String>, ConfigError> {
    let raw = fs::read_to_string(secrets_path).map_err(|source| ConfigError::SecretsUnreadable {
        path: secrets_path.to_path_buf(),
        source,
    })?;

    let secrets: HashMap<String, Value> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::SecretsInvalid {
            path: secrets_path.to_path_buf(),
            source,
        })?;

    Ok(secrets
        .get(API_KEY_NAME)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string))
}
