//! Startup configuration
//!
//! Settings come from the process environment first and a `.env` file
//! second. The file is parsed into a map rather than loaded into the
//! environment, so resolution never mutates process state.

use crate::llm::gemini::DEFAULT_MODEL;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the Gemini API key
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

const MODEL_VAR: &str = "GEMINI_MODEL";
const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
const MAX_OUTPUT_TOKENS_VAR: &str = "GEMINI_MAX_OUTPUT_TOKENS";
const PORT_VAR: &str = "TRAVEL_GUIDE_PORT";
const ENV_FILE_VAR: &str = "TRAVEL_GUIDE_ENV_FILE";

const DEFAULT_ENV_FILE: &str = ".env";
const DEFAULT_PORT: u16 = 8501;

/// Fatal startup errors. Any of these halts the chat.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key for {0} not found. Please set it in the .env file.")]
    MissingApiKey(&'static str),
    #[error("Failed to configure Gemini client: {0}")]
    ClientSetup(String),
}

/// Variable lookup over the process environment and an optional `.env` file
#[derive(Debug, Default)]
pub struct EnvLookup {
    use_process_env: bool,
    file_vars: HashMap<String, String>,
}

impl EnvLookup {
    /// Process environment backed by the `.env` file named by
    /// `TRAVEL_GUIDE_ENV_FILE` (default `.env` in the working directory)
    pub fn from_env() -> Self {
        let path = std::env::var(ENV_FILE_VAR)
            .map_or_else(|_| PathBuf::from(DEFAULT_ENV_FILE), PathBuf::from);
        Self {
            use_process_env: true,
            file_vars: read_env_file(&path),
        }
    }

    /// Lookup over a fixed set of variables only
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            use_process_env: false,
            file_vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        if self.use_process_env {
            if let Ok(value) = std::env::var(name) {
                return Some(value);
            }
        }
        self.file_vars.get(name).cloned()
    }

    /// Like `get`, but blank values count as unset
    fn get_non_empty(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Parse a `.env` file. A missing file yields no variables; a malformed one
/// is reported and ignored.
pub fn read_env_file(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            tracing::debug!(path = %path.display(), "No .env file found");
            return HashMap::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to open .env file");
            return HashMap::new();
        }
    };

    match iter.collect::<Result<HashMap<_, _>, _>>() {
        Ok(vars) => {
            tracing::debug!(path = %path.display(), count = vars.len(), "Loaded .env file");
            vars
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed .env file");
            HashMap::new()
        }
    }
}

/// HTTP server settings. Always resolvable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    pub fn resolve(env: &EnvLookup) -> Self {
        let port = env
            .get(PORT_VAR)
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { port }
    }
}

/// Generation client settings
#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_output_tokens: Option<u32>,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl GeminiConfig {
    /// Resolve settings, failing if the API key is missing or blank
    pub fn resolve(env: &EnvLookup) -> Result<Self, ConfigError> {
        let api_key = env
            .get_non_empty(API_KEY_VAR)
            .ok_or(ConfigError::MissingApiKey(API_KEY_VAR))?;

        let max_output_tokens = env.get_non_empty(MAX_OUTPUT_TOKENS_VAR).and_then(|raw| {
            raw.parse::<u32>().map_or_else(
                |_| {
                    tracing::warn!(value = %raw, "Ignoring unparsable {MAX_OUTPUT_TOKENS_VAR}");
                    None
                },
                Some,
            )
        });

        Ok(Self {
            api_key,
            model: env
                .get_non_empty(MODEL_VAR)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: env.get_non_empty(BASE_URL_VAR),
            max_output_tokens,
        })
    }
}
