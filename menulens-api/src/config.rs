//! Service configuration
//!
//! Settings resolve ENV → TOML → default, highest first. API keys for the
//! external collaborators are resolved once here at startup; the clients
//! built from them live for the whole process.

use menulens_common::{config as common_config, Error, Result};
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5980";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com/search";

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub serpapi_key: String,
    pub serpapi_base_url: String,
    /// Bearer-token checking; disable for local development only
    pub auth_enabled: bool,
}

impl Config {
    /// Load configuration. API keys are required; everything else has a
    /// sensible default.
    pub fn load(data_dir_arg: Option<&str>) -> Result<Self> {
        let data_dir = common_config::resolve_data_dir(data_dir_arg);
        let toml = load_toml();

        let openai_api_key = resolve("MENULENS_OPENAI_API_KEY", &toml, "openai_api_key")
            .ok_or_else(|| {
                Error::Config(
                    "OpenAI API key not configured. Set MENULENS_OPENAI_API_KEY or add \
                     openai_api_key to the config file."
                        .to_string(),
                )
            })?;

        let serpapi_key = resolve("MENULENS_SERPAPI_KEY", &toml, "serpapi_key").ok_or_else(|| {
            Error::Config(
                "SerpAPI key not configured. Set MENULENS_SERPAPI_KEY or add serpapi_key \
                 to the config file."
                    .to_string(),
            )
        })?;

        let auth_enabled = resolve("MENULENS_AUTH_ENABLED", &toml, "auth_enabled")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Ok(Self {
            bind_addr: resolve("MENULENS_BIND_ADDR", &toml, "bind_addr")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            data_dir,
            openai_api_key,
            openai_base_url: resolve("MENULENS_OPENAI_BASE_URL", &toml, "openai_base_url")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            serpapi_key,
            serpapi_base_url: resolve("MENULENS_SERPAPI_BASE_URL", &toml, "serpapi_base_url")
                .unwrap_or_else(|| DEFAULT_SERPAPI_BASE_URL.to_string()),
            auth_enabled,
        })
    }

    /// Path to the SQLite database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("menulens.db")
    }

    /// Root of the raw-upload object store
    pub fn uploads_root(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Root of the derived-artifact object store
    pub fn cache_root(&self) -> PathBuf {
        self.data_dir.join("cache")
    }
}

fn load_toml() -> Option<toml::Value> {
    let path = common_config::config_file_path().ok()?;
    let content = std::fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

fn resolve(env_var: &str, toml: &Option<toml::Value>, toml_key: &str) -> Option<String> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.trim().is_empty() {
            return Some(value);
        }
    }

    toml.as_ref()
        .and_then(|t| t.get(toml_key))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}
