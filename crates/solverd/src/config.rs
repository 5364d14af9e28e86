//! Configuration management for solverd.
//!
//! Loads settings from /etc/solverd/config.toml or uses defaults. The
//! resulting [`SolverConfig`] is immutable after startup and passed by
//! reference into the router and finalizer - handlers never read the
//! environment themselves.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/solverd/config.toml";

/// Environment variable consulted once at load time for the API token
pub const TOKEN_ENV_VAR: &str = "AIPROXY_TOKEN";

/// Generative service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Chat completions endpoint (OpenAI-compatible)
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,

    /// Bearer token; absence degrades every generative call, never panics
    #[serde(default)]
    pub api_token: Option<String>,

    /// Model identifier for both classify and finalize calls
    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Wall-clock budget per generative call; timeout is treated the same
    /// as a non-200 response
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,

    /// Output length bound for the finalize call
    #[serde(default = "default_max_answer_tokens")]
    pub max_answer_tokens: u32,
}

fn default_ai_endpoint() -> String {
    "https://aiproxy.sanand.workers.dev/openai/v1/chat/completions".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ai_timeout() -> u64 {
    60
}

fn default_max_answer_tokens() -> u32 {
    1000
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ai_endpoint(),
            api_token: None,
            model: default_ai_model(),
            timeout_secs: default_ai_timeout(),
            max_answer_tokens: default_max_answer_tokens(),
        }
    }
}

/// JSON-hash fallback service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashServiceConfig {
    /// Endpoint used only when local normalize-then-hash fails
    #[serde(default = "default_hash_service_url")]
    pub url: String,

    #[serde(default = "default_hash_service_timeout")]
    pub timeout_secs: u64,
}

fn default_hash_service_url() -> String {
    "https://tools-in-data-science.pages.dev/api/jsonhash".to_string()
}

fn default_hash_service_timeout() -> u64 {
    10
}

impl Default for HashServiceConfig {
    fn default() -> Self {
        Self {
            url: default_hash_service_url(),
            timeout_secs: default_hash_service_timeout(),
        }
    }
}

/// HTTP front door configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Upper bound on the multipart request body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// File pre-processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Cap on file content embedded into finalize prompts; truncation
    /// appends an explicit marker
    #[serde(default = "default_max_embed_len")]
    pub max_embed_len: usize,
}

fn default_max_embed_len() -> usize {
    8000
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            max_embed_len: default_max_embed_len(),
        }
    }
}

/// Complete solverd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub hash_service: HashServiceConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub files: FilesConfig,
}

impl SolverConfig {
    /// Load configuration from the default path, falling back to pure
    /// defaults when the file is absent. The API token is seeded from the
    /// environment here and nowhere else.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Self {
        let mut config = match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<SolverConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config at {}: {}. Using defaults.", path.display(), e);
                    SolverConfig::default()
                }
            },
            Err(_) => {
                info!("No config file at {}, using defaults", path.display());
                SolverConfig::default()
            }
        };

        if config.ai.api_token.is_none() {
            if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
                if !token.is_empty() {
                    config.ai.api_token = Some(token);
                }
            }
        }

        config
    }

    /// Save current configuration (used by the installer, not at runtime).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
