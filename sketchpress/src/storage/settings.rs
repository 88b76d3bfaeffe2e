//! Settings file management
//!
//! Secrets never live here: the host token and the generator key come from
//! the environment or the command line.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// sketchpress settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Host (GitHub) API configuration
    #[serde(default)]
    pub host: HostSettings,

    /// Generator (Gemini) configuration
    #[serde(default)]
    pub generator: GeneratorSettings,

    /// Deployment behavior
    #[serde(default)]
    pub deploy: DeploySettings,

    /// Audit behavior
    #[serde(default)]
    pub audit: AuditSettings,
}

impl Settings {
    /// Read settings from `file`, falling back to defaults when it does not exist
    pub async fn load_or_default(file: &File) -> Result<Self, AppError> {
        if !file.exists().await {
            debug!("No settings at {}, using defaults", file.path().display());
            return Ok(Self::default());
        }

        let settings: Settings = file.read_json().await.map_err(|e| {
            AppError::ConfigError(format!("{}: {}", file.path().display(), e))
        })?;
        info!("Loaded settings from {}", file.path().display());
        Ok(settings)
    }

    pub async fn save(&self, file: &File) -> Result<(), AppError> {
        file.write_json(self).await
    }
}

/// Host API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSettings {
    /// Base URL for the host REST API
    #[serde(default = "default_host_api_url")]
    pub api_base_url: String,

    /// Domain serving static sites, `{owner}.{pages_domain}`
    #[serde(default = "default_pages_domain")]
    pub pages_domain: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_host_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_pages_domain() -> String {
    "github.io".to_string()
}

fn default_user_agent() -> String {
    format!("sketchpress/{}", env!("CARGO_PKG_VERSION"))
}

fn default_host_timeout() -> u64 {
    30
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_host_api_url(),
            pages_domain: default_pages_domain(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_host_timeout(),
        }
    }
}

/// Generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    #[serde(default = "default_generator_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Generation is slow; keep this well above the host timeout
    #[serde(default = "default_generator_timeout")]
    pub request_timeout_secs: u64,
}

fn default_generator_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_generator_timeout() -> u64 {
    120
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            base_url: default_generator_url(),
            model: default_model(),
            request_timeout_secs: default_generator_timeout(),
        }
    }
}

/// Deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Fixed wait after creating a repository
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Poll for the new repository instead of sleeping; number of polls
    #[serde(default)]
    pub settle_poll: Option<u32>,

    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_site_path")]
    pub site_path: String,

    #[serde(default = "default_file_path")]
    pub file_path: String,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_call_timeout() -> u64 {
    30
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_site_path() -> String {
    "/".to_string()
}

fn default_file_path() -> String {
    "index.html".to_string()
}

fn default_commit_message() -> String {
    "Deploy from sketchpress".to_string()
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            settle_poll: None,
            call_timeout_secs: default_call_timeout(),
            branch: default_branch(),
            site_path: default_site_path(),
            file_path: default_file_path(),
            commit_message: default_commit_message(),
        }
    }
}

/// Audit settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Report answers that do not match the findings schema as errors
    #[serde(default)]
    pub strict: bool,
}
