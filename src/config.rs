//! Configuration for the backend and email collaborators.
//!
//! Configuration is stored in `frontdesk.yaml` and includes the backend
//! base URL and API key plus the email function endpoint. Environment
//! variables take precedence over the file, so deployments can inject
//! credentials without writing them to disk.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default config file name, resolved relative to the working directory.
pub const CONFIG_FILE: &str = "frontdesk.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted backend, e.g. `https://acme.example.co`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Full URL of the email-sending function.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Config {
    /// Load configuration from the default file, or return defaults if it
    /// doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Backend base URL from the environment or the config file.
    pub fn backend_url(&self) -> Option<String> {
        if let Ok(url) = env::var("FRONTDESK_BACKEND_URL")
            && !url.is_empty()
        {
            return Some(url);
        }
        self.backend.url.clone()
    }

    /// Backend API key from the environment or the config file.
    pub fn backend_api_key(&self) -> Option<String> {
        if let Ok(key) = env::var("FRONTDESK_API_KEY")
            && !key.is_empty()
        {
            return Some(key);
        }
        self.backend.api_key.clone()
    }

    /// Email function URL from the environment or the config file.
    pub fn email_function_url(&self) -> Option<String> {
        if let Ok(url) = env::var("FRONTDESK_EMAIL_URL")
            && !url.is_empty()
        {
            return Some(url);
        }
        self.email.function_url.clone()
    }

    /// Email function API key from the environment or the config file.
    pub fn email_api_key(&self) -> Option<String> {
        if let Ok(key) = env::var("FRONTDESK_EMAIL_KEY")
            && !key.is_empty()
        {
            return Some(key);
        }
        self.email.api_key.clone()
    }
}
