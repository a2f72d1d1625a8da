//! Runtime configuration for mailwire
//!
//! Settings are loaded from (in order of priority):
//! 1. An explicit JSON file, when one is given
//! 2. `mailwire.json` in the mailwire config directory
//! 3. Built-in defaults
//!
//! `MAILWIRE_*` environment variables then override individual fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config filename in the mailwire config directory
const CONFIG_FILE: &str = "mailwire.json";

/// Gmail REST API base URL
pub const GMAIL_API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// Settings consumed by the mailwire components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Largest attachment that may be downloaded, in bytes
    pub max_attachment_bytes: u64,
    /// Domain used on the right-hand side of generated Message-IDs
    pub message_id_domain: String,
    /// Base URL of the remote mailbox REST API
    pub api_base_url: String,
    /// Page size used when listing threads without an explicit size
    pub default_page_size: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            max_attachment_bytes: 25 * 1024 * 1024,
            message_id_domain: "mailwire.local".to_string(),
            api_base_url: GMAIL_API_BASE_URL.to_string(),
            default_page_size: 50,
        }
    }
}

impl MailConfig {
    /// Load the configuration from the default location, then apply env overrides
    pub fn load() -> Result<Self> {
        let base = if config::config_exists(CONFIG_FILE) {
            config::load_json(CONFIG_FILE)?
        } else {
            Self::default()
        };
        base.with_env_overrides()
    }

    /// Load the configuration from a specific JSON file, then apply env overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let base: Self = config::load_json_file(path)?;
        base.with_env_overrides()
    }

    /// Parse configuration from a JSON string; missing fields use defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse mailwire config JSON")
    }

    /// Get the default config file path (~/.config/mailwire/mailwire.json)
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_path(CONFIG_FILE)
    }

    /// Apply `MAILWIRE_*` environment variable overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MAILWIRE_MAX_ATTACHMENT_BYTES") {
            self.max_attachment_bytes = value
                .trim()
                .parse()
                .context("MAILWIRE_MAX_ATTACHMENT_BYTES must be an integer")?;
        }
        if let Some(value) = lookup("MAILWIRE_MESSAGE_ID_DOMAIN") {
            self.message_id_domain = value;
        }
        if let Some(value) = lookup("MAILWIRE_API_BASE_URL") {
            self.api_base_url = value.trim_end_matches('/').to_string();
        }
        if let Some(value) = lookup("MAILWIRE_DEFAULT_PAGE_SIZE") {
            self.default_page_size = value
                .trim()
                .parse()
                .context("MAILWIRE_DEFAULT_PAGE_SIZE must be an integer")?;
        }
        Ok(self)
    }
}
