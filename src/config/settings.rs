//! Runtime settings loaded from the JSON config file
//!
//! Every field has a serde default so partial files load cleanly. Values are
//! clamped to sane ranges after loading and after environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::constants::{config, timing};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Delay between a successful delete and the page reload
    #[serde(default = "default_reload_delay_ms")]
    pub reload_delay_ms: u64,

    /// How long live-region announcers stay in the document
    #[serde(default = "default_announce_duration_ms")]
    pub announce_duration_ms: u64,

    #[serde(default = "default_notification_duration_ms")]
    pub notification_duration_ms: u64,

    #[serde(default = "default_notification_exit_ms")]
    pub notification_exit_ms: u64,

    /// Deferral before a focus trap focuses its first element
    #[serde(default = "default_focus_delay_ms")]
    pub focus_delay_ms: u64,

    /// Hosts treated as local development (error reports are not forwarded)
    #[serde(default = "default_local_hosts")]
    pub local_hosts: Vec<String>,

    /// URL of the page being driven, used to resolve relative links
    #[serde(default = "default_page_url")]
    pub page_url: String,
}

fn default_request_timeout_ms() -> u64 {
    timing::REQUEST_TIMEOUT_MS
}

fn default_reload_delay_ms() -> u64 {
    timing::RELOAD_DELAY_MS
}

fn default_announce_duration_ms() -> u64 {
    timing::ANNOUNCE_DURATION_MS
}

fn default_notification_duration_ms() -> u64 {
    timing::NOTIFICATION_DURATION_MS
}

fn default_notification_exit_ms() -> u64 {
    timing::NOTIFICATION_EXIT_MS
}

fn default_focus_delay_ms() -> u64 {
    timing::FOCUS_DELAY_MS
}

fn default_local_hosts() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

fn default_page_url() -> String {
    "http://localhost:5000/".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            reload_delay_ms: default_reload_delay_ms(),
            announce_duration_ms: default_announce_duration_ms(),
            notification_duration_ms: default_notification_duration_ms(),
            notification_exit_ms: default_notification_exit_ms(),
            focus_delay_ms: default_focus_delay_ms(),
            local_hosts: default_local_hosts(),
            page_url: default_page_url(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::config_path())?;
        settings.apply_overrides(|var| std::env::var(var).ok());
        settings.validate_and_clamp();
        Ok(settings)
    }

    /// Load a config file. A missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .context(format!("Failed to read config file {}", path.display()))?;
        let mut settings: Self = serde_json::from_str(&contents)
            .inspect_err(|e| error!(path = %path.display(), error = %e, "Failed to parse config file"))
            .context(format!("Invalid config file {}", path.display()))?;
        settings.validate_and_clamp();
        debug!(path = %path.display(), "loaded config");
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json)
            .context(format!("Failed to write config file to {}", path.display()))?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_ms = |var: &str| -> Option<u64> {
            let raw = lookup(var)?;
            raw.trim()
                .parse::<u64>()
                .inspect_err(|e| error!(var = %var, value = %raw, error = %e, "failed to parse env var"))
                .ok()
        };

        if let Some(ms) = parse_ms("REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = ms;
        }
        if let Some(ms) = parse_ms("RELOAD_DELAY_MS") {
            self.reload_delay_ms = ms;
        }
        if let Some(url) = lookup("PAGE_URL") {
            let url = url.trim();
            if !url.is_empty() {
                self.page_url = url.to_string();
            }
        }
    }

    /// Clamp timings to safe ranges
    pub fn validate_and_clamp(&mut self) {
        use crate::constants::validation::*;

        if self.request_timeout_ms < MIN_REQUEST_TIMEOUT_MS {
            warn!(request_timeout_ms = self.request_timeout_ms, min = MIN_REQUEST_TIMEOUT_MS, "request_timeout_ms below minimum, clamping");
            self.request_timeout_ms = MIN_REQUEST_TIMEOUT_MS;
        } else if self.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
            warn!(request_timeout_ms = self.request_timeout_ms, max = MAX_REQUEST_TIMEOUT_MS, "request_timeout_ms exceeds maximum, clamping");
            self.request_timeout_ms = MAX_REQUEST_TIMEOUT_MS;
        }

        for (name, value) in [
            ("reload_delay_ms", &mut self.reload_delay_ms),
            ("announce_duration_ms", &mut self.announce_duration_ms),
            ("notification_duration_ms", &mut self.notification_duration_ms),
            ("notification_exit_ms", &mut self.notification_exit_ms),
        ] {
            if *value > MAX_DELAY_MS {
                warn!(setting = name, value = *value, max = MAX_DELAY_MS, "delay exceeds maximum, clamping");
                *value = MAX_DELAY_MS;
            }
        }

        if self.focus_delay_ms > MAX_FOCUS_DELAY_MS {
            warn!(focus_delay_ms = self.focus_delay_ms, max = MAX_FOCUS_DELAY_MS, "focus_delay_ms exceeds maximum, clamping");
            self.focus_delay_ms = MAX_FOCUS_DELAY_MS;
        }

        if self.page_url.trim().is_empty() {
            warn!(using = %default_page_url(), "page_url empty, using default");
            self.page_url = default_page_url();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }

    pub fn announce_duration(&self) -> Duration {
        Duration::from_millis(self.announce_duration_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    pub fn notification_exit(&self) -> Duration {
        Duration::from_millis(self.notification_exit_ms)
    }

    pub fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms)
    }
}
