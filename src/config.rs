// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Spendclip", "spendclip"));

pub const ENV_API_URL: &str = "SPENDCLIP_API_URL";
pub const ENV_USER: &str = "SPENDCLIP_USER";
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform-specific config dir")]
    NoConfigDir,
    #[error("config io at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("no user id configured; pass --user, set SPENDCLIP_USER, or run `spendclip config set --user <id>`")]
    MissingUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub user_id: Option<i64>,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_id: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn require_user(&self) -> Result<i64, ConfigError> {
        self.user_id.ok_or(ConfigError::MissingUser)
    }

    /// Applies environment overrides through `lookup` so callers (and tests)
    /// decide where variables come from.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|s| !s.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_USER).filter(|s| !s.trim().is_empty()) {
            self.user_id = Some(parse_user_id(&raw)?);
        }
        Ok(())
    }

    pub fn apply_overrides(
        &mut self,
        api_url: Option<&str>,
        user: Option<&str>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = api_url {
            self.api_url = url.trim().to_string();
        }
        if let Some(raw) = user {
            self.user_id = Some(parse_user_id(raw)?);
        }
        Ok(())
    }
}

pub fn parse_user_id(raw: &str) -> Result<i64, ConfigError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: "user",
            value: raw.to_string(),
        })
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2).ok_or(ConfigError::NoConfigDir)?;
    Ok(proj.config_dir().join("settings.json"))
}

pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_to(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}

/// File settings with `SPENDCLIP_*` environment variables layered on top.
pub fn load() -> Result<Settings, ConfigError> {
    let path = config_path()?;
    let mut settings = load_from(&path)?;
    settings.apply_env(|k| std::env::var(k).ok())?;
    tracing::debug!(path = %path.display(), api_url = %settings.api_url, "settings loaded");
    Ok(settings)
}
