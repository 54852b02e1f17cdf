// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Configuration: an optional YAML file overlaid by environment variables.
//!
//! ```yaml
//! store:
//!   url: https://xyz.supabase.co
//!   anon_key: ...
//! dashboard:
//!   page_size: 10
//!   poll_interval_secs: 5
//!   realtime: true
//! logging:
//!   level: info
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const URL_VARS: [&str; 2] = ["SUPABASE_URL", "REACT_APP_SUPABASE_URL"];
const ANON_KEY_VARS: [&str; 2] = ["SUPABASE_ANON_KEY", "REACT_APP_SUPABASE_ANON_KEY"];
const SERVICE_KEY_VARS: [&str; 1] = ["SUPABASE_SERVICE_ROLE_KEY"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend endpoint and keys
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Needed only for deleting users
    #[serde(default)]
    pub service_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Rows per page in the transaction listing
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Seconds between polls in `watch`
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Re-fetch on store change notifications
    #[serde(default = "default_true")]
    pub realtime: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            page_size: default_page_size(),
            poll_interval_secs: default_poll_interval(),
            realtime: default_true(),
        }
    }
}

fn default_page_size() -> u32 {
    crate::query::DEFAULT_PAGE_SIZE
}

fn default_poll_interval() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Validated connection settings for the hosted store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub anon_key: String,
    pub service_key: Option<String>,
}

impl Config {
    /// Reads `path` if given (it must exist), otherwise the platform default
    /// if present, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        Self::load_with(path, |k| std::env::var(k).ok())
    }

    /// `load` with an explicit environment lookup.
    pub fn load_with<F>(path: Option<&Path>, get: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: Option<PathBuf> = match path {
            Some(p) => Some(p.to_path_buf()),
            None => crate::db::config_path().ok().filter(|p| p.exists()),
        };
        let mut config = match file {
            Some(p) => Self::from_file(&p)?,
            None => Config::default(),
        };
        config.apply_env_from(get);
        config.validate()?;
        Ok(config)
    }

    /// Never fails: a broken or invalid file is replaced by the defaults,
    /// still overlaid by the environment, and the error is handed back for
    /// reporting.
    pub fn load_or_default<F>(path: Option<&Path>, get: F) -> (Config, Option<ConfigError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        match Self::load_with(path, &get) {
            Ok(config) => (config, None),
            Err(e) => {
                let mut config = Config::default();
                config.apply_env_from(&get);
                (config, Some(e))
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw, &path.display().to_string())
    }

    pub fn from_yaml_str(raw: &str, origin: &str) -> Result<Config, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Yaml {
            path: origin.to_string(),
            source,
        })
    }

    /// Environment values win over the file. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|n| get(n))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };
        if let Some(v) = first(&URL_VARS) {
            self.store.url = Some(v);
        }
        if let Some(v) = first(&ANON_KEY_VARS) {
            self.store.anon_key = Some(v);
        }
        if let Some(v) = first(&SERVICE_KEY_VARS) {
            self.store.service_key = Some(v);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "dashboard.page_size",
                message: "must be at least 1".into(),
            });
        }
        if self.dashboard.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "dashboard.poll_interval_secs",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Endpoint and public key, or the first one that is missing.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        let url = present(&self.store.url).ok_or(ConfigError::Missing {
            field: "store.url",
            env: URL_VARS[0],
        })?;
        let anon_key = present(&self.store.anon_key).ok_or(ConfigError::Missing {
            field: "store.anon_key",
            env: ANON_KEY_VARS[0],
        })?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "store.url",
                message: format!("'{}' is not an http(s) URL", url),
            });
        }
        Ok(Credentials {
            url,
            anon_key,
            service_key: present(&self.store.service_key),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard.poll_interval_secs.max(1))
    }
}
