// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error types shared by the store, query and config layers.

use thiserror::Error;

/// Startup configuration problems. These disable data commands but never abort the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{field}` (set {env} or add it to the config file)")]
    Missing { field: &'static str, env: &'static str },
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Failures talking to the data store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("could not decode store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("local store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("change subscription closed")]
    SubscriptionClosed,
}

impl StoreError {
    /// Short message suitable for showing next to an empty table.
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Http(e) if e.is_connect() => {
                "Could not reach the data service. Check your connection and SUPABASE_URL.".into()
            }
            StoreError::Http(_) => "The data service request failed.".into(),
            StoreError::Remote { status: 401 | 403, message } => {
                format!("Access denied by the data service: {}", message)
            }
            StoreError::Remote { message, .. } => message.clone(),
            StoreError::Decode(_) => "The data service returned an unexpected response.".into(),
            other => other.to_string(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
