// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The data store seam.
//!
//! Everything above this module talks to `&dyn DataStore`; the composition
//! root in `main.rs` decides whether that is the hosted backend or a local file.

pub mod rest;
pub mod sqlite;

use crate::error::{StoreError, StoreResult};
use crate::query::TableQuery;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// One page of raw rows plus the exact match count when it was requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<Value>,
    pub total: Option<u64>,
}

impl Page {
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<Vec<T>> {
        let mut out = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            out.push(T::deserialize(row)?);
        }
        Ok(out)
    }

    pub fn total_or_len(&self) -> u64 {
        self.total.unwrap_or(self.rows.len() as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Detected by polling; the kind of change is not known.
    Unknown,
}

/// "Something changed in `table`". Carries no row data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
}

/// A live change feed for one table.
///
/// Dropping it tears the feed down, whether or not anything was received.
pub struct Subscription {
    table: String,
    rx: mpsc::Receiver<ChangeEvent>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(table: &str, rx: mpsc::Receiver<ChangeEvent>, task: JoinHandle<()>) -> Self {
        Subscription {
            table: table.to_string(),
            rx,
            task,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Waits for the next change. Fails with `SubscriptionClosed` once the
    /// feed has ended, e.g. because the store went away.
    pub async fn next(&mut self) -> StoreResult<ChangeEvent> {
        self.rx.recv().await.ok_or(StoreError::SubscriptionClosed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
        log::debug!("released change subscription on {}", self.table);
    }
}

#[async_trait]
pub trait DataStore: Send + Sync {
    /// Short label used in logs and diagnostics.
    fn name(&self) -> &'static str;

    async fn fetch(&self, query: &TableQuery) -> StoreResult<Page>;

    /// Batched point lookup of `keys` in `key_column`.
    async fn lookup(&self, table: &str, key_column: &str, keys: &[String]) -> StoreResult<Vec<Value>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let q = TableQuery::new(table).is_in(key_column, keys.iter().cloned());
        Ok(self.fetch(&q).await?.rows)
    }

    async fn subscribe(&self, table: &str) -> StoreResult<Subscription>;

    /// Merges `patch` into every row whose `key_column` equals `key`.
    async fn update(&self, table: &str, key_column: &str, key: &str, patch: Value) -> StoreResult<()>;

    async fn delete_user(&self, user_id: &str) -> StoreResult<()>;
}
