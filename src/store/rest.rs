// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Hosted backend: PostgREST for tables, GoTrue admin for user deletion.

use super::{ChangeEvent, ChangeKind, DataStore, Page, Subscription};
use crate::config::Credentials;
use crate::error::{StoreError, StoreResult};
use crate::query::{Filter, TableQuery};
use crate::utils::http_client;
use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{RequestBuilder, Response, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct Inner {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: Option<String>,
}

pub struct RestStore {
    inner: Arc<Inner>,
    poll_interval: Duration,
}

impl RestStore {
    pub fn new(creds: &Credentials, poll_interval: Duration) -> StoreResult<Self> {
        Ok(RestStore {
            inner: Arc::new(Inner {
                client: http_client()?,
                base_url: creds.url.trim_end_matches('/').to_string(),
                anon_key: creds.anon_key.clone(),
                service_key: creds.service_key.clone(),
            }),
            poll_interval,
        })
    }
}

impl Inner {
    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, rb: RequestBuilder, key: &str) -> RequestBuilder {
        rb.header("apikey", key).bearer_auth(key)
    }

    /// Mutations go out with the service key when one is configured.
    fn write_key(&self) -> &str {
        self.service_key.as_deref().unwrap_or(&self.anon_key)
    }

    async fn fetch(&self, q: &TableQuery) -> StoreResult<Page> {
        q.validate()?;
        let mut rb = self
            .client
            .get(self.table_url(&q.table))
            .query(&query_params(q));
        rb = self.authed(rb, &self.anon_key);
        if q.count {
            rb = rb.header("Prefer", "count=exact");
        }
        let resp = check(rb.send().await?).await?;
        let total = if q.count {
            resp.headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_range)
        } else {
            None
        };
        let body = resp.bytes().await?;
        let rows: Vec<Value> = serde_json::from_slice(&body)?;
        log::debug!(
            "fetched {} rows from {} (total {:?})",
            rows.len(),
            q.table,
            total
        );
        Ok(Page { rows, total })
    }

    /// Row count plus the newest row, compared between polls.
    async fn fingerprint(&self, table: &str) -> StoreResult<(Option<u64>, String)> {
        let q = TableQuery::new(table)
            .order("created_at", true)
            .range(0, 1)
            .with_count();
        let page = self.fetch(&q).await?;
        let newest = page.rows.first().map(Value::to_string).unwrap_or_default();
        Ok((page.total, newest))
    }
}

async fn check(resp: Response) -> StoreResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });
    if status.as_u16() == 404 {
        return Err(StoreError::NotFound(message));
    }
    Err(StoreError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// Renders a query as PostgREST URL parameters.
pub fn query_params(q: &TableQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for f in &q.filters {
        match f {
            Filter::Eq { column, value } => params.push((column.clone(), format!("eq.{}", value))),
            Filter::In { column, values } => {
                let list: Vec<String> = values.iter().map(|v| quote_value(v)).collect();
                params.push((column.clone(), format!("in.({})", list.join(","))));
            }
        }
    }
    if let Some(s) = &q.search {
        let pattern = quote_value(&format!("*{}*", escape_like(&s.term)));
        let parts: Vec<String> = s
            .columns
            .iter()
            .map(|c| format!("{}.ilike.{}", c, pattern))
            .collect();
        params.push(("or".to_string(), format!("({})", parts.join(","))));
    }
    if let Some(o) = &q.order {
        let dir = if o.descending { "desc" } else { "asc" };
        params.push(("order".to_string(), format!("{}.{}", o.column, dir)));
    }
    if let Some(offset) = q.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    if let Some(limit) = q.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

/// Values inside `in.(...)` and `or=(...)` must be double-quoted when they
/// contain PostgREST's reserved characters.
fn quote_value(v: &str) -> String {
    if v.chars().any(|c| matches!(c, ',' | '.' | ':' | '(' | ')' | '"' | '\\' | ' ')) {
        let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        v.to_string()
    }
}

/// PostgREST reads `*` as `%`, and there is no escape for it, so a literal
/// `*` is narrowed to a one-character wildcard.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
        .replace('*', "_")
}

/// Admin endpoint for one user. The id is pushed as a single path segment,
/// so `/`, `?` and the like are percent-encoded instead of changing the route.
pub fn admin_user_url(base: &str, user_id: &str) -> StoreResult<Url> {
    let bad = |what: &str| StoreError::InvalidQuery(format!("cannot build admin URL from {}", what));
    let mut url = Url::parse(&format!("{}/auth/v1/admin/users", base.trim_end_matches('/')))
        .map_err(|_| bad(base))?;
    url.path_segments_mut()
        .map_err(|_| bad(base))?
        .push(user_id);
    Ok(url)
}

/// Total from a `Content-Range` header such as `0-9/25` or `*/0`.
pub fn parse_content_range(h: &str) -> Option<u64> {
    let (_, total) = h.trim().split_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl DataStore for RestStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn fetch(&self, query: &TableQuery) -> StoreResult<Page> {
        self.inner.fetch(query).await
    }

    async fn subscribe(&self, table: &str) -> StoreResult<Subscription> {
        let inner = Arc::clone(&self.inner);
        let (tx, rx) = mpsc::channel(16);
        let period = self.poll_interval;
        let name = table.to_string();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last = None;
            loop {
                ticker.tick().await;
                match inner.fingerprint(&name).await {
                    Ok(fp) => {
                        let changed = last.as_ref().is_some_and(|prev| prev != &fp);
                        last = Some(fp);
                        if changed {
                            let ev = ChangeEvent {
                                table: name.clone(),
                                kind: ChangeKind::Unknown,
                            };
                            if tx.send(ev).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => log::warn!("change poll on {} failed: {}", name, e),
                }
            }
        });
        log::info!(
            "watching {} for changes every {:?}",
            table,
            self.poll_interval
        );
        Ok(Subscription::new(table, rx, task))
    }

    async fn update(&self, table: &str, key_column: &str, key: &str, patch: Value) -> StoreResult<()> {
        let q = TableQuery::new(table).eq(key_column, key);
        q.validate()?;
        let inner = &self.inner;
        let rb = inner
            .client
            .patch(inner.table_url(table))
            .query(&query_params(&q)[1..])
            .header("Prefer", "return=representation")
            .json(&patch);
        let resp = check(inner.authed(rb, inner.write_key()).send().await?).await?;
        let body = resp.bytes().await?;
        let rows: Vec<Value> = serde_json::from_slice(&body)?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(format!(
                "no {} row with {} = {}",
                table, key_column, key
            )));
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<()> {
        let inner = &self.inner;
        let key = inner.service_key.as_deref().ok_or_else(|| {
            StoreError::Unauthorized(
                "deleting users needs SUPABASE_SERVICE_ROLE_KEY (admin privileges)".into(),
            )
        })?;
        let url = admin_user_url(&inner.base_url, user_id)?;
        check(inner.authed(inner.client.delete(url), key).send().await?).await?;
        Ok(())
    }
}
