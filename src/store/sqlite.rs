// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Offline store: the hosted tables mirrored into one SQLite file.

use super::{ChangeEvent, ChangeKind, DataStore, Page, Subscription};
use crate::db;
use crate::error::{StoreError, StoreResult};
use crate::query::{Filter, PROFILES, TableQuery};
use async_trait::async_trait;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, params, params_from_iter};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::{broadcast, mpsc};

pub struct SqliteStore {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::from_conn(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_conn(Connection::open_in_memory()?)
    }

    fn from_conn(conn: Connection) -> StoreResult<Self> {
        db::init_schema(&conn)?;
        register_fold(&conn)?;
        let (changes, _) = broadcast::channel(64);
        Ok(SqliteStore {
            conn: Mutex::new(conn),
            changes,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, table: &str, kind: ChangeKind) {
        // No receivers is fine.
        let _ = self.changes.send(ChangeEvent {
            table: table.to_string(),
            kind,
        });
    }

    pub fn insert(&self, table: &str, row: Value) -> StoreResult<()> {
        self.insert_many(table, vec![row]).map(|_| ())
    }

    /// Inserts all rows in one transaction and emits a single change event.
    pub fn insert_many(&self, table: &str, rows: Vec<Value>) -> StoreResult<usize> {
        TableQuery::new(table).validate()?;
        let n = {
            let mut conn = self.lock();
            let tx = conn.transaction()?;
            for row in &rows {
                if !row.is_object() {
                    return Err(StoreError::InvalidQuery(format!(
                        "rows for {} must be JSON objects",
                        table
                    )));
                }
                tx.execute(
                    "INSERT INTO records(table_name, data) VALUES (?1, ?2)",
                    params![table, row.to_string()],
                )?;
            }
            tx.commit()?;
            rows.len()
        };
        if n > 0 {
            self.notify(table, ChangeKind::Insert);
        }
        Ok(n)
    }

    fn fetch_sync(&self, q: &TableQuery) -> StoreResult<Page> {
        q.validate()?;
        let (where_sql, args) = where_clause(q);
        let conn = self.lock();

        let total = if q.count {
            let sql = format!("SELECT COUNT(*) FROM records WHERE {}", where_sql);
            let n: i64 = conn.query_row(&sql, params_from_iter(args.iter()), |r| r.get(0))?;
            Some(n as u64)
        } else {
            None
        };

        let mut rows = Vec::new();
        if q.limit != Some(0) {
            let sql = format!(
                "SELECT data FROM records WHERE {}{}{}",
                where_sql,
                order_clause(q),
                limit_clause(q)
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut cur = stmt.query(params_from_iter(args.iter()))?;
            while let Some(r) = cur.next()? {
                let data: String = r.get(0)?;
                rows.push(serde_json::from_str(&data)?);
            }
        }
        log::debug!(
            "local fetch from {}: {} rows (total {:?})",
            q.table,
            rows.len(),
            total
        );
        Ok(Page { rows, total })
    }

    fn update_sync(&self, table: &str, key_column: &str, key: &str, patch: &Value) -> StoreResult<usize> {
        TableQuery::new(table).eq(key_column, key).validate()?;
        if !patch.is_object() {
            return Err(StoreError::InvalidQuery("patch must be a JSON object".into()));
        }
        let sql = format!(
            "UPDATE records SET data = json_patch(data, ?1)
             WHERE table_name = ?2 AND CAST(json_extract(data, '$.{}') AS TEXT) = ?3",
            key_column
        );
        let n = self
            .lock()
            .execute(&sql, params![patch.to_string(), table, key])?;
        Ok(n)
    }
}

/// `fold(x)`: Unicode lowercase of any scalar, `''` for NULL. SQLite's own
/// `LOWER()` only folds ASCII, and search terms are folded with `str::to_lowercase`.
fn register_fold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let folded = match ctx.get_raw(0) {
                ValueRef::Null => String::new(),
                ValueRef::Integer(i) => i.to_string(),
                ValueRef::Real(f) => f.to_string(),
                ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).to_lowercase(),
            };
            Ok(folded)
        },
    )
}

fn json_path(column: &str) -> String {
    format!("json_extract(data, '$.{}')", column)
}

/// Builds the WHERE body and its positional arguments. Columns are validated
/// identifiers, so they are inlined into the JSON path.
pub fn where_clause(q: &TableQuery) -> (String, Vec<String>) {
    let mut clauses = vec!["table_name = ?".to_string()];
    let mut args = vec![q.table.clone()];
    for f in &q.filters {
        match f {
            Filter::Eq { column, value } => {
                clauses.push(format!("CAST({} AS TEXT) = ?", json_path(column)));
                args.push(value.clone());
            }
            Filter::In { values, .. } if values.is_empty() => clauses.push("0".to_string()),
            Filter::In { column, values } => {
                let marks = vec!["?"; values.len()].join(", ");
                clauses.push(format!("CAST({} AS TEXT) IN ({})", json_path(column), marks));
                args.extend(values.iter().cloned());
            }
        }
    }
    if let Some(s) = &q.search {
        let pattern = format!("%{}%", escape_like(&s.term.to_lowercase()));
        let ors: Vec<String> = s
            .columns
            .iter()
            .map(|c| format!("fold({}) LIKE ? ESCAPE '\\'", json_path(c)))
            .collect();
        clauses.push(format!("({})", ors.join(" OR ")));
        args.extend(std::iter::repeat_n(pattern, s.columns.len()));
    }
    (clauses.join(" AND "), args)
}

fn order_clause(q: &TableQuery) -> String {
    match &q.order {
        Some(o) => {
            let dir = if o.descending { "DESC" } else { "ASC" };
            let expr = if o.numeric {
                format!("CAST({} AS REAL)", json_path(&o.column))
            } else {
                json_path(&o.column)
            };
            format!(" ORDER BY {} {}, id {}", expr, dir, dir)
        }
        None => " ORDER BY id ASC".to_string(),
    }
}

fn limit_clause(q: &TableQuery) -> String {
    match (q.limit, q.offset) {
        (Some(l), Some(o)) => format!(" LIMIT {} OFFSET {}", l, o),
        (Some(l), None) => format!(" LIMIT {}", l),
        (None, Some(o)) => format!(" LIMIT -1 OFFSET {}", o),
        (None, None) => String::new(),
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl DataStore for SqliteStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, query: &TableQuery) -> StoreResult<Page> {
        self.fetch_sync(query)
    }

    async fn subscribe(&self, table: &str) -> StoreResult<Subscription> {
        let mut changes = self.changes.subscribe();
        let (tx, rx) = mpsc::channel(16);
        let name = table.to_string();
        let task = tokio::spawn(async move {
            loop {
                let ev = match changes.recv().await {
                    Ok(ev) if ev.table == name => ev,
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::debug!("change feed on {} lagged by {}", name, skipped);
                        ChangeEvent {
                            table: name.clone(),
                            kind: ChangeKind::Unknown,
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if tx.send(ev).await.is_err() {
                    break;
                }
            }
        });
        Ok(Subscription::new(table, rx, task))
    }

    async fn update(&self, table: &str, key_column: &str, key: &str, patch: Value) -> StoreResult<()> {
        let n = self.update_sync(table, key_column, key, &patch)?;
        if n == 0 {
            return Err(StoreError::NotFound(format!(
                "no {} row with {} = {}",
                table, key_column, key
            )));
        }
        self.notify(table, ChangeKind::Update);
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<()> {
        let sql = format!(
            "DELETE FROM records WHERE table_name = ?1 AND CAST({} AS TEXT) = ?2",
            json_path("user_id")
        );
        let n = self.lock().execute(&sql, params![PROFILES, user_id])?;
        if n == 0 {
            return Err(StoreError::NotFound(format!("user {}", user_id)));
        }
        self.notify(PROFILES, ChangeKind::Delete);
        Ok(())
    }
}
