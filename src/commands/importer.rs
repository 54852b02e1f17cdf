// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Seeds the local store from JSON exports or transaction CSVs.

use crate::models::TransactionType;
use crate::query::TRANSACTIONS;
use crate::store::SqliteStore;
use crate::utils::{parse_date, parse_decimal};
use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use csv::ReaderBuilder;
use serde_json::{Map, Value, json};
use std::path::Path;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    let path = m
        .get_one::<String>("path")
        .map(|s| s.trim())
        .context("path missing")?;
    let table = m
        .get_one::<String>("table")
        .map(String::as_str)
        .unwrap_or(TRANSACTIONS);
    let (table, n) = import_path(store, table, Path::new(path))?;
    println!("Imported {} rows into {} from {}", n, table, path);
    Ok(())
}

/// `.csv` always targets transactions; anything else is read as a JSON array.
pub fn import_path<'a>(store: &SqliteStore, table: &'a str, path: &Path) -> Result<(&'a str, usize)> {
    let is_csv = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Open CSV {}", path.display()))?;
        let rows = transactions_from_csv(rdr)?;
        Ok((TRANSACTIONS, store.insert_many(TRANSACTIONS, rows)?))
    } else {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Read {}", path.display()))?;
        let rows = rows_from_json(&raw)?;
        Ok((table, store.insert_many(table, rows)?))
    }
}

pub fn rows_from_json(raw: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(raw).context("Invalid JSON")? {
        Value::Array(rows) => Ok(rows),
        _ => bail!("expected a JSON array of rows"),
    }
}

/// Header-driven: `date`, `user_id` and `amount` are required; `id` and
/// `created_at` are generated when absent.
pub fn transactions_from_csv<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Vec<Value>> {
    let headers = rdr.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let date_col = col("date").context("CSV needs a 'date' column")?;
    let user_col = col("user_id").context("CSV needs a 'user_id' column")?;
    let amount_col = col("amount").context("CSV needs an 'amount' column")?;
    let (type_col, cat_col, desc_col) = (col("type"), col("category"), col("description"));
    let (id_col, created_col) = (col("id"), col("created_at"));

    let now = Utc::now();
    let mut out = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let line = i + 2;
        let get = |c: Option<usize>| {
            c.and_then(|c| rec.get(c))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let date_raw = get(Some(date_col)).ok_or_else(|| anyhow!("line {}: date missing", line))?;
        let date = parse_date(&date_raw).with_context(|| format!("line {}", line))?;
        let amount_raw = get(Some(amount_col)).ok_or_else(|| anyhow!("line {}: amount missing", line))?;
        let amount = parse_decimal(&amount_raw).with_context(|| format!("line {}", line))?;
        let user_id = get(Some(user_col)).ok_or_else(|| anyhow!("line {}: user_id missing", line))?;
        let kind = get(type_col)
            .map(TransactionType::from)
            .unwrap_or(TransactionType::Expense);

        let mut row = Map::new();
        row.insert(
            "id".into(),
            json!(get(id_col).unwrap_or_else(|| format!("imp-{}-{}", now.timestamp_millis(), i + 1))),
        );
        row.insert("user_id".into(), json!(user_id));
        row.insert("date".into(), json!(date.to_string()));
        row.insert("amount".into(), json!(amount.to_string()));
        row.insert("type".into(), json!(kind.as_str()));
        row.insert("category".into(), json!(get(cat_col)));
        row.insert("description".into(), json!(get(desc_col)));
        row.insert(
            "created_at".into(),
            json!(get(created_col).unwrap_or_else(|| now.to_rfc3339())),
        );
        out.push(Value::Object(row));
    }
    Ok(out)
}
