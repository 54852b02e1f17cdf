// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Moneydesk", "moneydesk"));

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific directories")
}

/// Default location of the offline store used by `--local`.
pub fn local_store_path() -> Result<PathBuf> {
    let proj = project_dirs()?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("moneydesk.sqlite"))
}

/// Default config file; it does not have to exist.
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.yaml"))
}

/// Every table lives in `records`, one JSON document per row.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS records(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        table_name TEXT NOT NULL,
        data TEXT NOT NULL CHECK(json_valid(data))
    );
    CREATE INDEX IF NOT EXISTS idx_records_table ON records(table_name);
    "#,
    )
}
