// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Ctx;
use crate::dashboard::count;
use crate::query::TRANSACTIONS;
use crate::utils::pretty_table;
use anyhow::Result;

const OK: &str = "ok";
const WARN: &str = "warn";
const FAIL: &str = "FAIL";

pub async fn handle(ctx: &Ctx) -> Result<()> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut check = |name: &str, status: &str, detail: String| {
        rows.push(vec![name.to_string(), status.to_string(), detail]);
    };

    let local = ctx.store().is_some_and(|s| s.name() == "local");
    if local {
        check("credentials", OK, "not needed for the local store".into());
    } else {
        match ctx.config.credentials() {
            Ok(c) => {
                check("credentials", OK, c.url.clone());
                if c.service_key.is_some() {
                    check("service key", OK, "user deletion enabled".into());
                } else {
                    check("service key", WARN, "not set; user deletion will be refused".into());
                }
            }
            Err(e) => check("credentials", FAIL, e.to_string()),
        }
    }

    match ctx.store() {
        None => {
            let detail = ctx.store_error().unwrap_or("store unavailable").to_string();
            check("store", FAIL, detail);
        }
        Some(store) => {
            match count(store.as_ref(), TRANSACTIONS).await {
                Ok(n) => check("store", OK, format!("{}: {} transactions", store.name(), n)),
                Err(e) => {
                    log::error!("doctor: store check failed: {}", e);
                    check("store", FAIL, e.user_message());
                }
            }
            match store.subscribe(TRANSACTIONS).await {
                Ok(sub) => check("change feed", OK, format!("subscribed to {}", sub.table())),
                Err(e) => check("change feed", WARN, e.user_message()),
            }
        }
    }

    let failed = rows.iter().any(|r| r[1] == FAIL);
    println!("{}", pretty_table(&["Check", "Status", "Detail"], rows));
    if failed {
        println!("doctor: problems found");
    } else {
        println!("doctor: no issues found");
    }
    Ok(())
}
