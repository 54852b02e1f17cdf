// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Ctx, json_flags};
use crate::dashboard::{TransactionPage, fetch_transaction_page};
use crate::query::{SortField, TransactionQuery, TypeFilter};
use crate::utils::{fmt_day, fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;

pub async fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("list", sub)) = m.subcommand() {
        list(ctx, sub).await?;
    }
    Ok(())
}

async fn list(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let Some(store) = ctx.store() else {
        return Ok(());
    };
    let (json_flag, jsonl_flag) = json_flags(sub);
    let q = query_from_matches(sub, ctx.config.dashboard.page_size)?;
    let page = load_page(store.as_ref(), &q).await;
    if !maybe_print_json(json_flag, jsonl_flag, &page.rows)? {
        println!("{}", render_page(&page));
    }
    Ok(())
}

/// Fetch failures are printed and turn into an empty page.
pub async fn load_page(store: &dyn crate::store::DataStore, q: &TransactionQuery) -> TransactionPage {
    match fetch_transaction_page(store, q).await {
        Ok(page) => page,
        Err(e) => {
            log::error!("fetching transactions failed: {}", e);
            eprintln!("Error fetching transactions: {}", e.user_message());
            TransactionPage::empty(q)
        }
    }
}

pub fn query_from_matches(sub: &clap::ArgMatches, default_page_size: u32) -> Result<TransactionQuery> {
    let get = |name: &str| sub.try_get_one::<String>(name).ok().flatten().cloned();
    let type_filter: TypeFilter = get("type").as_deref().unwrap_or("all").parse()?;
    let sort: SortField = get("sort").as_deref().unwrap_or("created_at").parse()?;
    let page = sub.try_get_one::<u32>("page").ok().flatten().copied().unwrap_or(1);
    let page_size = sub
        .try_get_one::<u32>("page-size")
        .ok()
        .flatten()
        .copied()
        .unwrap_or(default_page_size);
    let asc = sub.try_get_one::<bool>("asc").ok().flatten().copied().unwrap_or(false);
    Ok(TransactionQuery {
        search: get("search").unwrap_or_default(),
        type_filter,
        page,
        page_size,
        sort,
        descending: !asc,
    })
}

pub fn render_page(page: &TransactionPage) -> String {
    let rows: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|r| {
            let t = &r.transaction;
            vec![
                fmt_day(&t.date),
                r.user_label().to_string(),
                t.description
                    .clone()
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "No description".into()),
                t.r#type.to_string(),
                fmt_money(&t.amount),
            ]
        })
        .collect();
    let mut out = String::new();
    if rows.is_empty() {
        out.push_str("No transactions found\n");
    } else {
        out.push_str(
            &pretty_table(&["Date", "User", "Description", "Type", "Amount"], rows).to_string(),
        );
        out.push('\n');
    }
    if let Some((from, to)) = page.showing() {
        out.push_str(&format!(
            "Showing {} to {} of {} transactions (page {} of {})",
            from,
            to,
            page.total_count,
            page.page,
            page.total_pages()
        ));
    }
    out
}
