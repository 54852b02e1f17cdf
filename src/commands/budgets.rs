// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Ctx, json_flags};
use crate::aggregate::{self, BudgetSummary};
use crate::dashboard::fetch_budgets;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;

pub async fn handle(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let Some(store) = ctx.store() else {
        return Ok(());
    };
    let (json_flag, jsonl_flag) = json_flags(sub);
    let summary = match fetch_budgets(store.as_ref()).await {
        Ok(s) => s,
        Err(e) => {
            log::error!("fetching budget data failed: {}", e);
            eprintln!("Error fetching budget data: {}", e.user_message());
            aggregate::budget_summary(&[])
        }
    };
    if !maybe_print_json(json_flag, jsonl_flag, &summary)? {
        println!("{}", render(&summary));
    }
    Ok(())
}

pub fn render(s: &BudgetSummary) -> String {
    let totals = pretty_table(
        &["Total Budget", "Total Spent", "Remaining"],
        vec![vec![
            fmt_money(&s.total_budget),
            fmt_money(&s.total_spent),
            fmt_money(&s.remaining),
        ]],
    );
    if s.rows.is_empty() {
        return format!("{}\nNo budget categories found", totals);
    }
    let by_cat = pretty_table(
        &["Category", "Budget", "Spent", "Remaining"],
        s.rows
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    fmt_money(&r.budget),
                    fmt_money(&r.spent),
                    fmt_money(&r.remaining),
                ]
            })
            .collect(),
    );
    format!("{}\n\nBudget vs Spent by Category\n{}", totals, by_cat)
}
