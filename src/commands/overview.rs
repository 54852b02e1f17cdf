// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Ctx, json_flags, today_from};
use crate::aggregate::{self, SeriesLabel};
use crate::dashboard::{Overview, OverviewCounts, fetch_overview};
use crate::store::DataStore;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;

pub async fn handle(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let Some(store) = ctx.store() else {
        return Ok(());
    };
    let (json_flag, jsonl_flag) = json_flags(sub);
    let today = today_from(sub)?;
    let user = sub.get_one::<String>("user").map(|s| s.trim().to_string());
    let overview = load(store.as_ref(), today, user.as_deref()).await;
    if !maybe_print_json(json_flag, jsonl_flag, &overview)? {
        println!("{}", render(&overview));
    }
    Ok(())
}

/// Fetch failures are printed and turn into an all-zero overview.
pub async fn load(store: &dyn DataStore, today: NaiveDate, user: Option<&str>) -> Overview {
    match fetch_overview(store, today, user).await {
        Ok(o) => o,
        Err(e) => {
            log::error!("fetching analytics failed: {}", e);
            eprintln!("Error fetching analytics: {}", e.user_message());
            empty(today)
        }
    }
}

pub fn empty(today: NaiveDate) -> Overview {
    Overview {
        counts: OverviewCounts::default(),
        metrics: aggregate::summarize(&[], &[], today),
    }
}

pub fn render(o: &Overview) -> String {
    let m = &o.metrics;
    let cards = pretty_table(
        &["Metric", "Value"],
        vec![
            vec!["Total Users".into(), o.counts.users.to_string()],
            vec!["Total Transactions".into(), o.counts.transactions.to_string()],
            vec!["Total Income".into(), fmt_money(&m.total_income)],
            vec!["Total Expenses".into(), fmt_money(&m.total_expenses)],
            vec!["Total Budget".into(), fmt_money(&m.total_budget)],
            vec!["Active Goals".into(), o.counts.goals.to_string()],
        ],
    );

    let trend = pretty_table(
        &["Day", "Income", "Expenses"],
        m.daily_trend
            .iter()
            .map(|p| {
                vec![
                    p.date.format("%b %d").to_string(),
                    fmt_money(&p.income),
                    fmt_money(&p.expense),
                ]
            })
            .collect(),
    );

    let split = pretty_table(
        &["", "Amount"],
        m.income_vs_expense
            .iter()
            .map(|p| {
                let label = match p.label {
                    SeriesLabel::Income => "Income",
                    SeriesLabel::Expense => "Expenses",
                };
                vec![label.to_string(), fmt_money(&p.value)]
            })
            .collect(),
    );

    let mut out = format!(
        "{}\n\n7-Day Transaction Trend\n{}\n\nIncome vs Expenses\n{}",
        cards, trend, split
    );
    if !m.category_breakdown.is_empty() {
        let cats = pretty_table(
            &["Category", "Spent"],
            m.category_breakdown
                .iter()
                .map(|c| vec![c.label().to_string(), fmt_money(&c.value)])
                .collect(),
        );
        out.push_str(&format!("\n\nExpense by Category\n{}", cats));
    }
    out
}
