// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Ctx, json_flags, today_from};
use crate::dashboard::{GoalRow, fetch_goals};
use crate::utils::{fmt_day, fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;

pub async fn handle(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let Some(store) = ctx.store() else {
        return Ok(());
    };
    let (json_flag, jsonl_flag) = json_flags(sub);
    let today = today_from(sub)?;
    let goals = match fetch_goals(store.as_ref(), today).await {
        Ok(g) => g,
        Err(e) => {
            log::error!("fetching goals failed: {}", e);
            eprintln!("Error fetching goals: {}", e.user_message());
            Vec::new()
        }
    };
    if !maybe_print_json(json_flag, jsonl_flag, &goals)? {
        println!("{}", render(&goals));
    }
    Ok(())
}

pub fn days_label(days_left: i64) -> String {
    if days_left < 0 {
        "Overdue".to_string()
    } else {
        format!("{} days left", days_left)
    }
}

pub fn render(goals: &[GoalRow]) -> String {
    if goals.is_empty() {
        return "No goals found".to_string();
    }
    let rows = goals
        .iter()
        .map(|r| {
            let p = &r.progress;
            vec![
                p.goal.name.clone(),
                r.owner.clone().unwrap_or_else(|| "Unknown".into()),
                format!(
                    "{} / {}",
                    fmt_money(&p.goal.current_amount),
                    fmt_money(&p.goal.target_amount)
                ),
                format!("{:.1}%", p.percent),
                p.status.label().to_string(),
                days_label(p.days_left),
                fmt_day(&p.goal.target_date),
            ]
        })
        .collect();
    pretty_table(
        &["Goal", "Owner", "Saved", "Progress", "Status", "Time", "Due"],
        rows,
    )
    .to_string()
}
