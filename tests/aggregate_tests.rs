// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, TimeZone, Utc};
use moneydesk::aggregate::{self, SeriesLabel, UNCATEGORIZED};
use moneydesk::models::{BudgetCategory, Goal, GoalStatus, Transaction, TransactionType};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn tx(date: &str, amount: &str, kind: TransactionType, category: Option<&str>) -> Transaction {
    Transaction {
        id: format!("{}-{}", date, amount),
        user_id: "u1".into(),
        date: day(date),
        amount: dec(amount),
        r#type: kind,
        category: category.map(str::to_string),
        description: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn goal(current: &str, target: &str, due: &str) -> Goal {
    Goal {
        id: "g1".into(),
        user_id: "u1".into(),
        name: "Goal".into(),
        current_amount: dec(current),
        target_amount: dec(target),
        target_date: day(due),
    }
}

fn sample() -> Vec<Transaction> {
    vec![
        tx("2025-03-10", "1000", TransactionType::Income, Some("Salary")),
        tx("2025-03-10", "12.50", TransactionType::Expense, Some("Food")),
        tx("2025-03-08", "40", TransactionType::Expense, None),
        tx("2025-03-05", "7.50", TransactionType::Expense, Some("Food")),
        tx("2025-03-01", "99", TransactionType::Expense, Some("Rent")),
        tx("2025-03-09", "20", TransactionType::Transfer, Some("Savings")),
    ]
}

#[test]
fn totals_by_type() {
    let txs = sample();
    assert_eq!(aggregate::total_of(&txs, &TransactionType::Income), dec("1000"));
    assert_eq!(aggregate::total_of(&txs, &TransactionType::Expense), dec("159"));
    assert_eq!(aggregate::total_of(&[], &TransactionType::Expense), Decimal::ZERO);
}

#[test]
fn trend_covers_seven_days_oldest_first() {
    let trend = aggregate::daily_trend(&sample(), day("2025-03-10"));
    assert_eq!(trend.len(), 7);
    assert_eq!(trend[0].date, day("2025-03-04"));
    assert_eq!(trend[6].date, day("2025-03-10"));
    assert_eq!(trend[6].income, dec("1000"));
    assert_eq!(trend[6].expense, dec("12.50"));
    assert_eq!(trend[1].expense, dec("7.50"));
    assert_eq!(trend[4].expense, dec("40"));
    // transfers count toward neither series
    assert_eq!(trend[5].income, Decimal::ZERO);
    assert_eq!(trend[5].expense, Decimal::ZERO);
}

#[test]
fn trend_with_no_data_is_all_zero() {
    let trend = aggregate::daily_trend(&[], day("2025-03-10"));
    assert_eq!(trend.len(), 7);
    assert!(trend.iter().all(|p| p.income.is_zero() && p.expense.is_zero()));
}

#[test]
fn breakdown_keeps_uncategorized_and_first_seen_order() {
    let slices = aggregate::category_breakdown(&sample());
    let labels: Vec<&str> = slices.iter().map(|s| s.label()).collect();
    assert_eq!(labels, vec!["Food", UNCATEGORIZED, "Rent"]);
    assert_eq!(slices[0].value, dec("20"));
    assert_eq!(slices[1].category, None);
    let sum: Decimal = slices.iter().map(|s| s.value).sum();
    assert_eq!(sum, aggregate::total_of(&sample(), &TransactionType::Expense));
}

#[test]
fn summary_is_stable_across_calls() {
    let txs = sample();
    let budgets = vec![BudgetCategory {
        name: "Food".into(),
        budget: dec("300"),
        spent: dec("20"),
    }];
    let a = aggregate::summarize(&txs, &budgets, day("2025-03-10"));
    let b = aggregate::summarize(&txs, &budgets, day("2025-03-10"));
    assert_eq!(a, b);
    assert_eq!(a.total_budget, dec("300"));
    assert_eq!(a.income_vs_expense[0].label, SeriesLabel::Income);
    assert_eq!(a.income_vs_expense[0].value, dec("1000"));
    assert_eq!(a.income_vs_expense[1].label, SeriesLabel::Expense);
    assert_eq!(a.income_vs_expense[1].value, dec("159"));
}

#[test]
fn unrecognized_types_stay_out_of_every_series() {
    let mut txs = sample();
    let refund = TransactionType::from("refund".to_string());
    assert_eq!(refund, TransactionType::Other("refund".into()));
    txs.push(tx("2025-03-10", "500", refund.clone(), Some("Food")));
    txs.push(tx("2025-03-07", "30", refund, Some("Books")));

    let m = aggregate::summarize(&txs, &[], day("2025-03-10"));
    assert_eq!(m.total_income, dec("1000"));
    assert_eq!(m.total_expenses, dec("159"));
    assert_eq!(m.daily_trend[6].income, dec("1000"));
    assert_eq!(m.daily_trend[6].expense, dec("12.50"));
    assert_eq!(m.daily_trend[3].expense, Decimal::ZERO);
    let labels: Vec<&str> = m.category_breakdown.iter().map(|s| s.label()).collect();
    assert_eq!(labels, vec!["Food", UNCATEGORIZED, "Rent"]);
    assert_eq!(m.category_breakdown[0].value, dec("20"));
}

#[test]
fn budget_summary_allows_overspend() {
    let cats = vec![
        BudgetCategory {
            name: "Food".into(),
            budget: dec("500"),
            spent: dec("300"),
        },
        BudgetCategory {
            name: "Rent".into(),
            budget: dec("200"),
            spent: dec("250"),
        },
    ];
    let s = aggregate::budget_summary(&cats);
    assert_eq!(s.total_budget, dec("700"));
    assert_eq!(s.total_spent, dec("550"));
    assert_eq!(s.remaining, dec("150"));
    assert_eq!(s.rows[0].remaining, dec("200"));
    assert_eq!(s.rows[1].remaining, dec("-50"));
}

#[test]
fn goal_progress_is_capped() {
    assert_eq!(goal("1500", "1000", "2025-12-31").progress_percent(), dec("100"));
    assert_eq!(goal("250", "1000", "2025-12-31").progress_percent(), dec("25"));
    assert_eq!(goal("5", "0", "2025-12-31").progress_percent(), dec("100"));
    assert_eq!(goal("0", "0", "2025-12-31").progress_percent(), Decimal::ZERO);
}

#[test]
fn goal_status_tiers() {
    assert_eq!(goal("750", "1000", "2025-12-31").status(), GoalStatus::OnTrack);
    assert_eq!(goal("500", "1000", "2025-12-31").status(), GoalStatus::Progressing);
    assert_eq!(goal("250", "1000", "2025-12-31").status(), GoalStatus::Behind);
    assert_eq!(goal("249", "1000", "2025-12-31").status(), GoalStatus::AtRisk);
}

#[test]
fn goal_deadlines() {
    let today = day("2025-03-10");
    let rows = aggregate::goal_progress(
        &[goal("10", "100", "2025-03-20"), goal("10", "100", "2025-03-01")],
        today,
    );
    assert_eq!(rows[0].days_left, 10);
    assert!(!rows[0].overdue);
    assert_eq!(rows[1].days_left, -9);
    assert!(rows[1].overdue);
}

#[test]
fn per_user_filter() {
    let mut txs = sample();
    txs[0].user_id = "u2".into();
    let mine = aggregate::for_user(&txs, "u1");
    assert_eq!(mine.len(), 5);
    assert_eq!(aggregate::total_of(&mine, &TransactionType::Income), Decimal::ZERO);
}
