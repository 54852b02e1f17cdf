// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Reductions from fetched rows to dashboard metrics and chart series.
//!
//! Everything here is a pure function of its arguments; "today" is passed in
//! so repeated runs over the same rows give identical output.

use crate::models::{BudgetCategory, Goal, GoalStatus, Transaction, TransactionType};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub const TREND_DAYS: usize = 7;
pub const UNCATEGORIZED: &str = "(uncategorized)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    /// `None` for expenses recorded without a category.
    pub category: Option<String>,
    pub value: Decimal,
}

impl CategorySlice {
    pub fn label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesLabel {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: SeriesLabel,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_budget: Decimal,
    pub daily_trend: Vec<DailyPoint>,
    pub category_breakdown: Vec<CategorySlice>,
    pub income_vs_expense: [SeriesPoint; 2],
}

/// Sum of `amount` over rows of one type.
pub fn total_of(transactions: &[Transaction], kind: &TransactionType) -> Decimal {
    transactions
        .iter()
        .filter(|t| &t.r#type == kind)
        .map(|t| t.amount)
        .sum()
}

/// Sum of `budget` over all categories; `spent` plays no part.
pub fn total_budget(categories: &[BudgetCategory]) -> Decimal {
    categories.iter().map(|c| c.budget).sum()
}

/// Seven calendar days ending with `today`, oldest first. Empty days are zero.
pub fn daily_trend(transactions: &[Transaction], today: NaiveDate) -> Vec<DailyPoint> {
    let first = today - Duration::days(TREND_DAYS as i64 - 1);
    let mut points: Vec<DailyPoint> = (0..TREND_DAYS as i64)
        .map(|i| DailyPoint {
            date: first + Duration::days(i),
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        })
        .collect();
    for t in transactions {
        if t.date < first || t.date > today {
            continue;
        }
        let idx = (t.date - first).num_days() as usize;
        match t.r#type {
            TransactionType::Income => points[idx].income += t.amount,
            TransactionType::Expense => points[idx].expense += t.amount,
            _ => {}
        }
    }
    points
}

/// Expense totals per category in order of first appearance.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategorySlice> {
    let mut slices: Vec<CategorySlice> = Vec::new();
    let mut index: HashMap<Option<&str>, usize> = HashMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.r#type == TransactionType::Expense)
    {
        let key = t.category.as_deref();
        match index.get(&key) {
            Some(&i) => slices[i].value += t.amount,
            None => {
                index.insert(key, slices.len());
                slices.push(CategorySlice {
                    category: key.map(str::to_string),
                    value: t.amount,
                });
            }
        }
    }
    slices
}

pub fn summarize(
    transactions: &[Transaction],
    budgets: &[BudgetCategory],
    today: NaiveDate,
) -> DashboardMetrics {
    let total_income = total_of(transactions, &TransactionType::Income);
    let total_expenses = total_of(transactions, &TransactionType::Expense);
    DashboardMetrics {
        total_income,
        total_expenses,
        total_budget: total_budget(budgets),
        daily_trend: daily_trend(transactions, today),
        category_breakdown: category_breakdown(transactions),
        income_vs_expense: [
            SeriesPoint {
                label: SeriesLabel::Income,
                value: total_income,
            },
            SeriesPoint {
                label: SeriesLabel::Expense,
                value: total_expenses,
            },
        ],
    }
}

/// Rows belonging to one user, for per-user views.
pub fn for_user(transactions: &[Transaction], user_id: &str) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.user_id == user_id)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetRow {
    pub name: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub total_budget: Decimal,
    pub total_spent: Decimal,
    pub remaining: Decimal,
    pub rows: Vec<BudgetRow>,
}

pub fn budget_summary(categories: &[BudgetCategory]) -> BudgetSummary {
    let total_budget = total_budget(categories);
    let total_spent: Decimal = categories.iter().map(|c| c.spent).sum();
    BudgetSummary {
        total_budget,
        total_spent,
        remaining: total_budget - total_spent,
        rows: categories
            .iter()
            .map(|c| BudgetRow {
                name: c.name.clone(),
                budget: c.budget,
                spent: c.spent,
                remaining: c.remaining(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal: Goal,
    pub percent: Decimal,
    pub days_left: i64,
    pub overdue: bool,
    pub status: GoalStatus,
}

pub fn goal_progress(goals: &[Goal], today: NaiveDate) -> Vec<GoalProgress> {
    goals
        .iter()
        .map(|g| {
            let days_left = g.days_left(today);
            GoalProgress {
                goal: g.clone(),
                percent: g.progress_percent(),
                days_left,
                overdue: days_left < 0,
                status: g.status(),
            }
        })
        .collect()
}
