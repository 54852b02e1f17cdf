// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! View-model loaders: run the queries each screen needs, join profiles onto
//! rows and hand the result to the aggregator.

use crate::aggregate::{self, BudgetSummary, DashboardMetrics, GoalProgress};
use crate::error::StoreResult;
use crate::models::{BudgetCategory, Goal, Profile, Transaction};
use crate::query::{
    self, GOALS, PROFILES, TRANSACTIONS, TableQuery, TransactionQuery, UserQuery,
};
use crate::store::{DataStore, Page};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::{HashMap, HashSet};

/// Rows per request when walking a whole table.
pub const FETCH_BATCH: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// `None` when the owner has no profile or the lookup failed.
    pub profile: Option<Profile>,
}

impl TransactionRow {
    pub fn user_label(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionPage {
    pub rows: Vec<TransactionRow>,
    /// Matching rows before pagination.
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl TransactionPage {
    pub fn empty(q: &TransactionQuery) -> Self {
        TransactionPage {
            rows: Vec::new(),
            total_count: 0,
            page: q.page,
            page_size: q.page_size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        query::total_pages(self.total_count, self.page_size)
    }

    /// 1-based inclusive range of rows on this page, for "Showing x to y of n".
    pub fn showing(&self) -> Option<(u64, u64)> {
        if self.rows.is_empty() {
            return None;
        }
        let from = u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size) + 1;
        Some((from, from + self.rows.len() as u64 - 1))
    }
}

/// One filtered, sorted page of transactions with owner profiles attached.
pub async fn fetch_transaction_page(
    store: &dyn DataStore,
    q: &TransactionQuery,
) -> StoreResult<TransactionPage> {
    let page = store.fetch(&q.to_table_query()?).await?;
    let transactions: Vec<Transaction> = page.decode()?;
    let profiles = resolve_profiles(store, &distinct_user_ids(&transactions)).await;
    let rows = transactions
        .into_iter()
        .map(|t| {
            let profile = profiles.get(&t.user_id).cloned();
            TransactionRow {
                transaction: t,
                profile,
            }
        })
        .collect();
    Ok(TransactionPage {
        rows,
        total_count: page.total_or_len(),
        page: q.page,
        page_size: q.page_size,
    })
}

/// Owner ids in order of first appearance, without repeats.
pub fn distinct_user_ids(transactions: &[Transaction]) -> Vec<String> {
    let mut seen = HashSet::new();
    transactions
        .iter()
        .filter(|t| seen.insert(t.user_id.as_str()))
        .map(|t| t.user_id.clone())
        .collect()
}

/// One batched lookup of `user_id -> Profile`.
///
/// Never fails: a broken lookup or an unreadable profile row just leaves the
/// affected ids unmapped.
pub async fn resolve_profiles(store: &dyn DataStore, user_ids: &[String]) -> HashMap<String, Profile> {
    let mut out = HashMap::new();
    if user_ids.is_empty() {
        return out;
    }
    let rows = match store.lookup(PROFILES, "user_id", user_ids).await {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("profile lookup failed, showing rows without owners: {}", e);
            return out;
        }
    };
    for row in rows {
        match serde_json::from_value::<Profile>(row) {
            Ok(p) => {
                out.insert(p.user_id.clone(), p);
            }
            Err(e) => log::warn!("skipping unreadable profile row: {}", e),
        }
    }
    out
}

/// Walks a query in `FETCH_BATCH` slices until the reported total is
/// reached. A server may cap pages below the requested size, so a short page
/// only ends the walk when it is empty or no total came back.
pub async fn fetch_all<T: DeserializeOwned>(store: &dyn DataStore, q: TableQuery) -> StoreResult<Vec<T>> {
    let q = q.with_count();
    let mut out = Vec::new();
    let mut offset = 0;
    loop {
        let page: Page = store.fetch(&q.clone().range(offset, FETCH_BATCH)).await?;
        let n = page.rows.len() as u64;
        out.extend(page.decode::<T>()?);
        offset += n;
        let done = match page.total {
            Some(total) => n == 0 || offset >= total,
            None => n < FETCH_BATCH,
        };
        if done {
            break;
        }
    }
    Ok(out)
}

pub async fn count(store: &dyn DataStore, table: &str) -> StoreResult<u64> {
    let page = store.fetch(&TableQuery::new(table).count_only()).await?;
    Ok(page.total_or_len())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverviewCounts {
    pub users: u64,
    pub transactions: u64,
    pub goals: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub counts: OverviewCounts,
    pub metrics: DashboardMetrics,
}

/// Cards and chart series for the overview screen, optionally for one user.
pub async fn fetch_overview(
    store: &dyn DataStore,
    today: NaiveDate,
    user_id: Option<&str>,
) -> StoreResult<Overview> {
    let mut transactions: Vec<Transaction> =
        fetch_all(store, TableQuery::new(TRANSACTIONS).order("created_at", true)).await?;
    if let Some(uid) = user_id {
        transactions = aggregate::for_user(&transactions, uid);
    }
    let budgets: Vec<BudgetCategory> = fetch_all(store, query::budgets_query()).await?;
    let counts = OverviewCounts {
        users: count(store, PROFILES).await?,
        transactions: transactions.len() as u64,
        goals: count(store, GOALS).await?,
    };
    Ok(Overview {
        counts,
        metrics: aggregate::summarize(&transactions, &budgets, today),
    })
}

pub async fn fetch_budgets(store: &dyn DataStore) -> StoreResult<BudgetSummary> {
    let categories: Vec<BudgetCategory> = fetch_all(store, query::budgets_query()).await?;
    Ok(aggregate::budget_summary(&categories))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalRow {
    #[serde(flatten)]
    pub progress: GoalProgress,
    pub owner: Option<String>,
}

/// Goals by target date, with owner names from the same batched lookup as transactions.
pub async fn fetch_goals(store: &dyn DataStore, today: NaiveDate) -> StoreResult<Vec<GoalRow>> {
    let goals: Vec<Goal> = fetch_all(store, query::goals_query()).await?;
    let mut seen = HashSet::new();
    let ids: Vec<String> = goals
        .iter()
        .filter(|g| seen.insert(g.user_id.as_str()))
        .map(|g| g.user_id.clone())
        .collect();
    let profiles = resolve_profiles(store, &ids).await;
    Ok(aggregate::goal_progress(&goals, today)
        .into_iter()
        .map(|progress| {
            let owner = profiles
                .get(&progress.goal.user_id)
                .and_then(|p| p.name.clone());
            GoalRow { progress, owner }
        })
        .collect())
}

pub async fn list_users(store: &dyn DataStore, q: &UserQuery) -> StoreResult<Vec<Profile>> {
    let page = store.fetch(&q.to_table_query()).await?;
    page.decode()
}

pub async fn set_suspended(store: &dyn DataStore, user_id: &str, suspended: bool) -> StoreResult<()> {
    store
        .update(PROFILES, "user_id", user_id, json!({ "is_suspended": suspended }))
        .await?;
    log::info!(
        "user {} {}",
        user_id,
        if suspended { "suspended" } else { "activated" }
    );
    Ok(())
}

pub async fn delete_user(store: &dyn DataStore, user_id: &str) -> StoreResult<()> {
    store.delete_user(user_id).await?;
    log::info!("user {} deleted", user_id);
    Ok(())
}
