// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use std::fmt;

/// Transaction kind as stored in the `type` column.
///
/// Unknown values are kept in `Other` instead of failing the whole page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
    Other(String),
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
            TransactionType::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for TransactionType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => TransactionType::Income,
            "expense" => TransactionType::Expense,
            "transfer" => TransactionType::Transfer,
            _ => TransactionType::Other(s),
        }
    }
}

impl From<TransactionType> for String {
    fn from(t: TransactionType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(deserialize_with = "naive_day")]
    pub date: NaiveDate,
    pub amount: Decimal,
    pub r#type: TransactionType,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "flexible_timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "bool_or_null")]
    pub is_suspended: bool,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(deserialize_with = "flexible_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("No name")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    pub name: String,
    pub budget: Decimal,
    #[serde(default)]
    pub spent: Decimal,
}

impl BudgetCategory {
    /// Budget minus spent; negative when the category is over budget.
    pub fn remaining(&self) -> Decimal {
        self.budget - self.spent
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub current_amount: Decimal,
    pub target_amount: Decimal,
    #[serde(deserialize_with = "naive_day")]
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    OnTrack,
    Progressing,
    Behind,
    AtRisk,
}

impl GoalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            GoalStatus::OnTrack => "on track",
            GoalStatus::Progressing => "progressing",
            GoalStatus::Behind => "behind",
            GoalStatus::AtRisk => "at risk",
        }
    }
}

impl Goal {
    /// Percent complete, capped at 100.
    pub fn progress_percent(&self) -> Decimal {
        let hundred = Decimal::ONE_HUNDRED;
        if self.target_amount <= Decimal::ZERO {
            return if self.current_amount > Decimal::ZERO {
                hundred
            } else {
                Decimal::ZERO
            };
        }
        (self.current_amount / self.target_amount * hundred).min(hundred)
    }

    /// Whole days until the target date; negative once overdue.
    pub fn days_left(&self, today: NaiveDate) -> i64 {
        (self.target_date - today).num_days()
    }

    pub fn status(&self) -> GoalStatus {
        let p = self.progress_percent();
        if p >= Decimal::from(75) {
            GoalStatus::OnTrack
        } else if p >= Decimal::from(50) {
            GoalStatus::Progressing
        } else if p >= Decimal::from(25) {
            GoalStatus::Behind
        } else {
            GoalStatus::AtRisk
        }
    }
}

fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected id, got {}", other))),
    }
}

fn bool_or_null<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(d)?.unwrap_or(false))
}

// Dates are read as calendar days; any time or offset suffix is ignored.
fn naive_day<'de, D>(d: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| D::Error::custom(format!("invalid date '{}': {}", raw, e)))
}

fn flexible_timestamp<'de, D>(d: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", raw)))
}

/// Parses RFC 3339, offset-less `YYYY-MM-DD[T ]HH:MM:SS[.f]` (taken as UTC) or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
