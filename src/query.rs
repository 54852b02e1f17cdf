// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Store-neutral request model.
//!
//! Views describe what they want with [`TransactionQuery`], [`UserQuery`] and
//! friends; those compile down to a [`TableQuery`] which each store renders in
//! its own dialect (PostgREST parameters, SQL over JSON rows).

use crate::error::{StoreError, StoreResult};
use crate::models::TransactionType;
use std::str::FromStr;

pub const TRANSACTIONS: &str = "transactions";
pub const PROFILES: &str = "profiles";
pub const BUDGET_CATEGORIES: &str = "budget_categories";
pub const GOALS: &str = "goals";

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq { column: String, value: String },
    In { column: String, values: Vec<String> },
}

/// Case-insensitive substring match of `term` against any of `columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchGroup {
    pub columns: Vec<String>,
    pub term: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
    /// Compare as numbers rather than text where the store cannot tell.
    pub numeric: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub table: String,
    pub filters: Vec<Filter>,
    pub search: Option<SearchGroup>,
    pub order: Option<OrderBy>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    /// Ask for the exact number of matching rows before pagination.
    pub count: bool,
}

impl TableQuery {
    pub fn new(table: &str) -> Self {
        TableQuery {
            table: table.to_string(),
            filters: Vec::new(),
            search: None,
            order: None,
            offset: None,
            limit: None,
            count: false,
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn is_in<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.push(Filter::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// An empty term is ignored. Any other term, surrounding whitespace
    /// included, is matched as typed.
    pub fn ilike_any(mut self, columns: &[&str], term: &str) -> Self {
        if !term.is_empty() {
            self.search = Some(SearchGroup {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                term: term.to_string(),
            });
        }
        self
    }

    pub fn order(mut self, column: &str, descending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            descending,
            numeric: false,
        });
        self
    }

    pub fn order_numeric(mut self, column: &str, descending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            descending,
            numeric: true,
        });
        self
    }

    pub fn range(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Only the total is wanted; no rows come back.
    pub fn count_only(mut self) -> Self {
        self.count = true;
        self.offset = None;
        self.limit = Some(0);
        self
    }

    /// Every column name that ends up in a request.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for f in &self.filters {
            match f {
                Filter::Eq { column, .. } | Filter::In { column, .. } => out.push(column.as_str()),
            }
        }
        if let Some(s) = &self.search {
            out.extend(s.columns.iter().map(String::as_str));
        }
        if let Some(o) = &self.order {
            out.push(o.column.as_str());
        }
        out
    }

    /// Rejects table or column names that are not plain identifiers.
    pub fn validate(&self) -> StoreResult<()> {
        if !is_identifier(&self.table) {
            return Err(StoreError::InvalidQuery(format!(
                "bad table name '{}'",
                self.table
            )));
        }
        for c in self.columns() {
            if !is_identifier(c) {
                return Err(StoreError::InvalidQuery(format!("bad column name '{}'", c)));
            }
        }
        if let Some(s) = &self.search {
            if s.columns.is_empty() {
                return Err(StoreError::InvalidQuery(
                    "search needs at least one column".into(),
                ));
            }
        }
        Ok(())
    }
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(TransactionType),
}

impl FromStr for TypeFilter {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(TypeFilter::All),
            "income" => Ok(TypeFilter::Only(TransactionType::Income)),
            "expense" => Ok(TypeFilter::Only(TransactionType::Expense)),
            "transfer" => Ok(TypeFilter::Only(TransactionType::Transfer)),
            other => Err(StoreError::InvalidQuery(format!(
                "unknown transaction type filter '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Date,
    Amount,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Date => "date",
            SortField::Amount => "amount",
        }
    }
}

impl FromStr for SortField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created_at" | "created" => Ok(SortField::CreatedAt),
            "date" => Ok(SortField::Date),
            "amount" => Ok(SortField::Amount),
            other => Err(StoreError::InvalidQuery(format!(
                "cannot sort by '{}'",
                other
            ))),
        }
    }
}

/// Filter, sort and paging state of the transaction listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub search: String,
    pub type_filter: TypeFilter,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub sort: SortField,
    pub descending: bool,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        TransactionQuery {
            search: String::new(),
            type_filter: TypeFilter::All,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl TransactionQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn to_table_query(&self) -> StoreResult<TableQuery> {
        if self.page == 0 {
            return Err(StoreError::InvalidQuery("page numbers start at 1".into()));
        }
        if self.page_size == 0 {
            return Err(StoreError::InvalidQuery(
                "page size must be at least 1".into(),
            ));
        }
        let mut q = TableQuery::new(TRANSACTIONS).with_count();
        if let TypeFilter::Only(t) = &self.type_filter {
            q = q.eq("type", t.as_str());
        }
        q = q.ilike_any(&["description", "category"], &self.search);
        q = if self.sort == SortField::Amount {
            q.order_numeric(self.sort.column(), self.descending)
        } else {
            q.order(self.sort.column(), self.descending)
        };
        Ok(q.range(self.offset(), u64::from(self.page_size)))
    }
}

pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}

/// Search state of the user management listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub search: String,
}

impl UserQuery {
    pub fn to_table_query(&self) -> TableQuery {
        TableQuery::new(PROFILES)
            .ilike_any(&["name", "university", "student_id"], &self.search)
            .order("created_at", true)
    }
}

pub fn budgets_query() -> TableQuery {
    TableQuery::new(BUDGET_CATEGORIES).order_numeric("budget", true)
}

pub fn goals_query() -> TableQuery {
    TableQuery::new(GOALS).order("target_date", false)
}
