// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budgets;
pub mod doctor;
pub mod goals;
pub mod importer;
pub mod overview;
pub mod transactions;
pub mod users;
pub mod watch;

use crate::config::Config;
use crate::store::DataStore;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::sync::Arc;

/// Everything a command needs, built once in `main`.
pub struct Ctx {
    pub config: Config,
    store: std::result::Result<Arc<dyn DataStore>, String>,
}

impl Ctx {
    pub fn new(config: Config, store: std::result::Result<Arc<dyn DataStore>, String>) -> Self {
        Ctx { config, store }
    }

    /// `None` when startup could not build a store; that was already reported.
    pub fn store(&self) -> Option<Arc<dyn DataStore>> {
        self.store.as_ref().ok().cloned()
    }

    pub fn store_error(&self) -> Option<&str> {
        self.store.as_ref().err().map(String::as_str)
    }
}

/// `--today` if given, else the local calendar day.
pub fn today_from(sub: &clap::ArgMatches) -> Result<NaiveDate> {
    match sub.try_get_one::<String>("today").ok().flatten() {
        Some(s) => crate::utils::parse_date(s.trim()),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn json_flags(sub: &clap::ArgMatches) -> (bool, bool) {
    let flag = |name: &str| sub.try_get_one::<bool>(name).ok().flatten().copied().unwrap_or(false);
    (flag("json"), flag("jsonl"))
}
