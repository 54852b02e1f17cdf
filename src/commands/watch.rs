// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Live views driven by the refresh controller.

use super::Ctx;
use crate::commands::{overview, transactions};
use crate::dashboard::{Overview, TransactionPage, fetch_overview, fetch_transaction_page};
use crate::error::StoreError;
use crate::query::{TRANSACTIONS, TransactionQuery};
use crate::refresh::{Loader, RefreshController, Snapshot, Status, Trigger, forward_changes, spawn_interval};
use crate::store::DataStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct OverviewLoader {
    pub store: Arc<dyn DataStore>,
}

#[async_trait]
impl Loader for OverviewLoader {
    type Output = Overview;

    async fn load(&self) -> Result<Overview, StoreError> {
        fetch_overview(self.store.as_ref(), Local::now().date_naive(), None).await
    }
}

pub struct TransactionsLoader {
    pub store: Arc<dyn DataStore>,
    pub query: TransactionQuery,
}

#[async_trait]
impl Loader for TransactionsLoader {
    type Output = TransactionPage;

    async fn load(&self) -> Result<TransactionPage, StoreError> {
        fetch_transaction_page(self.store.as_ref(), &self.query).await
    }
}

pub async fn handle(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let Some(store) = ctx.store() else {
        return Ok(());
    };
    let period = sub
        .get_one::<u64>("interval")
        .map(|s| Duration::from_secs(*s))
        .unwrap_or_else(|| ctx.config.poll_interval());
    let realtime = ctx.config.dashboard.realtime && !sub.get_flag("no-realtime");

    match sub.get_one::<String>("view").map(String::as_str) {
        Some("tx") => {
            let query = transactions::query_from_matches(sub, ctx.config.dashboard.page_size)?;
            let empty = transactions::render_page(&TransactionPage::empty(&query));
            let loader = TransactionsLoader {
                store: Arc::clone(&store),
                query,
            };
            run_view(loader, store, period, realtime, transactions::render_page, empty).await
        }
        _ => {
            let empty = overview::render(&overview::empty(Local::now().date_naive()));
            let loader = OverviewLoader {
                store: Arc::clone(&store),
            };
            run_view(loader, store, period, realtime, overview::render, empty).await
        }
    }
}

async fn run_view<L, R>(
    loader: L,
    store: Arc<dyn DataStore>,
    period: Duration,
    realtime: bool,
    render: R,
    empty: String,
) -> Result<()>
where
    L: Loader,
    R: Fn(&L::Output) -> String,
{
    let controller = RefreshController::new(loader);
    let (tx, rx) = mpsc::channel(32);

    let mut sources: Vec<JoinHandle<()>> = vec![spawn_interval(tx.clone(), period), spawn_enter(tx.clone())];
    if realtime {
        match store.subscribe(TRANSACTIONS).await {
            Ok(sub) => sources.push(forward_changes(sub, tx.clone())),
            Err(e) => log::warn!("change notifications unavailable, polling only: {}", e),
        }
    }
    tx.send(Trigger::Mount).await?;
    drop(tx);

    let mut display = controller.subscribe();
    let draw_loop = async {
        while display.changed().await.is_ok() {
            let snap = display.borrow_and_update().clone();
            draw(&snap, &render, &empty);
        }
    };

    tokio::select! {
        _ = controller.run(rx) => {}
        _ = draw_loop => {}
        _ = tokio::signal::ctrl_c() => println!("\nStopped watching"),
    }
    for h in sources {
        h.abort();
    }
    Ok(())
}

/// Each line on stdin asks for a manual refresh.
fn spawn_enter(tx: mpsc::Sender<Trigger>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            if tx.send(Trigger::Manual).await.is_err() {
                break;
            }
        }
    })
}

fn draw<T, R>(snap: &Snapshot<T>, render: &R, empty: &str)
where
    R: Fn(&T) -> String,
{
    let status = match snap.status() {
        Status::Idle => "up to date".to_string(),
        Status::Fetching => "refreshing...".to_string(),
        Status::Failed(msg) => format!("error: {}", msg),
    };
    let body = match &snap.data {
        Some(data) => render(data.as_ref()),
        None => empty.to_string(),
    };
    let when = Local::now().format("%H:%M:%S");
    print!(
        "\x1B[2J\x1B[H[{}] refresh #{} ({}) - Enter to refresh, Ctrl-C to quit\n\n{}\n",
        when, snap.seq, status, body
    );
}
