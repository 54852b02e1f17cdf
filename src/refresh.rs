// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Re-fetch orchestration for live views.
//!
//! Mount, manual refresh, store change notifications and timer ticks all
//! arrive as a [`Trigger`] on one channel. Each trigger starts a fetch right
//! away, even if another is still running. Fetches are numbered when issued
//! and a result is only shown if nothing newer has been shown already, so a
//! slow early response cannot overwrite a fast later one.

use crate::error::StoreError;
use crate::store::Subscription;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Mount,
    Manual,
    Changed,
    Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Fetching,
    Failed(String),
}

/// What the view should display right now.
#[derive(Debug)]
pub struct Snapshot<T> {
    /// Latest applied data; `None` before the first success or after a failure.
    pub data: Option<Arc<T>>,
    /// Message of the latest applied failure.
    pub error: Option<String>,
    /// Sequence number of the fetch that produced `data`/`error`.
    pub seq: u64,
    pub in_flight: usize,
    pub trigger: Option<Trigger>,
}

impl<T> Snapshot<T> {
    pub fn status(&self) -> Status {
        if self.in_flight > 0 {
            Status::Fetching
        } else if let Some(e) = &self.error {
            Status::Failed(e.clone())
        } else {
            Status::Idle
        }
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Snapshot {
            data: None,
            error: None,
            seq: 0,
            in_flight: 0,
            trigger: None,
        }
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Snapshot {
            data: self.data.clone(),
            error: self.error.clone(),
            seq: self.seq,
            in_flight: self.in_flight,
            trigger: self.trigger,
        }
    }
}

/// Produces one fresh view model per call.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    async fn load(&self) -> Result<Self::Output, StoreError>;
}

struct Inner<L: Loader> {
    loader: L,
    next_seq: AtomicU64,
    display: watch::Sender<Snapshot<L::Output>>,
}

impl<L: Loader> Inner<L> {
    fn begin(&self) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.display.send_modify(|s| s.in_flight += 1);
        seq
    }

    /// Returns whether the result was applied.
    fn complete(&self, seq: u64, trigger: Trigger, result: Result<L::Output, StoreError>) -> bool {
        let mut applied = false;
        self.display.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            if seq <= s.seq {
                return;
            }
            s.seq = seq;
            s.trigger = Some(trigger);
            match result {
                Ok(v) => {
                    s.data = Some(Arc::new(v));
                    s.error = None;
                }
                Err(ref e) => {
                    log::warn!("refresh #{} failed: {}", seq, e);
                    s.data = None;
                    s.error = Some(e.user_message());
                }
            }
            applied = true;
        });
        if !applied {
            log::debug!("discarded stale refresh #{} ({:?})", seq, trigger);
        }
        applied
    }

    async fn refresh(&self, trigger: Trigger) -> bool {
        let seq = self.begin();
        log::debug!("refresh #{} started by {:?}", seq, trigger);
        let result = self.loader.load().await;
        self.complete(seq, trigger, result)
    }
}

pub struct RefreshController<L: Loader> {
    inner: Arc<Inner<L>>,
}

impl<L: Loader> RefreshController<L> {
    pub fn new(loader: L) -> Self {
        let (display, _) = watch::channel(Snapshot::default());
        RefreshController {
            inner: Arc::new(Inner {
                loader,
                next_seq: AtomicU64::new(0),
                display,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<L::Output>> {
        self.inner.display.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot<L::Output> {
        self.inner.display.borrow().clone()
    }

    /// Fetches inline. Returns whether the result reached the display.
    pub async fn refresh(&self, trigger: Trigger) -> bool {
        self.inner.refresh(trigger).await
    }

    /// Consumes triggers until the channel closes. Every trigger spawns its
    /// own fetch; whatever is still running when the loop ends is aborted.
    pub async fn run(&self, mut triggers: mpsc::Receiver<Trigger>) {
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                t = triggers.recv() => match t {
                    Some(trigger) => {
                        let inner = Arc::clone(&self.inner);
                        in_flight.spawn(async move {
                            inner.refresh(trigger).await;
                        });
                    }
                    None => break,
                },
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = done {
                        log::error!("refresh task failed: {}", e);
                    }
                }
            }
        }
        if !in_flight.is_empty() {
            log::debug!("cancelling {} in-flight refreshes", in_flight.len());
        }
        in_flight.shutdown().await;
        self.inner.display.send_modify(|s| s.in_flight = 0);
    }
}

/// Sends a `Tick` every `period`, starting one period from now.
pub fn spawn_interval(tx: mpsc::Sender<Trigger>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if tx.send(Trigger::Tick).await.is_err() {
                break;
            }
        }
    })
}

/// Turns store notifications into `Changed` triggers. The subscription lives
/// inside the task, so aborting the handle releases it.
pub fn forward_changes(mut sub: Subscription, tx: mpsc::Sender<Trigger>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match sub.next().await {
                Ok(ev) => {
                    log::debug!("{:?} on {}", ev.kind, ev.table);
                    if tx.send(Trigger::Changed).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::info!("{} on {}; relying on polling", e, sub.table());
                    break;
                }
            }
        }
    })
}
