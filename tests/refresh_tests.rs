// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use async_trait::async_trait;
use moneydesk::error::StoreError;
use moneydesk::refresh::{
    Loader, RefreshController, Status, Trigger, forward_changes, spawn_interval,
};
use moneydesk::store::{DataStore, SqliteStore};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

type Reply = Result<u32, StoreError>;

/// Each load waits for the next scripted reply.
#[derive(Default)]
struct Scripted {
    replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
}

impl Scripted {
    fn script(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl Loader for Scripted {
    type Output = u32;

    async fn load(&self) -> Result<u32, StoreError> {
        let rx = self.replies.lock().unwrap().pop_front().unwrap();
        rx.await.unwrap()
    }
}

#[derive(Default)]
struct Counter {
    calls: AtomicU32,
}

#[async_trait]
impl Loader for Counter {
    type Output = u32;

    async fn load(&self) -> Result<u32, StoreError> {
        Ok(self.calls.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[tokio::test]
async fn slow_older_result_is_discarded() {
    let loader = Scripted::default();
    let first = loader.script();
    let second = loader.script();
    let c = Arc::new(RefreshController::new(loader));
    let mut display = c.subscribe();

    let a = {
        let c = Arc::clone(&c);
        tokio::spawn(async move { c.refresh(Trigger::Mount).await })
    };
    display.wait_for(|s| s.in_flight == 1).await.unwrap();
    let b = {
        let c = Arc::clone(&c);
        tokio::spawn(async move { c.refresh(Trigger::Manual).await })
    };
    display.wait_for(|s| s.in_flight == 2).await.unwrap();
    assert_eq!(c.snapshot().status(), Status::Fetching);

    second.send(Ok(2)).unwrap();
    assert!(b.await.unwrap());
    first.send(Ok(1)).unwrap();
    assert!(!a.await.unwrap());

    let snap = c.snapshot();
    assert_eq!(snap.data.as_deref(), Some(&2));
    assert_eq!(snap.seq, 2);
    assert_eq!(snap.trigger, Some(Trigger::Manual));
    assert_eq!(snap.status(), Status::Idle);
}

#[tokio::test]
async fn stale_failure_does_not_clear_newer_data() {
    let loader = Scripted::default();
    let first = loader.script();
    let second = loader.script();
    let c = Arc::new(RefreshController::new(loader));
    let mut display = c.subscribe();

    let a = {
        let c = Arc::clone(&c);
        tokio::spawn(async move { c.refresh(Trigger::Tick).await })
    };
    display.wait_for(|s| s.in_flight == 1).await.unwrap();
    let b = {
        let c = Arc::clone(&c);
        tokio::spawn(async move { c.refresh(Trigger::Changed).await })
    };
    display.wait_for(|s| s.in_flight == 2).await.unwrap();

    second.send(Ok(7)).unwrap();
    assert!(b.await.unwrap());
    first
        .send(Err(StoreError::Remote {
            status: 500,
            message: "boom".into(),
        }))
        .unwrap();
    assert!(!a.await.unwrap());

    let snap = c.snapshot();
    assert_eq!(snap.data.as_deref(), Some(&7));
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn failure_replaces_data_with_message() {
    let loader = Scripted::default();
    let ok = loader.script();
    let bad = loader.script();
    ok.send(Ok(1)).unwrap();
    bad.send(Err(StoreError::Remote {
        status: 500,
        message: "boom".into(),
    }))
    .unwrap();
    let c = RefreshController::new(loader);

    assert!(c.refresh(Trigger::Mount).await);
    assert_eq!(c.snapshot().data.as_deref(), Some(&1));

    assert!(c.refresh(Trigger::Manual).await);
    let snap = c.snapshot();
    assert!(snap.data.is_none());
    assert_eq!(snap.error.as_deref(), Some("boom"));
    assert_eq!(snap.status(), Status::Failed("boom".into()));
}

#[tokio::test]
async fn run_serves_triggers_until_closed() {
    let c = Arc::new(RefreshController::new(Counter::default()));
    let (tx, rx) = mpsc::channel(8);
    let runner = {
        let c = Arc::clone(&c);
        tokio::spawn(async move { c.run(rx).await })
    };
    let mut display = c.subscribe();

    tx.send(Trigger::Mount).await.unwrap();
    tx.send(Trigger::Manual).await.unwrap();
    timeout(
        Duration::from_secs(1),
        display.wait_for(|s| s.seq == 2 && s.in_flight == 0),
    )
    .await
    .unwrap()
    .unwrap();

    drop(tx);
    timeout(Duration::from_secs(1), runner).await.unwrap().unwrap();
    let snap = c.snapshot();
    assert_eq!(snap.data.as_deref(), Some(&2));
    assert_eq!(snap.trigger, Some(Trigger::Manual));
    assert_eq!(snap.in_flight, 0);
}

#[tokio::test]
async fn interval_ticks() {
    let (tx, mut rx) = mpsc::channel(4);
    let h = spawn_interval(tx, Duration::from_millis(10));
    let got = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(got, Some(Trigger::Tick));
    h.abort();
}

#[tokio::test]
async fn store_changes_become_triggers() {
    let store = SqliteStore::open_in_memory().unwrap();
    let sub = store.subscribe("transactions").await.unwrap();
    let (tx, mut rx) = mpsc::channel(4);
    let h = forward_changes(sub, tx);

    store
        .insert("transactions", json!({"id": "t1", "user_id": "u1"}))
        .unwrap();
    let got = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(got, Some(Trigger::Changed));
    h.abort();
}
