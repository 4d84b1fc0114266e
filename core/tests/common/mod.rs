//! Shared test doubles and builders.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use slide_core::{
    clock::FixedClock,
    config::LedgerConfig,
    error::{RemoteError, RemoteResult},
    ids::SeededIds,
    remote::RemoteDocumentService,
    store::{KeyValueStore, MemoryKvStore},
    LedgerStore,
};
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

pub const START: &str = "2026-01-05T12:00:00.000Z";

/// Remote document held in memory, with call counters, an optional
/// forced failure, and per-write latency.
#[derive(Default)]
pub struct InMemoryRemote {
    configured: bool,
    document: Mutex<Option<Value>>,
    fail_with: Mutex<Option<RemoteError>>,
    write_delays: Mutex<VecDeque<Duration>>,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub reads: AtomicUsize,
}

impl InMemoryRemote {
    pub fn configured() -> Self {
        Self { configured: true, ..Self::default() }
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<Value> {
        self.document.lock().unwrap().clone()
    }

    pub fn put_document(&self, value: Value) {
        *self.document.lock().unwrap() = Some(value);
    }

    pub fn fail_next(&self, err: RemoteError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    /// Each queued delay is spent by one `update` before it lands.
    pub fn delay_writes(&self, delays: impl IntoIterator<Item = Duration>) {
        self.write_delays.lock().unwrap().extend(delays);
    }

    pub fn writes(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn check(&self) -> RemoteResult<()> {
        if !self.configured {
            return Err(RemoteError::NotConfigured);
        }
        match self.fail_with.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteDocumentService for InMemoryRemote {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn create(&self, data: &Value) -> RemoteResult<String> {
        self.check()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.put_document(data.clone());
        Ok("doc-1".into())
    }

    async fn read(&self) -> RemoteResult<Value> {
        self.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.document().ok_or(RemoteError::NoDocumentId)
    }

    async fn update(&self, data: &Value) -> RemoteResult<()> {
        self.check()?;
        let delay = self.write_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.put_document(data.clone());
        Ok(())
    }
}

pub struct Harness {
    pub store: LedgerStore,
    pub kv: Arc<MemoryKvStore>,
    pub remote: Arc<InMemoryRemote>,
    pub clock: Arc<FixedClock>,
}

pub fn harness_with(kv: Arc<MemoryKvStore>, remote: Arc<InMemoryRemote>) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = Arc::new(FixedClock::at(START));
    let store = LedgerStore::new(
        LedgerConfig::default_test(),
        kv.clone() as Arc<dyn KeyValueStore>,
        remote.clone() as Arc<dyn RemoteDocumentService>,
        clock.clone(),
        Arc::new(SeededIds::new(42)),
    );
    Harness { store, kv, remote, clock }
}

/// Initialized store over empty in-memory collaborators, no cloud.
pub fn harness() -> Harness {
    let mut h = harness_with(
        Arc::new(MemoryKvStore::new()),
        Arc::new(InMemoryRemote::unconfigured()),
    );
    h.store.init();
    h
}

/// Put a player on the roster (if new) and into `week_id` with a stake.
/// Positive stakes are "in", negative "out". Returns the record id.
pub fn seat(store: &mut LedgerStore, week_id: &str, name: &str, account: u32, amount: f64) -> String {
    if store.player_by_account(account).is_none() {
        store.add_player(name, account).expect("add roster player");
    }
    let record = store
        .add_player_to_week(week_id, name, account)
        .expect("add to week");
    if amount >= 0.0 {
        assert!(store.set_player_in(week_id, &record, amount));
    } else {
        assert!(store.set_player_out(week_id, &record, amount));
    }
    record
}

pub fn balance(store: &LedgerStore, account: u32) -> f64 {
    store.player_by_account(account).expect("roster player").carry_balance()
}
