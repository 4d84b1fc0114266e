//! Cloud sync orchestration.
//!
//! Local saves are synchronous. Remote writes are debounced: each mutation
//! reschedules one timer, so a burst of edits becomes a single write.
//!
//! RULES:
//!   - One timer slot. Scheduling aborts whatever timer is pending.
//!   - Only the timer is cancellable. A write that has started runs to
//!     completion.
//!   - Remote calls go through one write lock, taken in FIFO order, so
//!     writes land in the order they were scheduled and a pull never
//!     overlaps a push.
//!   - No retries. A failure leaves local state as the source of truth
//!     and surfaces the error string through `SyncStatus`.

use crate::{
    clock::Clock,
    error::{RemoteError, RemoteResult},
    remote::RemoteDocumentService,
    snapshot::LedgerSnapshot,
    types::Timestamp,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    runtime::Handle,
    sync::{watch, Mutex},
    task::JoinHandle,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStatus {
    pub state: SyncState,
    pub last_synced: Option<Timestamp>,
    pub error: Option<String>,
}

/// Shared between the owner and the spawned timer / write tasks.
struct SyncShared {
    remote: Arc<dyn RemoteDocumentService>,
    clock: Arc<dyn Clock>,
    status: watch::Sender<SyncStatus>,
    reset_after: Duration,
    /// Held for the whole of every remote call.
    write_lock: Arc<Mutex<()>>,
}

impl SyncShared {
    fn begin(&self) {
        self.status.send_modify(|s| {
            s.state = SyncState::Syncing;
            s.error = None;
        });
    }

    fn succeed(self: &Arc<Self>) {
        let at = self.clock.timestamp();
        self.status.send_modify(|s| {
            s.state = SyncState::Success;
            s.last_synced = Some(at.clone());
            s.error = None;
        });
        self.schedule_reset(at);
    }

    fn fail(&self, err: &RemoteError) {
        log::error!("Cloud sync failed: {err}");
        let message = err.to_string();
        self.status.send_modify(|s| {
            s.state = SyncState::Error;
            s.error = Some(message);
        });
    }

    fn idle(&self) {
        self.status.send_modify(|s| s.state = SyncState::Idle);
    }

    /// Drop back to idle after a success, unless something else happened
    /// in the meantime.
    fn schedule_reset(self: &Arc<Self>, synced_at: Timestamp) {
        let Ok(handle) = Handle::try_current() else { return };
        let shared = Arc::clone(self);
        handle.spawn(async move {
            tokio::time::sleep(shared.reset_after).await;
            shared.status.send_if_modified(|s| {
                let unchanged = s.state == SyncState::Success
                    && s.last_synced.as_deref() == Some(synced_at.as_str());
                if unchanged {
                    s.state = SyncState::Idle;
                }
                unchanged
            });
        });
    }

    async fn push(self: &Arc<Self>, data: Value) -> RemoteResult<()> {
        self.begin();
        match self.remote.update(&data).await {
            Ok(()) => {
                log::debug!("Cloud sync complete");
                self.succeed();
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }
}

pub struct CloudSync {
    shared: Arc<SyncShared>,
    debounce: Duration,
    pending: Option<JoinHandle<()>>,
}

impl CloudSync {
    pub fn new(
        remote: Arc<dyn RemoteDocumentService>,
        clock: Arc<dyn Clock>,
        debounce: Duration,
        reset_after: Duration,
    ) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        Self {
            shared: Arc::new(SyncShared {
                remote,
                clock,
                status,
                reset_after,
                write_lock: Arc::new(Mutex::new(())),
            }),
            debounce,
            pending: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.shared.remote.is_configured()
    }

    pub fn status(&self) -> SyncStatus {
        self.shared.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.shared.status.subscribe()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Abort the pending timer, if any. An in-flight write is unaffected.
    pub fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }

    /// (Re)arm the debounce timer with the latest snapshot.
    pub fn schedule(&mut self, snapshot: &LedgerSnapshot) {
        if !self.is_configured() {
            return;
        }
        let data = match snapshot.to_value() {
            Ok(v) => v,
            Err(e) => {
                log::error!("Could not serialize snapshot for sync: {e}");
                return;
            }
        };
        let Ok(handle) = Handle::try_current() else {
            log::warn!("No async runtime; cloud sync not scheduled");
            return;
        };

        self.cancel_pending();
        let shared = Arc::clone(&self.shared);
        let delay = self.debounce;
        let inner = handle.clone();
        self.pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // Queue behind any write still running, then detach so a later
            // abort only ever hits the timer.
            let guard = Arc::clone(&shared.write_lock).lock_owned().await;
            inner.spawn(async move {
                let _ = shared.push(data).await;
                drop(guard);
            });
        }));
        log::debug!("Cloud sync scheduled in {delay:?}");
    }

    /// Cancel the timer and write right now.
    pub async fn push_now(&mut self, snapshot: &LedgerSnapshot) -> RemoteResult<()> {
        self.cancel_pending();
        if !self.is_configured() {
            let err = RemoteError::NotConfigured;
            self.shared.fail(&err);
            return Err(err);
        }
        let data = snapshot
            .to_value()
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;
        let _guard = self.shared.write_lock.lock().await;
        self.shared.push(data).await
    }

    /// Wait for every write that has already left the timer. A timer that
    /// has not fired yet is not waited for.
    pub async fn flush(&self) {
        let _guard = self.shared.write_lock.lock().await;
    }

    /// Fetch the remote snapshot. `Ok(None)` when nothing was ever pushed.
    pub async fn pull(&mut self) -> RemoteResult<Option<LedgerSnapshot>> {
        if !self.is_configured() {
            let err = RemoteError::NotConfigured;
            self.shared.fail(&err);
            return Err(err);
        }
        let _guard = self.shared.write_lock.lock().await;
        self.shared.begin();
        let value = match self.shared.remote.read().await {
            Ok(v) => v,
            Err(RemoteError::NoDocumentId) => {
                log::info!("No remote document yet; nothing to pull");
                self.shared.idle();
                return Ok(None);
            }
            Err(e) => {
                self.shared.fail(&e);
                return Err(e);
            }
        };
        match LedgerSnapshot::from_value(value) {
            Ok(snapshot) => {
                self.shared.succeed();
                Ok(Some(snapshot))
            }
            Err(e) => {
                let err = RemoteError::Malformed(e.to_string());
                self.shared.fail(&err);
                Err(err)
            }
        }
    }
}

impl Drop for CloudSync {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
