// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic pub/sub state manager: one authoritative state, fanned out to an
//! arbitrary set of subscribers through a coalescing notifier.
//!
//! `location::Manager` and `geoclue::Manager` each own one of these; this
//! module carries the part of the contract that does not vary between them
//! (state lock, subscriber table, notifier state machine). Upstream signal
//! pumps are owned by the caller, which calls [`Manager::set_state`] whenever
//! new data arrives.

use std::sync::RwLock;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Bounded subscriber channel capacity (spec: 64).
const SUBSCRIBER_CAPACITY: usize = 64;

/// A coalescing pub/sub state manager over `S`.
pub struct Manager<S> {
    state: RwLock<S>,
    subscribers: DashMap<String, mpsc::Sender<S>>,
    dirty_tx: mpsc::Sender<()>,
    cancel: CancellationToken,
    notifier_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<S> Manager<S>
where
    S: Clone + PartialEq + Send + Sync + 'static,
{
    /// Construct a manager with the given initial state, and spawn its
    /// notifier task. `label` is used only in log lines to distinguish
    /// managers (e.g. "location", "geoclue").
    pub fn new(initial: S, coalesce_window: Duration, label: &'static str) -> std::sync::Arc<Self> {
        let (dirty_tx, dirty_rx) = mpsc::channel(1);
        let manager = std::sync::Arc::new(Self {
            state: RwLock::new(initial),
            subscribers: DashMap::new(),
            dirty_tx,
            cancel: CancellationToken::new(),
            notifier_handle: std::sync::Mutex::new(None),
        });

        let notifier_manager = std::sync::Arc::clone(&manager);
        let handle =
            tokio::spawn(notifier_loop(notifier_manager, dirty_rx, coalesce_window, label));

        let mut slot = manager.notifier_handle.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(handle);
        drop(slot);

        manager
    }

    /// Returns a snapshot of the current state. Never blocks longer than a
    /// shared-lock acquisition; never fails.
    pub fn get_state(&self) -> S
    where
        S: Default,
    {
        self.state.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// Overwrite the authoritative state and poke the notifier. Intended to
    /// be called by the manager's own signal pump, under no other lock.
    pub fn set_state(&self, new_state: S) {
        {
            let mut guard = match self.state.write() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard = new_state;
        }
        // Non-blocking: a pending poke already covers this update.
        let _ = self.dirty_tx.try_send(());
    }

    /// Subscribe under `id`, returning a freshly created bounded receiver.
    /// Re-using an `id` overwrites the table entry; the previous sender is
    /// dropped (not explicitly closed) along with it, per spec: callers are
    /// required to use unique ids.
    pub fn subscribe(&self, id: impl Into<String>) -> mpsc::Receiver<S> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        self.subscribers.insert(id.into(), tx);
        rx
    }

    /// Atomically remove and close the channel for `id`. No-op if absent.
    pub fn unsubscribe(&self, id: &str) {
        self.subscribers.remove(id);
    }

    /// Signal the notifier to exit, wait for it, then close every
    /// subscriber channel. Idempotent.
    pub async fn close(&self) {
        self.cancel.cancel();
        let handle = {
            let mut slot = self.notifier_handle.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.subscribers.clear();
    }

    fn fan_out(&self, state: &S, label: &'static str) {
        for entry in self.subscribers.iter() {
            match entry.value().try_send(state.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(manager = label, subscriber = %entry.key(), "subscriber channel full, dropping update");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Receiver dropped without calling unsubscribe; nothing to do
                    // until the next unsubscribe() removes the stale entry.
                }
            }
        }
    }
}

async fn notifier_loop<S>(
    manager: std::sync::Arc<Manager<S>>,
    mut dirty_rx: mpsc::Receiver<()>,
    coalesce_window: Duration,
    label: &'static str,
) where
    S: Clone + PartialEq + Send + Sync + 'static,
{
    let mut pending = false;
    let mut armed_until: Option<Instant> = None;
    let mut last_notified: Option<S> = None;

    loop {
        let sleep = async {
            match armed_until {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = manager.cancel.cancelled() => {
                return;
            }
            msg = dirty_rx.recv() => {
                match msg {
                    None => return,
                    Some(()) => {
                        if !pending {
                            pending = true;
                            armed_until = Some(Instant::now() + coalesce_window);
                        }
                        // Armed + dirty: coalesced, no-op.
                    }
                }
            }
            _ = sleep, if pending => {
                pending = false;
                armed_until = None;

                // SAFETY-free: state read never panics (lock is never held
                // across an await point elsewhere in this module).
                let current = {
                    let guard = match manager.state.read() {
                        Ok(g) => g,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    guard.clone()
                };

                if last_notified.as_ref() == Some(&current) {
                    continue;
                }

                manager.fan_out(&current, label);
                last_notified = Some(current);
            }
        }
    }
}

#[cfg(test)]
#[path = "pubsub_tests.rs"]
mod tests;
