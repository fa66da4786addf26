// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `location` manager: a pub/sub state manager fed by the polymorphic
//! [`crate::geolocation::Client`] (system-bus-first, IP-seeded fallback).
//! Separately sourced from `geoclue` (spec.md §6), even though both may end
//! up reading the same system service.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::geolocation::{self, Client};
use crate::pubsub;

const INTERNAL_SUBSCRIBER_ID: &str = "location-manager-upstream-pump";

/// State exposed over `location.getState`/`location.subscribe`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub latitude: f64,
    pub longitude: f64,
}

pub struct Manager {
    client: Box<dyn Client>,
    pubsub: Arc<pubsub::Manager<State>>,
    cancel: CancellationToken,
    pump_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Manager {
    /// `coalesce_window` is the fan-out coalescing window (spec: 200ms,
    /// configurable via [`crate::config::DaemonConfig::coalesce_window`]).
    pub async fn new(coalesce_window: Duration) -> Arc<Self> {
        let client = geolocation::new_client().await;
        let pubsub = pubsub::Manager::new(State::default(), coalesce_window, "location");
        let cancel = CancellationToken::new();

        // Pull whatever the client already knows (post-seed, if any) before
        // the upstream pump starts delivering further updates.
        if let Ok(initial) = client.get_location().await {
            pubsub.set_state(State { latitude: initial.latitude, longitude: initial.longitude });
        }

        let upstream = client.subscribe(INTERNAL_SUBSCRIBER_ID).await;
        let handle = spawn_signal_pump(upstream, Arc::clone(&pubsub), cancel.clone());

        Arc::new(Self { client, pubsub, cancel, pump_handle: std::sync::Mutex::new(Some(handle)) })
    }

    pub fn get_state(&self) -> State {
        self.pubsub.get_state()
    }

    pub fn subscribe(&self, id: impl Into<String>) -> tokio::sync::mpsc::Receiver<State> {
        self.pubsub.subscribe(id)
    }

    pub fn unsubscribe(&self, id: &str) {
        self.pubsub.unsubscribe(id);
    }

    pub async fn close(&self) {
        self.cancel.cancel();
        let handle = {
            let mut slot = self.pump_handle.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.client.unsubscribe(INTERNAL_SUBSCRIBER_ID);
        self.client.close().await;
        self.pubsub.close().await;
    }
}

fn spawn_signal_pump(
    mut upstream: tokio::sync::mpsc::Receiver<geolocation::Location>,
    pubsub: Arc<pubsub::Manager<State>>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = upstream.recv() => {
                    match next {
                        None => break,
                        Some(loc) => {
                            pubsub.set_state(State { latitude: loc.latitude, longitude: loc.longitude });
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
