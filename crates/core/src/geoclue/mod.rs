// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `geoclue` manager: a pub/sub state manager driving its own GeoClue2
//! D-Bus session directly, with no IP fallback. Separately sourced from
//! `location` (spec.md §6), even though both end up talking to the same
//! system service.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::dbus_geoclue::GeoClueSession;
use crate::pubsub;

const DESKTOP_ID: &str = "dms";
const TIME_THRESHOLD_SECS: u32 = 10;

/// State exposed over `geoclue.getState`/`geoclue.subscribe`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub latitude: f64,
    pub longitude: f64,
}

pub struct Manager {
    pubsub: Arc<pubsub::Manager<State>>,
    cancel: CancellationToken,
    pump_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Manager {
    /// `coalesce_window` is the fan-out coalescing window (spec: 200ms,
    /// configurable via [`crate::config::DaemonConfig::coalesce_window`]).
    pub async fn new(coalesce_window: Duration) -> anyhow::Result<Arc<Self>> {
        let session = Arc::new(GeoClueSession::connect(DESKTOP_ID, TIME_THRESHOLD_SECS).await?);
        let pubsub = pubsub::Manager::new(State::default(), coalesce_window, "geoclue");
        let cancel = CancellationToken::new();

        let handle =
            spawn_signal_pump(session, Arc::clone(&pubsub), cancel.clone());

        Ok(Arc::new(Self { pubsub, cancel, pump_handle: std::sync::Mutex::new(Some(handle)) }))
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
        self.pubsub.close().await;
    }
}

fn spawn_signal_pump(
    session: Arc<GeoClueSession>,
    pubsub: Arc<pubsub::Manager<State>>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = session.start().await {
            tracing::warn!(err = %e, "GeoClue: failed to start client");
            return;
        }

        let stream = match session.location_updated_stream().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(err = %e, "GeoClue: failed to subscribe to LocationUpdated");
                return;
            }
        };
        tokio::pin!(stream);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = stream.next() => {
                    match next {
                        None => break,
                        Some(path) => {
                            match session.fetch_lat_lon(path.as_str()).await {
                                Ok((latitude, longitude)) => {
                                    pubsub.set_state(State { latitude, longitude });
                                }
                                Err(e) => {
                                    tracing::warn!(err = %e, "GeoClue: failed to handle location update");
                                }
                            }
                        }
                    }
                }
            }
        }

        let _ = session.stop().await;
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
