// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GeoClue2-backed geolocation provider. Unlike the `location`/`geoclue`
//! managers (which coalesce fan-out on a 200ms window), the provider
//! forwards every signal it receives directly: coalescing is a manager-level
//! concern (spec.md §4.1), not a provider one (§4.2).

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{Client, Location};
use crate::dbus_geoclue::GeoClueSession;

const DESKTOP_ID: &str = "dms";
const TIME_THRESHOLD_SECS: u32 = 10;
const SUBSCRIBER_CAPACITY: usize = 64;

pub struct GeoClueProvider {
    session: Arc<GeoClueSession>,
    current: Arc<RwLock<Location>>,
    subscribers: Arc<DashMap<String, mpsc::Sender<Location>>>,
    cancel: CancellationToken,
    pump_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl GeoClueProvider {
    /// Connect to GeoClue2 over the system bus and start its signal pump.
    pub async fn connect() -> anyhow::Result<Self> {
        let session = Arc::new(GeoClueSession::connect(DESKTOP_ID, TIME_THRESHOLD_SECS).await?);
        let current = Arc::new(RwLock::new(Location::default()));
        let subscribers: Arc<DashMap<String, mpsc::Sender<Location>>> = Arc::new(DashMap::new());
        let cancel = CancellationToken::new();

        let handle = spawn_signal_pump(
            Arc::clone(&session),
            Arc::clone(&current),
            Arc::clone(&subscribers),
            cancel.clone(),
        );

        Ok(Self {
            session,
            current,
            subscribers,
            cancel,
            pump_handle: std::sync::Mutex::new(Some(handle)),
        })
    }

    /// Write initial coordinates without requiring a real signal.
    pub fn seed_location(&self, loc: Location) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = loc;
    }
}

fn spawn_signal_pump(
    session: Arc<GeoClueSession>,
    current: Arc<RwLock<Location>>,
    subscribers: Arc<DashMap<String, mpsc::Sender<Location>>>,
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
                                    let loc = Location { latitude, longitude };
                                    *current.write().unwrap_or_else(|e| e.into_inner()) = loc;
                                    fan_out(&subscribers, loc);
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

fn fan_out(subscribers: &DashMap<String, mpsc::Sender<Location>>, loc: Location) {
    for entry in subscribers.iter() {
        if let Err(mpsc::error::TrySendError::Full(_)) = entry.value().try_send(loc) {
            tracing::warn!(subscriber = %entry.key(), "GeoClue: subscriber channel full, dropping update");
        }
    }
}

#[async_trait]
impl Client for GeoClueProvider {
    async fn get_location(&self) -> anyhow::Result<Location> {
        Ok(*self.current.read().unwrap_or_else(|e| e.into_inner()))
    }

    async fn subscribe(&self, id: &str) -> mpsc::Receiver<Location> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        self.subscribers.insert(id.to_owned(), tx);
        rx
    }

    fn unsubscribe(&self, id: &str) {
        self.subscribers.remove(id);
    }

    async fn close(&self) {
        self.cancel.cancel();
        let handle = {
            let mut slot = self.pump_handle.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.subscribers.clear();
    }
}

#[cfg(test)]
#[path = "geoclue_tests.rs"]
mod tests;
