// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polymorphic geolocation provider: a GeoClue2-backed client with a
//! transparent IP-geolocation seed/fallback (spec.md §4.2).

pub mod geoclue;
pub mod ip;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// An immutable `{lat, lon}` pair. `(0.0, 0.0)` means "no fix".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn has_fix(self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0
    }
}

/// Capability set a geolocation provider must expose, regardless of source.
#[async_trait]
pub trait Client: Send + Sync {
    async fn get_location(&self) -> anyhow::Result<Location>;
    async fn subscribe(&self, id: &str) -> mpsc::Receiver<Location>;
    fn unsubscribe(&self, id: &str);
    async fn close(&self);
}

/// Construct a geolocation client using the seeded-fallback policy:
/// prefer GeoClue2; if it has no fix yet, seed it with one synchronous IP
/// lookup; if GeoClue2 cannot be constructed at all, fall back to the IP
/// client (which looks up lazily on first `get_location`).
pub async fn new_client() -> Box<dyn Client> {
    match geoclue::GeoClueProvider::connect().await {
        Ok(provider) => {
            let current = provider.get_location().await.unwrap_or_default();
            if current.has_fix() {
                return Box::new(provider);
            }

            tracing::info!("GeoClue2 has no fix yet, seeding from IP geolocation");
            match ip::fetch_once().await {
                Ok(seed) => provider.seed_location(seed),
                Err(e) => tracing::warn!(err = %e, "IP geolocation seed lookup failed"),
            }
            Box::new(provider)
        }
        Err(e) => {
            tracing::warn!(err = %e, "failed to initialize GeoClue2 client");
            tracing::info!("falling back to IP location");
            Box::new(ip::IpProvider::new())
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
