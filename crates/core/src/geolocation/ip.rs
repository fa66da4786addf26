// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IP-geolocation fallback client: a single HTTP lookup against
//! `ip-api.com`, cached for the life of the process.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::{Client, Location};

const IP_API_URL: &str = "http://ip-api.com/json/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    #[serde(default)]
    #[allow(dead_code)]
    city: String,
}

/// IP-geolocation-backed provider. Looks up lazily on first
/// `get_location`/`subscribe`, then caches the result for the life of the
/// process.
pub struct IpProvider {
    cached: Mutex<Option<Location>>,
}

impl IpProvider {
    pub fn new() -> Self {
        Self { cached: Mutex::new(None) }
    }
}

impl Default for IpProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Perform a single IP-geolocation HTTP lookup, uncached.
pub async fn fetch_once() -> anyhow::Result<Location> {
    let client =
        reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().context("build HTTP client")?;

    let resp = client.get(IP_API_URL).send().await.context("failed to fetch IP location")?;
    let resp = resp.error_for_status().context("ip-api.com returned an error status")?;
    let data: IpApiResponse = resp.json().await.context("failed to parse response")?;

    if data.status == "fail" || (data.lat == 0.0 && data.lon == 0.0) {
        bail!("ip-api.com returned no location data");
    }

    Ok(Location { latitude: data.lat, longitude: data.lon })
}

#[async_trait]
impl Client for IpProvider {
    async fn get_location(&self) -> anyhow::Result<Location> {
        if let Some(loc) = *self.cached.lock().unwrap_or_else(|e| e.into_inner()) {
            if loc.has_fix() {
                return Ok(loc);
            }
        }

        let location = fetch_once().await?;
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = Some(location);
        Ok(location)
    }

    async fn subscribe(&self, _id: &str) -> mpsc::Receiver<Location> {
        let (tx, rx) = mpsc::channel(1);
        if let Ok(location) = self.get_location().await {
            let _ = tx.try_send(location);
        }
        rx
    }

    fn unsubscribe(&self, _id: &str) {}

    async fn close(&self) {}
}

#[cfg(test)]
#[path = "ip_tests.rs"]
mod tests;
