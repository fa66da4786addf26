// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Low-level GeoClue2 D-Bus session: the plumbing shared by the
//! `geolocation::geoclue` provider (used by the `location` manager's
//! seeded-fallback client) and the standalone `geoclue` manager (used
//! directly, with no fallback). Both managers talk to the same system
//! service but are independent consumers, matching the upstream layout
//! this daemon is modeled on.

use anyhow::Context;
use futures_util::StreamExt;
use zbus::message::Type as MessageType;
use zbus::zvariant::OwnedObjectPath;
use zbus::{Connection, MatchRule, MessageStream};

const SERVICE: &str = "org.freedesktop.GeoClue2";
const MANAGER_PATH: &str = "/org/freedesktop/GeoClue2/Manager";
const MANAGER_IFACE: &str = "org.freedesktop.GeoClue2.Manager";
const CLIENT_IFACE: &str = "org.freedesktop.GeoClue2.Client";
const LOCATION_IFACE: &str = "org.freedesktop.GeoClue2.Location";
const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";

/// An established GeoClue2 client session on the system bus.
pub struct GeoClueSession {
    connection: Connection,
    client_path: OwnedObjectPath,
}

impl GeoClueSession {
    /// Connect to the system bus, obtain a GeoClue2 client, and configure it
    /// with the given desktop id and time threshold (seconds). Does not
    /// start the client yet.
    pub async fn connect(desktop_id: &str, time_threshold_secs: u32) -> anyhow::Result<Self> {
        let connection =
            Connection::system().await.context("system bus connection failed")?;

        let reply = connection
            .call_method(Some(SERVICE), MANAGER_PATH, Some(MANAGER_IFACE), "GetClient", &())
            .await
            .context("failed to create GeoClue2 client")?;
        let client_path: OwnedObjectPath =
            reply.body().deserialize().context("failed to parse GetClient reply")?;

        let session = Self { connection, client_path };

        session
            .set_client_property("DesktopId", desktop_id)
            .await
            .context("failed to set desktop ID")?;
        session
            .set_client_property("TimeThreshold", time_threshold_secs)
            .await
            .context("failed to set time threshold")?;

        Ok(session)
    }

    async fn set_client_property<T>(&self, name: &str, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize + zbus::zvariant::Type,
    {
        self.connection
            .call_method(
                Some(SERVICE),
                self.client_path.as_str(),
                Some(PROPERTIES_IFACE),
                "Set",
                &(CLIENT_IFACE, name, zbus::zvariant::Value::new(value)),
            )
            .await?;
        Ok(())
    }

    async fn get_property(&self, object_path: &str, interface: &str, name: &str) -> anyhow::Result<f64> {
        let reply = self
            .connection
            .call_method(
                Some(SERVICE),
                object_path,
                Some(PROPERTIES_IFACE),
                "Get",
                &(interface, name),
            )
            .await?;
        let value: zbus::zvariant::OwnedValue = reply.body().deserialize()?;
        f64::try_from(value).context("property was not a double")
    }

    /// Start the client's location updates.
    pub async fn start(&self) -> anyhow::Result<()> {
        self.connection
            .call_method(Some(SERVICE), self.client_path.as_str(), Some(CLIENT_IFACE), "Start", &())
            .await
            .context("failed to start GeoClue client")?;
        Ok(())
    }

    /// Stop the client. Errors are not actionable on shutdown, so callers
    /// typically ignore them.
    pub async fn stop(&self) -> anyhow::Result<()> {
        self.connection
            .call_method(Some(SERVICE), self.client_path.as_str(), Some(CLIENT_IFACE), "Stop", &())
            .await?;
        Ok(())
    }

    /// Fetch `Latitude`/`Longitude` from a `Location` object path.
    pub async fn fetch_lat_lon(&self, location_path: &str) -> anyhow::Result<(f64, f64)> {
        let latitude = self.get_property(location_path, LOCATION_IFACE, "Latitude").await?;
        let longitude = self.get_property(location_path, LOCATION_IFACE, "Longitude").await?;
        Ok((latitude, longitude))
    }

    /// Subscribe to the client's `LocationUpdated` signal. Each item is the
    /// new location object path.
    pub async fn location_updated_stream(
        &self,
    ) -> anyhow::Result<impl futures_util::Stream<Item = OwnedObjectPath> + Send> {
        let rule = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .interface(CLIENT_IFACE)?
            .member("LocationUpdated")?
            .path(self.client_path.as_str())?
            .build();

        let stream = MessageStream::for_match_rule(rule, &self.connection, None)
            .await
            .context("failed to subscribe to LocationUpdated")?;

        Ok(stream.filter_map(|msg| async move {
            let msg = msg.ok()?;
            let (_old, new_path): (OwnedObjectPath, OwnedObjectPath) =
                msg.body().deserialize().ok()?;
            Some(new_path)
        }))
    }
}
