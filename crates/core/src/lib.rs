// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! dms-core: helper daemon backing a Wayland desktop shell with location
//! and printer-reachability services, exposed over a local Unix-domain
//! socket as newline-delimited JSON.

pub mod config;
pub mod cups;
pub mod dbus_geoclue;
pub mod geoclue;
pub mod geolocation;
pub mod location;
pub mod paths;
pub mod pubsub;
pub mod server;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::DaemonConfig;
use crate::server::Handlers;

/// Construct both managers, bind the socket, and serve until a shutdown
/// signal arrives or the listener itself fails.
pub async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let coalesce_window = config.coalesce_window();
    let location = location::Manager::new(coalesce_window).await;

    let geoclue = match geoclue::Manager::new(coalesce_window).await {
        Ok(manager) => Some(manager),
        Err(e) => {
            tracing::warn!(err = %e, "GeoClue2 unavailable, geoclue.* routes disabled");
            None
        }
    };

    let socket_path = config.socket_path();
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let handlers = Arc::new(Handlers {
        location: Arc::clone(&location),
        geoclue: geoclue.clone(),
        probe_dial_timeout: config.probe_timeout(),
    });
    let result = server::serve(&socket_path, handlers, shutdown).await;

    location.close().await;
    if let Some(manager) = geoclue {
        manager.close().await;
    }

    result
}

/// First SIGTERM/SIGINT triggers graceful shutdown; a second forces exit.
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => info!("received SIGTERM"),
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => info!("received SIGINT"),
        }
        shutdown.cancel();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => info!("received SIGTERM again, forcing exit"),
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => info!("received SIGINT again, forcing exit"),
        }
        std::process::exit(130);
    });
}
