// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-domain socket listener and connection loop. This is the minimal
//! "which manager namespace owns this method" routing spec.md §4.3 leaves to
//! the core — it performs no business logic of its own.

pub mod models;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;

use crate::server::models::{respond_error, Request};
use crate::{cups, geoclue, location};

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// A per-connection monotonically increasing id, substituting for the
/// connection-pointer trick spec.md's design notes call out as
/// language-specific (see Design Note 3 / SPEC_FULL.md §9).
pub fn next_conn_id() -> u64 {
    NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed)
}

/// The managers a connection's requests may be routed to.
pub struct Handlers {
    pub location: Arc<location::Manager>,
    pub geoclue: Option<Arc<geoclue::Manager>>,
    pub probe_dial_timeout: Duration,
}

/// Bind `socket_path` and serve connections until `shutdown` is cancelled.
pub async fn serve(
    socket_path: &Path,
    handlers: Arc<Handlers>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let _ = std::fs::remove_file(socket_path);
    let listener = UnixListener::bind(socket_path)?;
    tracing::info!(path = %socket_path.display(), "dms-core listening");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let handlers = Arc::clone(&handlers);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, handlers).await {
                                tracing::debug!(err = %e, "connection closed");
                            }
                        });
                    }
                    Err(e) => tracing::debug!(err = %e, "accept error"),
                }
            }
        }
    }
    Ok(())
}

async fn handle_connection(stream: UnixStream, handlers: Arc<Handlers>) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Request = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                respond_error(&mut write_half, None, format!("malformed request: {e}")).await?;
                continue;
            }
        };

        let namespace = req.method.split('.').next().unwrap_or("");
        match namespace {
            "location" => {
                location::handlers::handle_request(&mut write_half, &req, &handlers.location).await?
            }
            "geoclue" => match handlers.geoclue.as_deref() {
                Some(manager) => geoclue::handlers::handle_request(&mut write_half, &req, manager).await?,
                None => {
                    respond_error(&mut write_half, req.id.clone(), "geoclue service unavailable").await?
                }
            },
            "cups" => {
                cups::handlers::handle_request(&mut write_half, &req, handlers.probe_dial_timeout).await?
            }
            _ => {
                respond_error(&mut write_half, req.id.clone(), format!("unknown method: {}", req.method))
                    .await?
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
