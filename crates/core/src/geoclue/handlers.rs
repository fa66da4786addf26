// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `geoclue.*` JSON-RPC handlers.

use tokio::io::AsyncWrite;

use super::Manager;
use crate::server::models::{respond, respond_error, Request, StateChangedEvent};

/// Dispatch a single `geoclue.*` request. Returns `Err` only when the
/// underlying write failed, signaling the caller to tear the connection down.
pub async fn handle_request<W>(writer: &mut W, req: &Request, manager: &Manager) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match req.method.as_str() {
        "geoclue.getState" => handle_get_state(writer, req, manager).await,
        "geoclue.subscribe" => handle_subscribe(writer, req, manager).await,
        other => respond_error(writer, req.id.clone(), format!("unknown method: {other}")).await,
    }
}

async fn handle_get_state<W>(writer: &mut W, req: &Request, manager: &Manager) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    respond(writer, req.id.clone(), manager.get_state()).await
}

/// Subscribe to state changes for the lifetime of the connection. Sends the
/// current state tagged with `req.id` first, then further events with no id
/// until the channel closes or a write fails.
async fn handle_subscribe<W>(writer: &mut W, req: &Request, manager: &Manager) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let conn_id = format!("geoclue-{}", crate::server::next_conn_id());
    let mut updates = manager.subscribe(&conn_id);

    let result = async {
        let initial = manager.get_state();
        respond(writer, req.id.clone(), StateChangedEvent::new(initial)).await?;

        while let Some(state) = updates.recv().await {
            respond(writer, None, StateChangedEvent::new(state)).await?;
        }
        Ok(())
    }
    .await;

    manager.unsubscribe(&conn_id);
    result
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
