// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cups.testConnection` JSON-RPC handler.

use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncWrite;

use super::test_remote_printer;
use crate::server::models::{respond, respond_error, Request};

#[derive(Debug, Deserialize)]
struct TestConnectionParams {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    protocol: String,
}

fn default_port() -> u16 {
    631
}

pub async fn handle_request<W>(writer: &mut W, req: &Request, dial_timeout: Duration) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match req.method.as_str() {
        "cups.testConnection" => handle_test_connection(writer, req, dial_timeout).await,
        other => respond_error(writer, req.id.clone(), format!("unknown method: {other}")).await,
    }
}

async fn handle_test_connection<W>(writer: &mut W, req: &Request, dial_timeout: Duration) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let params: TestConnectionParams = match serde_json::from_value(req.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return respond_error(writer, req.id.clone(), format!("invalid params: {e}")).await;
        }
    };

    match test_remote_printer(&params.host, params.port, &params.protocol, dial_timeout).await {
        Ok(info) => respond(writer, req.id.clone(), info).await,
        Err(e) => respond_error(writer, req.id.clone(), e).await,
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
