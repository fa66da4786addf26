// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC-ish request/response envelope and framing for the
//! newline-delimited-JSON wire protocol (spec.md §6).

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A decoded request line: `{"id": <number|string>, "method": <string>, "params": <object|null>}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The response/event envelope: `{id?, result}` or `{id?, error}`.
#[derive(Debug, Serialize)]
pub struct Response<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A subscription event: `{"type":"state_changed","data":<state>}`.
#[derive(Debug, Serialize)]
pub struct StateChangedEvent<T> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: T,
}

impl<T> StateChangedEvent<T> {
    pub fn new(data: T) -> Self {
        Self { kind: "state_changed", data }
    }
}

/// Write `value` as a single self-delimited JSON line.
async fn write_line<W, T>(writer: &mut W, value: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line =
        serde_json::to_vec(value).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    line.push(b'\n');
    writer.write_all(&line).await
}

/// Respond with a successful result, echoing `id`.
pub async fn respond<W, T>(writer: &mut W, id: Option<serde_json::Value>, result: T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    write_line(writer, &Response { id, result: Some(result), error: None }).await
}

/// Respond with an error message, echoing `id`.
pub async fn respond_error<W>(
    writer: &mut W,
    id: Option<serde_json::Value>,
    message: impl Into<String>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_line(writer, &Response::<()> { id, result: None, error: Some(message.into()) }).await
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
