// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote printer reachability probe: a two-phase TCP + IPP test with
//! endpoint fallback and authentication-aware classification (spec.md §4.4).

pub mod handlers;
pub mod ipp;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::time::timeout;

use self::ipp::{IppClient, ProbeOutcome};

const KNOWN_PROTOCOLS: &[&str] = &["ipp", "ipps", "lpd", "socket"];

/// Result of [`test_remote_printer`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemotePrinterInfo {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validate `(host, port, protocol)` ahead of any network I/O. `protocol`
/// empty defaults to `"ipp"`; `port` 0 defaults to 631 by the caller, not
/// here (0 is rejected as out of range).
pub fn validate_test_connection_params(host: &str, port: u16, protocol: &str) -> Result<String, String> {
    if host.is_empty() || host.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
        return Err(format!("invalid host: {host:?}"));
    }
    if port == 0 {
        return Err("port must be between 1 and 65535".to_string());
    }

    let protocol = if protocol.is_empty() { "ipp" } else { protocol };
    if !KNOWN_PROTOCOLS.contains(&protocol) {
        return Err("protocol must be one of: ipp, ipps, lpd, socket".to_string());
    }
    Ok(protocol.to_string())
}

/// Run the full two-phase reachability probe described in spec.md §4.4.
/// `dial_timeout` bounds the initial TCP dial (spec: 10s by default,
/// configurable via [`crate::config::DaemonConfig::probe_timeout`]).
pub async fn test_remote_printer(
    host: &str,
    port: u16,
    protocol: &str,
    dial_timeout: Duration,
) -> Result<RemotePrinterInfo, String> {
    let protocol = validate_test_connection_params(host, port, protocol)?;

    if protocol == "lpd" || protocol == "socket" {
        return Ok(probe_tcp_only(host, port, &protocol, dial_timeout).await);
    }

    if let Err(e) = dial_tcp(host, port, dial_timeout).await {
        return Ok(RemotePrinterInfo {
            reachable: false,
            error: Some(format!("cannot reach {host}:{port}: {e}")),
            ..Default::default()
        });
    }

    let tls = protocol == "ipps";
    let client = IppClient::new(host, port, tls);

    for path in ["/ipp/print", "/"] {
        match client.get_printer_attributes(path).await {
            Ok(ProbeOutcome::AuthRequired) => {
                return Ok(RemotePrinterInfo {
                    reachable: true,
                    uri: Some(format!("{protocol}://{host}:{port}{path}")),
                    info: Some("authentication required".to_string()),
                    ..Default::default()
                });
            }
            Ok(ProbeOutcome::Attributes(attrs)) => {
                return Ok(RemotePrinterInfo {
                    reachable: true,
                    uri: Some(format!("{protocol}://{host}:{port}{path}")),
                    make_model: attrs.make_model,
                    name: attrs.name,
                    info: attrs.info,
                    state: attrs.state,
                    ..Default::default()
                });
            }
            Err(e) => {
                tracing::debug!(host, port, path, err = %e, "IPP probe failed");
            }
        }
    }

    Ok(RemotePrinterInfo {
        reachable: true,
        error: Some(format!("host is reachable but does not appear to be an IPP printer: {host}:{port}")),
        ..Default::default()
    })
}

async fn probe_tcp_only(host: &str, port: u16, protocol: &str, dial_timeout: Duration) -> RemotePrinterInfo {
    match dial_tcp(host, port, dial_timeout).await {
        Ok(()) => RemotePrinterInfo {
            reachable: true,
            uri: Some(format!("{protocol}://{host}:{port}")),
            ..Default::default()
        },
        Err(e) => RemotePrinterInfo {
            reachable: false,
            error: Some(format!("cannot reach {host}:{port}: {e}")),
            ..Default::default()
        },
    }
}

async fn dial_tcp(host: &str, port: u16, dial_timeout: Duration) -> anyhow::Result<()> {
    timeout(dial_timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| anyhow::anyhow!("timed out after {:?}", dial_timeout))?
        .map_err(anyhow::Error::from)?;
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
