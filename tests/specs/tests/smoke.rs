// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `dms-core` binary and
//! exercise it over its Unix-domain JSON-RPC socket.

use std::time::Duration;

use dms_core_specs::{AuthChallengeServer, DmsCoreProcess};

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn location_get_state_returns_a_shape() -> anyhow::Result<()> {
    let daemon = DmsCoreProcess::start().await?;
    let mut conn = daemon.connect().await?;

    conn.send(1, "location.getState", serde_json::Value::Null).await?;
    let resp = conn.recv_timeout(TIMEOUT).await?;

    assert_eq!(resp["id"], 1);
    assert!(resp["result"]["latitude"].is_number());
    assert!(resp["result"]["longitude"].is_number());
    Ok(())
}

#[tokio::test]
async fn unknown_method_reports_an_error() -> anyhow::Result<()> {
    let daemon = DmsCoreProcess::start().await?;
    let mut conn = daemon.connect().await?;

    conn.send(7, "location.bogus", serde_json::Value::Null).await?;
    let resp = conn.recv_timeout(TIMEOUT).await?;

    assert_eq!(resp["id"], 7);
    assert_eq!(resp["error"], "unknown method: location.bogus");
    assert!(resp.get("result").is_none());
    Ok(())
}

// -- Printer reachability probe (spec.md §8 end-to-end scenarios) ------------

#[tokio::test]
async fn tcp_unreachable_printer_reports_unreachable_without_an_ipp_probe() -> anyhow::Result<()> {
    let daemon = DmsCoreProcess::start().await?;
    let mut conn = daemon.connect().await?;

    conn.send(
        1,
        "cups.testConnection",
        serde_json::json!({"host": "192.0.2.1", "port": 631, "protocol": "ipp"}),
    )
    .await?;
    let resp = conn.recv_timeout(Duration::from_secs(15)).await?;

    assert_eq!(resp["result"]["reachable"], false);
    assert!(resp["result"]["error"].as_str().unwrap().contains("192.0.2.1:631"));
    Ok(())
}

#[tokio::test]
async fn auth_gated_printer_is_reported_as_reachable_with_auth_required() -> anyhow::Result<()> {
    let printer = AuthChallengeServer::start().await?;
    let daemon = DmsCoreProcess::start().await?;
    let mut conn = daemon.connect().await?;

    conn.send(
        1,
        "cups.testConnection",
        serde_json::json!({
            "host": printer.addr.ip().to_string(),
            "port": printer.addr.port(),
            "protocol": "ipp",
        }),
    )
    .await?;
    let resp = conn.recv_timeout(TIMEOUT).await?;

    assert_eq!(resp["result"]["reachable"], true);
    assert_eq!(resp["result"]["info"], "authentication required");
    let uri = resp["result"]["uri"].as_str().unwrap();
    assert!(uri.ends_with("/ipp/print"));
    Ok(())
}

#[tokio::test]
async fn unknown_protocol_is_rejected_before_any_network_io() -> anyhow::Result<()> {
    let daemon = DmsCoreProcess::start().await?;
    let mut conn = daemon.connect().await?;

    conn.send(
        1,
        "cups.testConnection",
        serde_json::json!({"host": "printer.local", "port": 631, "protocol": "ftp"}),
    )
    .await?;
    let resp = conn.recv_timeout(TIMEOUT).await?;

    assert_eq!(resp["error"], "protocol must be one of: ipp, ipps, lpd, socket");
    Ok(())
}

// -- Lifecycle -----------------------------------------------------------------

#[tokio::test]
async fn sigterm_shuts_the_daemon_down_cleanly() -> anyhow::Result<()> {
    let mut daemon = DmsCoreProcess::start().await?;
    let pid = daemon.id().ok_or_else(|| anyhow::anyhow!("no pid"))?;

    let status = std::process::Command::new("kill").arg(pid.to_string()).status()?;
    anyhow::ensure!(status.success(), "failed to send SIGTERM to dms-core");

    daemon.wait_exit(TIMEOUT).await?;
    Ok(())
}
