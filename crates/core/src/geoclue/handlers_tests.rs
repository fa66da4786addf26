// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn unknown_method_reports_an_error() {
    let manager_cancel = tokio_util::sync::CancellationToken::new();
    let pubsub = crate::pubsub::Manager::new(
        super::super::State::default(),
        std::time::Duration::from_millis(50),
        "geoclue-test",
    );
    let manager = Manager { pubsub, cancel: manager_cancel, pump_handle: std::sync::Mutex::new(None) };

    let req = Request {
        id: Some(serde_json::json!(1)),
        method: "geoclue.bogus".into(),
        params: serde_json::Value::Null,
    };
    let mut buf = Vec::new();
    handle_request(&mut buf, &req, &manager).await.unwrap();
    manager.close().await;

    let line = String::from_utf8(buf).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(value["error"], "unknown method: geoclue.bogus");
}
