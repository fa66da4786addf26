// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn rejects_malformed_params() {
    let req = Request {
        id: Some(serde_json::json!(1)),
        method: "cups.testConnection".into(),
        params: serde_json::json!({"port": 631}), // missing required host
    };
    let mut buf = Vec::new();
    handle_request(&mut buf, &req, Duration::from_secs(10)).await.unwrap();
    let line = String::from_utf8(buf).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert!(value["error"].as_str().unwrap().starts_with("invalid params"));
}

#[tokio::test]
async fn unknown_method_reports_an_error() {
    let req = Request { id: None, method: "cups.bogus".into(), params: serde_json::Value::Null };
    let mut buf = Vec::new();
    handle_request(&mut buf, &req, Duration::from_secs(10)).await.unwrap();
    let line = String::from_utf8(buf).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(value["error"], "unknown method: cups.bogus");
}
