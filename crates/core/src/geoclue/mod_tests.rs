// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn state_default_is_sentinel() {
    assert_eq!(State::default(), State { latitude: 0.0, longitude: 0.0 });
}

#[test]
fn state_round_trips_through_json() {
    let state = State { latitude: 51.5, longitude: -0.12 };
    let json = serde_json::to_string(&state).unwrap();
    let back: State = serde_json::from_str(&json).unwrap();
    assert_eq!(state, back);
}
