// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn sentinel_pair_has_no_fix() {
    assert!(!Location::default().has_fix());
    assert!(!Location { latitude: 0.0, longitude: 0.0 }.has_fix());
}

#[test]
fn non_zero_pair_has_fix() {
    assert!(Location { latitude: 12.5, longitude: -0.3 }.has_fix());
    assert!(Location { latitude: 0.0, longitude: 4.0 }.has_fix());
}
