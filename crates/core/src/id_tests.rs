// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

crate::define_id! {
    pub struct TestId("tst-");
}

#[test]
fn new_ids_carry_prefix_and_fixed_length() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn new_ids_are_unique() {
    assert_ne!(TestId::new(), TestId::new());
}

#[test]
fn from_string_round_trips_through_display() {
    let id = TestId::new();
    let parsed = TestId::from_string(id.as_str());
    assert_eq!(id, parsed);
    assert_eq!(id.to_string(), parsed.to_string());
}

#[test]
fn suffix_strips_prefix() {
    let id = TestId::from_string("tst-abc");
    assert_eq!(id.suffix(), "abc");
}

#[test]
fn serializes_as_plain_string() {
    let id = TestId::from_string("tst-abc");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tst-abc\"");
    let back: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
