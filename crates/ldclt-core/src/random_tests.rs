// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn rand_int_respects_bounds() {
    for _ in 0..200 {
        let v = rand_int(10, 20);
        assert!((10..=20).contains(&v));
    }
}

#[test]
fn rand_int_degenerate_range_returns_lo() {
    assert_eq!(rand_int(5, 5), 5);
    assert_eq!(rand_int(9, 3), 9);
}

#[test]
fn rand_dn_string_is_always_dn_safe() {
    for len in [1, 8, 32] {
        let s = rand_dn_string(len);
        assert_eq!(s.chars().count(), len);
        for c in DN_UNSAFE {
            assert!(!s.contains(*c));
        }
        assert!(!s.ends_with('\\'));
        assert!(!s.ends_with(' '));
    }
}

#[test]
fn saturating_incr_wraps_without_noloop() {
    assert_eq!(saturating_incr(10, 0, 10, false), Ok(0));
}

#[test]
fn saturating_incr_signals_exhaustion_under_noloop() {
    assert_eq!(saturating_incr(10, 0, 10, true), Err(CounterError::Exhausted));
}

#[test]
fn saturating_incr_below_high_just_increments() {
    assert_eq!(saturating_incr(3, 0, 10, true), Ok(4));
}

#[test]
fn data_file_loads_and_indexes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::write(&path, "one\ntwo\nthree\n").unwrap();
    let df = DataFile::load(&path).unwrap();
    assert_eq!(df.len(), 3);
    assert_eq!(df.get(1), Some("two"));
    assert!(df.pick_random().is_some());
}
