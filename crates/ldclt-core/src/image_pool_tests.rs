// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn load_rejects_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(ImagePool::load(dir.path()), Err(ImagePoolError::Empty(_))));
}

#[test]
fn round_robin_cycles_through_every_image() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.jpg"), b"aaa").unwrap();
    std::fs::write(dir.path().join("b.jpg"), b"bbb").unwrap();
    let pool = ImagePool::load(dir.path()).unwrap();
    assert_eq!(pool.len(), 2);

    let first = pool.next();
    let second = pool.next();
    let third = pool.next();
    assert_ne!(*first, *second);
    assert_eq!(*first, *third);
}
