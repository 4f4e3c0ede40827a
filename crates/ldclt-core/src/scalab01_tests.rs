// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn modem_pool_rejects_past_capacity() {
    let pool = ModemPool::new(2);
    assert!(pool.try_acquire());
    assert!(pool.try_acquire());
    assert!(!pool.try_acquire());
    pool.release();
    assert!(pool.try_acquire());
}

#[test]
fn login_guard_rejects_double_claim() {
    let guard = LoginGuard::new();
    assert!(guard.try_claim("uid=bob"));
    assert!(!guard.try_claim("uid=bob"));
    guard.release("uid=bob");
    assert!(guard.try_claim("uid=bob"));
}

#[test]
fn session_queue_expires_in_order() {
    let queue = SessionQueue::new();
    queue.push(Session { dn: "a".into(), remaining_secs: 1 });
    queue.push(Session { dn: "b".into(), remaining_secs: 2 });
    assert_eq!(queue.tick(), vec!["a".to_owned()]);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.tick(), vec!["b".to_owned()]);
    assert!(queue.is_empty());
}
