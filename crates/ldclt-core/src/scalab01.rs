// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain types for the scalab01 session-lifecycle simulator (§4.12, §5).
//! The controller thread that ticks these once a second lives in the
//! `ldclt` binary crate; this module only owns the shared state it reads
//! and mutates: a bounded modem-pool counter, the set of DNs currently
//! mid-login, and a min-queue of session expirations.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

/// Bounded counter of "currently connected" sessions (§4.12's modem pool).
#[derive(Debug)]
pub struct ModemPool {
    in_use: AtomicUsize,
    max: usize,
}

impl ModemPool {
    pub fn new(max: usize) -> Self {
        Self {
            in_use: AtomicUsize::new(0),
            max,
        }
    }

    /// Attempts to claim a slot; `false` if the pool is already full.
    pub fn try_acquire(&self) -> bool {
        loop {
            let cur = self.in_use.load(Ordering::Acquire);
            if cur >= self.max {
                return false;
            }
            if self
                .in_use
                .compare_exchange(cur, cur + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    pub fn release(&self) {
        self.in_use.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }
}

/// DNs currently mid-login, standing in for the original's fixed-size
/// mutual-exclusion array (§4.12).
#[derive(Debug, Default)]
pub struct LoginGuard {
    logging_in: Mutex<HashSet<String>>,
}

impl LoginGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `dn` was not already logging in and is now claimed.
    pub fn try_claim(&self, dn: &str) -> bool {
        self.logging_in.lock().insert(dn.to_owned())
    }

    pub fn release(&self, dn: &str) {
        self.logging_in.lock().remove(dn);
    }
}

/// One active session, ordered by soonest expiration for the controller's
/// min-queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub dn: String,
    pub remaining_secs: u64,
}

#[derive(Debug, Default)]
pub struct SessionQueue {
    queue: Mutex<BinaryHeap<Reverse<(u64, String)>>>,
}

impl SessionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, session: Session) {
        self.queue.lock().push(Reverse((session.remaining_secs, session.dn)));
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Decrements every session's remaining time by one tick and returns
    /// the DNs that expired this tick, releasing their modem slot and DN
    /// lock is the controller's job, not this queue's (§4.12).
    pub fn tick(&self) -> Vec<String> {
        let mut queue = self.queue.lock();
        let mut rest = Vec::with_capacity(queue.len());
        let mut expired = Vec::new();
        while let Some(Reverse((remaining, dn))) = queue.pop() {
            if remaining <= 1 {
                expired.push(dn);
            } else {
                rest.push(Reverse((remaining - 1, dn)));
            }
        }
        *queue = rest.into_iter().collect();
        expired
    }
}

#[cfg(test)]
#[path = "scalab01_tests.rs"]
mod tests;
