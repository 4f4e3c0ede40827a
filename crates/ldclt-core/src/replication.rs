// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation record bookkeeping for the replication checker (§3, §4.11).
//!
//! The original models the op-list as an intrusive singly linked list with
//! a sentinel head, a per-cell mutex, and a manual skip-counter
//! decrement/release dance. Since nothing here needs a `next` pointer a
//! Rust reader could act on directly, it becomes a plain `Arc<OpRecord>`
//! queue with an atomic skip counter: every registered checker thread gets
//! its own clone of the `Arc`, and the last one to decrement the counter
//! to zero is the one that drops the record (§9's re-architecture note).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// LDAP request codes carried in the replication wire format (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Add,
    Delete,
    ModRdn,
    Modify,
}

impl OpKind {
    pub fn from_wire_type(ty: u32) -> Option<Self> {
        match ty {
            0x68 => Some(Self::Add),
            0x4a => Some(Self::Delete),
            0x6c => Some(Self::ModRdn),
            0x66 => Some(Self::Modify),
            _ => None,
        }
    }

    pub fn wire_type(self) -> u32 {
        match self {
            Self::Add => 0x68,
            Self::Delete => 0x4a,
            Self::ModRdn => 0x6c,
            Self::Modify => 0x66,
        }
    }
}

#[derive(Debug)]
pub struct OpRecord {
    pub kind: OpKind,
    pub dn: String,
    pub attrs: Vec<String>,
    pub new_rdn: Option<String>,
    pub new_parent: Option<String>,
    remaining_skips: AtomicUsize,
}

impl OpRecord {
    fn new(kind: OpKind, dn: String, attrs: Vec<String>, new_rdn: Option<String>, new_parent: Option<String>, checker_count: usize) -> Arc<Self> {
        Arc::new(Self {
            kind,
            dn,
            attrs,
            new_rdn,
            new_parent,
            remaining_skips: AtomicUsize::new(checker_count),
        })
    }

    /// Called by a checker thread once it has advanced past this record.
    /// Returns `true` if this call was the last outstanding skip (i.e. the
    /// record's lifetime has ended for every registered checker).
    pub fn mark_passed(&self) -> bool {
        self.remaining_skips.fetch_sub(1, Ordering::AcqRel) == 1
    }
}

/// Shared tail of the operation list: new records are appended here as
/// write operations succeed, with `registered_checkers` seeding each
/// record's skip count.
#[derive(Debug, Default)]
pub struct OpList {
    inner: Mutex<std::collections::VecDeque<Arc<OpRecord>>>,
    registered_checkers: AtomicUsize,
}

impl OpList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_checker(&self) {
        self.registered_checkers.fetch_add(1, Ordering::AcqRel);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record(&self, kind: OpKind, dn: String, attrs: Vec<String>, new_rdn: Option<String>, new_parent: Option<String>) -> Arc<OpRecord> {
        let checkers = self.registered_checkers.load(Ordering::Acquire).max(1);
        let record = OpRecord::new(kind, dn, attrs, new_rdn, new_parent, checkers);
        self.inner.lock().push_back(record.clone());
        record
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Finds the oldest still-outstanding record for `dn`, matching
    /// replication notifications against the op list (§4.11).
    pub fn find_by_dn(&self, dn: &str) -> Option<Arc<OpRecord>> {
        self.inner.lock().iter().find(|r| r.dn == dn).cloned()
    }

    /// A consistent, non-destructive read of every record currently on
    /// the list, in issue order. Each replication checker walks its own
    /// cursor over a snapshot like this rather than destructively
    /// consuming the shared list, since every registered checker must see
    /// every record independently (§4.11).
    pub fn snapshot(&self) -> Vec<Arc<OpRecord>> {
        self.inner.lock().iter().cloned().collect()
    }

    /// Drops every record every checker has fully passed, matching the
    /// original's "last skipper releases the node" cleanup.
    pub fn sweep(&self) {
        self.inner
            .lock()
            .retain(|record| record.remaining_skips.load(Ordering::Acquire) > 0);
    }
}

#[cfg(test)]
#[path = "replication_tests.rs"]
mod tests;
