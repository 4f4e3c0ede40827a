// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replication checker (§4.11). Accepts one connection per slave on
//! `-P masterPort`; each connection gets its own OS thread reading the
//! 12-byte wire header `(type: u32, result: u32, dnSize: u32)` followed
//! by `dnSize` raw DN bytes, matched against the shared [`OpList`].
//!
//! Each checker thread keeps its own cursor over a non-destructive
//! snapshot of the op list: a hit at the cursor advances it; a hit ahead
//! of the cursor flags every record skipped over as *early* and advances
//! past it; no hit anywhere is *not-on-list*. The original's per-checker
//! leader/middle/last late-list markers collapse into this single cursor
//! since nothing downstream inspects a record's position within the late
//! window, only whether it was ultimately seen.

use std::collections::HashMap;
use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use ldclt_core::{OpKind, OpList, OpRecord};
use tracing::{debug, warn};

/// Outcome of matching one wire notification against the op list (§8 B.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    NotOnList,
    StillOnQueue,
    ReplicaFailed(i32),
}

/// Per-connection matching state (§4.11's per-checker cursor plus the
/// late list it spills skipped-over records into).
pub struct Checker {
    cursor: usize,
    late: HashMap<(OpKind, String), ()>,
}

impl Checker {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            late: HashMap::new(),
        }
    }

    /// Classifies one incoming `(kind, dn, result)` notification against
    /// `ops`. A notification the cursor has already skipped past (because
    /// an out-of-order sibling matched first) is recognised via the late
    /// list instead of falling through to *not-on-list*. Returns the
    /// outcome for this record plus the DNs of any records newly flagged
    /// early while searching for it.
    pub fn classify(&mut self, ops: &OpList, kind: OpKind, dn: &str, result: u32) -> (MatchOutcome, Vec<String>) {
        if self.late.remove(&(kind, dn.to_owned())).is_some() {
            return (classify_result(result), Vec::new());
        }

        let snapshot = ops.snapshot();
        let hit = snapshot
            .iter()
            .enumerate()
            .skip(self.cursor)
            .find(|(_, r)| r.kind == kind && r.dn == dn);

        let Some((pos, record)) = hit else {
            return (MatchOutcome::NotOnList, Vec::new());
        };

        let early: Vec<String> = snapshot[self.cursor..pos].iter().map(|r| r.dn.clone()).collect();
        for skipped in &snapshot[self.cursor..pos] {
            self.late.insert((skipped.kind, skipped.dn.clone()), ());
            skipped.mark_passed();
        }
        let outcome = classify_result(result);
        if record.mark_passed() {
            ops.sweep();
        }
        self.cursor = pos + 1;
        (outcome, early)
    }

    /// Flags every record this checker never reached as `still-on-queue`,
    /// called once the connection closes (§4.11).
    pub fn drain_remaining(&mut self, ops: &OpList) -> Vec<Arc<OpRecord>> {
        let snapshot = ops.snapshot();
        let remaining: Vec<_> = snapshot.into_iter().skip(self.cursor).collect();
        for record in &remaining {
            if record.mark_passed() {
                ops.sweep();
            }
        }
        self.cursor += remaining.len();
        remaining
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_result(result: u32) -> MatchOutcome {
    match result {
        0 => MatchOutcome::Matched,
        32 => MatchOutcome::ReplicaFailed(32),
        68 => MatchOutcome::ReplicaFailed(68),
        other => MatchOutcome::ReplicaFailed(other as i32),
    }
}

fn read_header(stream: &mut TcpStream) -> std::io::Result<(u32, u32, u32)> {
    let mut buf = [0u8; 12];
    stream.read_exact(&mut buf)?;
    let ty = u32::from_be_bytes(buf[0..4].try_into().unwrap_or_default());
    let result = u32::from_be_bytes(buf[4..8].try_into().unwrap_or_default());
    let dn_size = u32::from_be_bytes(buf[8..12].try_into().unwrap_or_default());
    Ok((ty, result, dn_size))
}

fn handle_connection(mut stream: TcpStream, ops: Arc<OpList>) {
    ops.register_checker();
    let mut checker = Checker::new();
    loop {
        let (ty, result, dn_size) = match read_header(&mut stream) {
            Ok(h) => h,
            Err(_) => {
                let stranded = checker.drain_remaining(&ops);
                debug!(count = stranded.len(), "replication connection closed, entries still on queue");
                return;
            }
        };
        let mut dn_bytes = vec![0u8; dn_size as usize];
        if stream.read_exact(&mut dn_bytes).is_err() {
            checker.drain_remaining(&ops);
            return;
        }
        let dn = String::from_utf8_lossy(&dn_bytes).into_owned();
        let Some(kind) = OpKind::from_wire_type(ty) else {
            warn!(ty, "unknown replication op type");
            continue;
        };

        let (outcome, early) = checker.classify(&ops, kind, &dn, result);
        debug!(?outcome, dn, early_count = early.len(), "replication notification classified");
    }
}

/// Runs the accept loop on the calling thread, blocking forever. Intended
/// as the body of a dedicated `ldclt-replication` thread started from
/// `main` whenever `-P` is set.
pub fn run(port: u16, ops: Arc<OpList>) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let ops = ops.clone();
                std::thread::spawn(move || handle_connection(stream, ops));
            }
            Err(e) => warn!(error = ?e, "replication accept failed"),
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "replication_checker_tests.rs"]
mod tests;
