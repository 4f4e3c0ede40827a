// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MPSC work queue draining into the worker pool (§4.2).
//!
//! Producers are the event thread (jobs that just fired) and workers
//! themselves (jobs a callback marked `done`, handed off for
//! finalization). Consumers are the fixed worker threads, which share one
//! receiver behind a mutex — dequeue is a blocking operation by design, so
//! the lock is never held across anything but the `recv` call itself.

use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::job::JobHandle;

pub(crate) enum WorkItem {
    Job(JobHandle),
    /// Exactly `N` of these are ever sent, one per worker, by `Pool::shutdown`.
    ShutdownWorker,
}

#[derive(Clone)]
pub(crate) struct WorkQueue {
    sender: mpsc::Sender<WorkItem>,
    receiver: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
}

impl WorkQueue {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    pub(crate) fn push(&self, item: WorkItem) {
        // A closed receiver only happens after every worker has exited,
        // which only follows `pool_wait`; nothing should still be pushing.
        let _ = self.sender.send(item);
    }

    /// Blocks until an item is available.
    pub(crate) fn pop(&self) -> Option<WorkItem> {
        self.receiver.lock().recv().ok()
    }
}
