// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker threads (§5). Each worker owns one LDAP connection and runs a
//! tight issue-operation loop until shutdown, the `-T` total-ops budget,
//! the `-E` error threshold, or a fatal initial bind failure stops it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ldclt_core::{AsyncTracker, CommonCounter, LdapClient, OpError};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::{Config, Operation};
use crate::drivers::{self, DriverError};
use crate::error::ExitStatus;
use crate::ldap_client_adapter::Ldap3Client;
use crate::ldif::LdifWriter;
use crate::monitor::ErrorHistogram;

/// Worker lifecycle state, read only through [`Worker::status`] (§5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Free,
    Created,
    Initiated,
    Running,
    Dead,
    MustShutdown,
}

struct WorkerState {
    status: WorkerStatus,
    exit_status: ExitStatus,
}

/// Per-worker counters sampled by the monitor under no additional lock
/// (all fields are atomics, §4.9).
#[derive(Debug, Default)]
pub struct WorkerCounters {
    pub ops_done: AtomicU64,
    pub ops_since_sample: AtomicU64,
    pub errors: AtomicU64,
}

pub struct Worker {
    pub id: usize,
    config: Arc<Config>,
    state: Mutex<WorkerState>,
    pub counters: Arc<WorkerCounters>,
    errors: Arc<ErrorHistogram>,
    counter: Option<CommonCounter>,
}

impl Worker {
    pub fn new(id: usize, config: Arc<Config>, shared_counter: Option<CommonCounter>, errors: Arc<ErrorHistogram>) -> Arc<Self> {
        Arc::new(Self {
            id,
            config,
            state: Mutex::new(WorkerState {
                status: WorkerStatus::Created,
                exit_status: ExitStatus::Ok,
            }),
            counters: Arc::new(WorkerCounters::default()),
            errors,
            counter: shared_counter,
        })
    }

    pub fn status(&self) -> WorkerStatus {
        self.state.lock().status
    }

    pub fn exit_status(&self) -> ExitStatus {
        self.state.lock().exit_status
    }

    fn set_status(&self, status: WorkerStatus) {
        self.state.lock().status = status;
    }

    /// Opens this worker's share of the `-e genldif` output, one file per
    /// worker (`path.N`) so concurrent workers never interleave writes.
    fn open_ldif_writer(&self) -> Option<LdifWriter> {
        if self.config.sub.op != Operation::GenerateLdif {
            return None;
        }
        let base = self.config.sub.genldif_file.as_deref().unwrap_or("ldclt.ldif");
        let path = std::path::PathBuf::from(format!("{base}.{}", self.id));
        match LdifWriter::create(&path) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!(worker = self.id, error = ?e, path = %path.display(), "failed to open genldif output");
                None
            }
        }
    }

    /// Requests shutdown; the worker loop observes this on its next
    /// iteration boundary (§4.10).
    pub fn request_shutdown(&self) {
        let mut state = self.state.lock();
        if state.status != WorkerStatus::Dead {
            state.status = WorkerStatus::MustShutdown;
        }
    }

    fn record_fatal(&self, status: ExitStatus) {
        let mut state = self.state.lock();
        if status > state.exit_status {
            state.exit_status = status;
        }
        state.status = WorkerStatus::Dead;
    }

    /// Runs the worker to completion on the calling thread (§5); intended
    /// to be the body of a dedicated `ldclt-worker-N` thread.
    pub fn run(self: &Arc<Self>) {
        self.set_status(WorkerStatus::Initiated);

        let mut client = match Ldap3Client::connect(&self.config) {
            Ok(c) => c,
            Err(e) => {
                warn!(worker = self.id, error = ?e, "initial connect failed");
                self.record_fatal(ExitStatus::NoBind);
                return;
            }
        };

        if let Some(dn) = self.config.bind_dn.as_deref() {
            let password = self.config.password.as_deref().unwrap_or("");
            if let Err(e) = client.bind(dn, password) {
                warn!(worker = self.id, error = ?e, "initial bind failed");
                self.record_fatal(ExitStatus::NoBind);
                return;
            }
        }

        self.set_status(WorkerStatus::Running);
        let mut tracker = AsyncTracker::new();
        let mut local_counter = self.counter.clone().unwrap_or_else(|| {
            CommonCounter::new(self.config.random_low, self.config.random_high, self.config.sub.noloop)
        });
        let mut ldif = self.open_ldif_writer();

        let mut issued: u64 = 0;
        loop {
            if self.status() == WorkerStatus::MustShutdown {
                break;
            }
            if let Some(budget) = self.config.total_ops {
                if issued >= budget {
                    break;
                }
            }
            if self.counters.errors.load(Ordering::Relaxed) >= u64::from(self.config.max_errors) {
                self.record_fatal(ExitStatus::MaxErrors);
                return;
            }

            match drivers::run_one(&self.config, &mut client, &mut local_counter, &mut tracker, &mut ldif) {
                Ok(()) => {
                    self.counters.ops_done.fetch_add(1, Ordering::Relaxed);
                    self.counters.ops_since_sample.fetch_add(1, Ordering::Relaxed);
                }
                Err(DriverError::Op(op_err)) => {
                    self.on_error(op_err);
                }
                Err(DriverError::ServerDown) => {
                    self.on_error(OpError::ServerDown);
                    if !self.config.sub.dontsleeponserverdown {
                        std::thread::sleep(std::time::Duration::from_secs(1));
                    }
                }
                Err(DriverError::NoLoopExhausted) => break,
            }
            issued += 1;
        }

        debug!(worker = self.id, issued, "worker loop exiting");
        drivers::drain_all(&self.config, &mut client, &mut tracker);
        let _ = client.unbind();
        self.set_status(WorkerStatus::Dead);
    }

    fn on_error(&self, err: OpError) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        let code = match err {
            OpError::Other(c) => c,
            OpError::NoSuchObject => 32,
            OpError::AlreadyExists => 68,
            OpError::ProtocolError => 2,
            OpError::ServerDown => -1,
        };
        if !self.config.ignore_errors.contains(&code) {
            self.errors.record(code);
        }
    }
}
