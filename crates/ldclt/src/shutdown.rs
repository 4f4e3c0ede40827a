// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinated shutdown (§4.10). Signals every worker, optionally waits
//! for them to drain under `-e smoothshutdown`, and aggregates exit
//! statuses by "max wins" into the process exit code (§7).

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::config::Config;
use crate::error::ExitStatus;
use crate::workers::{Worker, WorkerStatus};

const SMOOTH_SHUTDOWN_POLLS: u32 = 20;

/// Requests shutdown on every worker and, under `-e smoothshutdown`, polls
/// for up to 20 seconds for all of them to reach `Dead` before returning.
/// Returns the aggregated exit status across every worker (§4.10, §7).
pub fn shutdown_workers(config: &Config, workers: &[Arc<Worker>]) -> ExitStatus {
    for worker in workers {
        worker.request_shutdown();
    }

    if config.sub.smoothshutdown {
        for _ in 0..SMOOTH_SHUTDOWN_POLLS {
            if workers.iter().all(|w| w.status() == WorkerStatus::Dead) {
                break;
            }
            std::thread::sleep(Duration::from_secs(1));
        }
        let stragglers: Vec<usize> = workers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.status() != WorkerStatus::Dead)
            .map(|(idx, _)| idx)
            .collect();
        if !stragglers.is_empty() {
            warn!(?stragglers, "workers did not reach Dead within smooth shutdown window");
        }
    }

    workers.iter().map(|w| w.exit_status()).max().unwrap_or(ExitStatus::Ok)
}
