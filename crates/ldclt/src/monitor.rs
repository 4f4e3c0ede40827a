// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Statistics sampling and the inactivity/error watchdog (§4.9).
//!
//! Per-worker op counters are sampled and zeroed every `-N`-style interval;
//! `inactivityMax` consecutive zero samples marks a worker inactive.
//! Errors accumulate into a process-wide histogram behind one mutex,
//! tripping `ExitStatus::MaxErrors` once `-E` is exceeded (checked by the
//! worker loop itself, not here — this module only records and reports).

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use crate::config::Config;
use crate::workers::Worker;

const MAX_ERROR_NB: usize = 128;

/// Process-wide error histogram indexed by (clamped) LDAP result code
/// (§5). Negative/out-of-range codes collapse into the last bucket.
#[derive(Debug)]
pub struct ErrorHistogram {
    counts: Mutex<[u32; MAX_ERROR_NB]>,
}

impl Default for ErrorHistogram {
    fn default() -> Self {
        Self {
            counts: Mutex::new([0; MAX_ERROR_NB]),
        }
    }
}

impl ErrorHistogram {
    fn bucket(code: i32) -> usize {
        if code < 0 || code as usize >= MAX_ERROR_NB {
            MAX_ERROR_NB - 1
        } else {
            code as usize
        }
    }

    pub fn record(&self, code: i32) {
        let mut counts = self.counts.lock();
        counts[Self::bucket(code)] += 1;
        warn!(code, "ldap error");
    }

    pub fn total(&self) -> u64 {
        self.counts.lock().iter().map(|&c| u64::from(c)).sum()
    }

    pub fn snapshot(&self) -> [u32; MAX_ERROR_NB] {
        *self.counts.lock()
    }
}

/// Tracks consecutive zero-op samples per worker, declaring it inactive
/// once `inactivityMax` is reached (§4.9).
struct InactivityTracker {
    zero_streaks: Vec<u32>,
}

impl InactivityTracker {
    fn new(worker_count: usize) -> Self {
        Self {
            zero_streaks: vec![0; worker_count],
        }
    }

    /// Returns the worker indices newly observed as inactive this sample.
    fn observe(&mut self, samples: &[u64], max: u32) -> Vec<usize> {
        let mut newly_inactive = Vec::new();
        for (idx, &ops) in samples.iter().enumerate() {
            if ops == 0 {
                self.zero_streaks[idx] += 1;
                if self.zero_streaks[idx] == max {
                    newly_inactive.push(idx);
                }
            } else {
                self.zero_streaks[idx] = 0;
            }
        }
        newly_inactive
    }
}

/// Runs the sampling loop on the calling thread until every worker is
/// `Dead`. Intended as the body of a dedicated monitor thread started
/// from `main`.
pub fn run(config: &Config, workers: &[Arc<Worker>], errors: &Arc<ErrorHistogram>) {
    let mut inactivity = InactivityTracker::new(workers.len());
    let sample_period = Duration::from_secs(1);
    let mut samples_taken: u64 = 0;

    loop {
        std::thread::sleep(sample_period);

        let samples: Vec<u64> = workers
            .iter()
            .map(|w| w.counters.ops_since_sample.swap(0, Ordering::Relaxed))
            .collect();

        for idx in inactivity.observe(&samples, config.inactivity_max) {
            warn!(worker = idx, "worker inactive");
        }

        samples_taken += 1;
        if config.sample_budget != u32::MAX && samples_taken >= u64::from(config.sample_budget) {
            break;
        }
        if workers.iter().all(|w| matches!(w.status(), crate::workers::WorkerStatus::Dead)) {
            break;
        }
    }

    if !config.sub.noglobalstats {
        print_global_stats(workers, errors);
    }
}

pub fn print_global_stats(workers: &[Arc<Worker>], errors: &Arc<ErrorHistogram>) {
    let total_ops: u64 = workers.iter().map(|w| w.counters.ops_done.load(Ordering::Relaxed)).sum();
    let total_errors = errors.total();
    eprintln!("ldclt: total operations={total_ops} total errors={total_errors}");
}
