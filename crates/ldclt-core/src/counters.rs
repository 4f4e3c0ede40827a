// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared monotonic counter for `-e commoncounter` template fields: every
//! worker draws from the same sequence instead of a private per-field one,
//! so draws across all workers form a contiguous, no-duplicate permutation
//! up to the high bound (§8 B.1).

use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy)]
struct CounterState {
    current: i64,
    low: i64,
    high: i64,
    noloop: bool,
    started: bool,
}

#[derive(Debug, Clone)]
pub struct CommonCounter {
    state: Arc<Mutex<CounterState>>,
}

impl CommonCounter {
    pub fn new(low: i64, high: i64, noloop: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(CounterState {
                current: low,
                low,
                high,
                noloop,
                started: false,
            })),
        }
    }

    /// Draws the next value in the shared sequence. Returns `None` once the
    /// range under `noloop` is exhausted.
    pub fn next(&self) -> Option<i64> {
        let mut state = self.state.lock();
        if !state.started {
            state.started = true;
            return Some(state.current);
        }
        if state.current >= state.high {
            if state.noloop {
                return None;
            }
            state.current = state.low;
            return Some(state.current);
        }
        state.current += 1;
        Some(state.current)
    }
}

#[cfg(test)]
#[path = "counters_tests.rs"]
mod tests;
