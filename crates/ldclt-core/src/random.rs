// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Random/format helpers used by template field generators: bounded
//! integers, LDAP-DN-safe random strings, saturating counters and a
//! once-loaded data file.

use std::sync::Arc;

use rand::Rng;

use crate::error::CounterError;

/// Inclusive bounded random integer.
pub fn rand_int(lo: i64, hi: i64) -> i64 {
    if lo >= hi {
        return lo;
    }
    rand::thread_rng().gen_range(lo..=hi)
}

/// Characters an LDAP DN component must quote or avoid: `= ; , + " < > #`.
/// A generated string never starts or ends with them, and never ends with
/// a backslash or a plain space, so it never needs escaping at the edges.
const DN_UNSAFE: &[char] = &['=', ';', ',', '+', '"', '<', '>', '#'];
const DN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Renders a random string of exactly `len` bytes that is always safe to
/// embed in an LDAP DN component without escaping.
pub fn rand_dn_string(len: usize) -> String {
    if len == 0 {
        return String::new();
    }
    let mut rng = rand::thread_rng();
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.gen_range(0..DN_ALPHABET.len());
        out.push(DN_ALPHABET[idx] as char);
    }
    debug_assert!(!out.chars().any(|c| DN_UNSAFE.contains(&c)));
    debug_assert!(!out.ends_with('\\') && !out.ends_with(' '));
    out
}

/// Increments `cur` by one, wrapping to `lo` at `hi`. Under `noloop`,
/// returns `Err(CounterError::Exhausted)` once `hi` is passed instead of
/// wrapping, so the caller can end the run cleanly (§4.4).
pub fn saturating_incr(cur: i64, lo: i64, hi: i64, noloop: bool) -> Result<i64, CounterError> {
    if cur >= hi {
        if noloop {
            return Err(CounterError::Exhausted);
        }
        return Ok(lo);
    }
    Ok(cur + 1)
}

/// A flat text file of newline-separated values, read once and shared
/// read-only across every worker thread.
#[derive(Debug, Clone)]
pub struct DataFile {
    lines: Arc<[String]>,
}

impl DataFile {
    pub fn load(path: &std::path::Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let lines: Vec<String> = contents.lines().map(str::to_owned).collect();
        Ok(Self { lines: lines.into() })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    pub fn pick_random(&self) -> Option<&str> {
        if self.lines.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..self.lines.len());
        self.get(idx)
    }
}

#[cfg(test)]
#[path = "random_tests.rs"]
mod tests;
