// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result codes returned by every job-engine API entry point.
//!
//! Mirrors `ns_result_t`: the engine never aborts the process on a
//! caller-side contract violation, it returns a distinct error kind and
//! leaves the job's state untouched.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The pool is shutting down or has already shut down; the request was rejected.
    #[error("pool is shutting down")]
    Shutdown,
    /// Allocation through the configured `AllocHooks` failed.
    #[error("allocation failure")]
    AllocationFailure,
    /// The request itself is malformed (e.g. ACCEPT|THREAD).
    #[error("invalid request")]
    InvalidRequest,
    /// The job is not in a state that permits this request.
    #[error("invalid state for this request")]
    InvalidState,
    /// An OS-level thread operation failed.
    #[error("thread failure")]
    ThreadFailure,
    /// The job is being deleted and may not be touched further.
    #[error("job is being deleted")]
    Deleting,
}
