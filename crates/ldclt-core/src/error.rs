// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared by the load-generator's support types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("line {line}: {what}")]
    Malformed { line: usize, what: String },
    #[error("unknown field generator {0:?}")]
    UnknownGenerator(String),
    #[error("variable slot {0:?} is out of range (expected 'A'..='H')")]
    BadVarSlot(char),
    #[error("io error reading template: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ImagePoolError {
    #[error("image directory is empty: {0}")]
    Empty(std::path::PathBuf),
    #[error("io error loading image pool: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CounterError {
    #[error("counter exhausted its range under -noloop")]
    Exhausted,
}
