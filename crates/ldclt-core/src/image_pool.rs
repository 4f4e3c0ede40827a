// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image pool for `[HOW(image)]` template fields: a directory of opaque
//! blobs loaded once at startup and handed out round-robin.
//!
//! The original reads each file with `mmap(2)`. This workspace's lint
//! policy disfavors `unsafe`, so blobs are loaded eagerly with
//! `std::fs::read` into a shared `Arc<[u8]>` instead of a true memory
//! mapping; callers observe the same read-only, shared, zero-copy-on-clone
//! semantics either way.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ImagePoolError;

#[derive(Debug, Clone)]
pub struct ImagePool {
    images: Arc<[Arc<[u8]>]>,
    next: Arc<Mutex<usize>>,
}

impl ImagePool {
    pub fn load(dir: &Path) -> Result<Self, ImagePoolError> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .collect();
        entries.sort_by_key(|e| e.path());

        let mut images = Vec::with_capacity(entries.len());
        for entry in entries {
            let bytes = std::fs::read(entry.path())?;
            images.push(Arc::from(bytes));
        }
        if images.is_empty() {
            return Err(ImagePoolError::Empty(dir.to_path_buf()));
        }
        Ok(Self {
            images: images.into(),
            next: Arc::new(Mutex::new(0)),
        })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Hands out the next blob round-robin, guarded by a single mutex
    /// around the cursor (§5).
    pub fn next(&self) -> Arc<[u8]> {
        let mut idx = self.next.lock();
        let image = self.images[*idx].clone();
        *idx = (*idx + 1) % self.images.len();
        image
    }
}

#[cfg(test)]
#[path = "image_pool_tests.rs"]
mod tests;
