// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LDIF writer for `-e genldif` (§6). `dn:`/`attr:` lines with a blank
//! line separating entries, behind a 64 KiB buffer flushed when full and
//! at process exit (`Drop`).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use ldclt_core::Attr;

const BUFFER_CAPACITY: usize = 64 * 1024;

pub struct LdifWriter {
    out: BufWriter<File>,
}

impl LdifWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::with_capacity(BUFFER_CAPACITY, file),
        })
    }

    pub fn write_entry(&mut self, dn: &str, attrs: &[Attr]) -> io::Result<()> {
        writeln!(self.out, "dn: {dn}")?;
        for (name, values) in attrs {
            for value in values {
                writeln!(self.out, "{name}: {value}")?;
            }
        }
        writeln!(self.out)?;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Drop for LdifWriter {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}

#[cfg(test)]
#[path = "ldif_tests.rs"]
mod tests;
