// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The LDAP client surface Core B drives operations through (§1's "LDAP
//! client" external collaborator). Kept trait-object-safe and
//! `ldap3`-free here so the missing-node creator can depend on it without
//! pulling in a wire/TLS stack; the concrete adapter over `ldap3` lives in
//! the `ldclt` binary crate, which is the only place that needs it.

use thiserror::Error;

/// LDAP result codes this codebase branches on by name (§4.6, §4.7).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OpError {
    #[error("no such object (32)")]
    NoSuchObject,
    #[error("already exists (68)")]
    AlreadyExists,
    #[error("protocol error (2)")]
    ProtocolError,
    #[error("server is down")]
    ServerDown,
    #[error("ldap result code {0}")]
    Other(i32),
}

impl OpError {
    pub fn from_result_code(code: i32) -> Option<Self> {
        match code {
            0 => None,
            32 => Some(Self::NoSuchObject),
            68 => Some(Self::AlreadyExists),
            2 => Some(Self::ProtocolError),
            other => Some(Self::Other(other)),
        }
    }
}

/// A single attribute with its values, as `add` and `modify` take them.
pub type Attr = (String, Vec<String>);

/// One hit from a `search` call.
#[derive(Debug, Clone)]
pub struct SearchEntry {
    pub dn: String,
    pub attrs: Vec<Attr>,
}

/// The synchronous half of the LDAP call surface. An adapter over `ldap3`
/// implements this for real connections; tests implement it for fakes.
pub trait LdapClient {
    fn bind(&mut self, dn: &str, password: &str) -> Result<(), OpError>;
    fn add(&mut self, dn: &str, attrs: &[Attr]) -> Result<(), OpError>;
    fn delete(&mut self, dn: &str) -> Result<(), OpError>;
    fn modify_replace(&mut self, dn: &str, attr: &str, values: &[String]) -> Result<(), OpError>;
    fn rename(&mut self, dn: &str, new_rdn: &str, new_parent: Option<&str>) -> Result<(), OpError>;
    fn search(&mut self, base: &str, filter: &str) -> Result<Vec<SearchEntry>, OpError>;
    fn abandon(&mut self, msgid: i32) -> Result<(), OpError>;
    fn unbind(&mut self) -> Result<(), OpError>;
}
