// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Missing-ancestor creator (§4.7). `add`/`rename` retry exactly once
//! after creating the immediate parent on `NO_SUCH_OBJECT`; this is the
//! recursive worker behind that retry, walking up the DN until it finds
//! (or creates) an ancestor that already exists.

use crate::ldap_client::{LdapClient, OpError};

/// Deduces an `objectClass` from the RDN's attribute name. Returns `None`
/// for any attribute this generator does not know how to default, which
/// callers treat as "give up" (§4.7).
fn object_class_for_rdn_attr(attr: &str) -> Option<&'static str> {
    match attr.to_ascii_lowercase().as_str() {
        "o" => Some("organization"),
        "ou" => Some("organizationalUnit"),
        "cn" => Some("organizationalRole"),
        _ => None,
    }
}

fn parent_dn(dn: &str) -> Option<&str> {
    dn.split_once(',').map(|(_, rest)| rest)
}

fn rdn_attr(dn: &str) -> Option<&str> {
    let rdn = dn.split(',').next()?;
    rdn.split_once('=').map(|(attr, _)| attr)
}

/// Creates every missing ancestor of `dn`, innermost first, so that by the
/// time the caller retries its original operation every parent exists.
/// `ALREADY_EXISTS` from a concurrent creator is treated as success — two
/// racing creators converge on exactly one winner (§8 B.2).
pub fn create_missing_ancestors(dn: &str, client: &mut dyn LdapClient) -> Result<(), OpError> {
    let parent = match parent_dn(dn) {
        Some(p) if !p.is_empty() => p,
        _ => return Err(OpError::NoSuchObject),
    };

    let attr = rdn_attr(parent).ok_or(OpError::NoSuchObject)?;
    let object_class = object_class_for_rdn_attr(attr).ok_or(OpError::NoSuchObject)?;

    match client.add(parent, &[("objectClass".to_owned(), vec![object_class.to_owned()])]) {
        Ok(()) => Ok(()),
        Err(OpError::AlreadyExists) => Ok(()),
        Err(OpError::NoSuchObject) => {
            create_missing_ancestors(parent, client)?;
            match client.add(parent, &[("objectClass".to_owned(), vec![object_class.to_owned()])]) {
                Ok(()) | Err(OpError::AlreadyExists) => Ok(()),
                Err(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "missing_node_tests.rs"]
mod tests;
