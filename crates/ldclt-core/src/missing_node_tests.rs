// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::ldap_client::SearchEntry;
use std::collections::HashSet;

#[derive(Default)]
struct FakeClient {
    existing: HashSet<String>,
    add_calls: Vec<String>,
}

impl LdapClient for FakeClient {
    fn bind(&mut self, _dn: &str, _password: &str) -> Result<(), OpError> {
        Ok(())
    }

    fn add(&mut self, dn: &str, _attrs: &[(String, Vec<String>)]) -> Result<(), OpError> {
        self.add_calls.push(dn.to_owned());
        if self.existing.contains(dn) {
            return Err(OpError::AlreadyExists);
        }
        let parent = dn.split_once(',').map(|(_, p)| p).unwrap_or("");
        if !parent.is_empty() && !self.existing.contains(parent) {
            return Err(OpError::NoSuchObject);
        }
        self.existing.insert(dn.to_owned());
        Ok(())
    }

    fn delete(&mut self, _dn: &str) -> Result<(), OpError> {
        Ok(())
    }

    fn modify_replace(&mut self, _dn: &str, _attr: &str, _values: &[String]) -> Result<(), OpError> {
        Ok(())
    }

    fn rename(&mut self, _dn: &str, _new_rdn: &str, _new_parent: Option<&str>) -> Result<(), OpError> {
        Ok(())
    }

    fn search(&mut self, _base: &str, _filter: &str) -> Result<Vec<SearchEntry>, OpError> {
        Ok(vec![])
    }

    fn abandon(&mut self, _msgid: i32) -> Result<(), OpError> {
        Ok(())
    }

    fn unbind(&mut self) -> Result<(), OpError> {
        Ok(())
    }
}

#[test]
fn creates_single_missing_parent() {
    let mut client = FakeClient::default();
    client.existing.insert("ou=people,o=example".to_owned());
    create_missing_ancestors("uid=bob,ou=people,o=example", &mut client).unwrap();
    assert!(client.existing.contains("ou=people,o=example"));
}

#[test]
fn recurses_through_multiple_missing_ancestors() {
    let mut client = FakeClient::default();
    client.existing.insert("o=example".to_owned());
    create_missing_ancestors("uid=bob,ou=eng,ou=people,o=example", &mut client).unwrap();
    assert!(client.existing.contains("ou=people,o=example"));
    assert!(client.existing.contains("ou=eng,ou=people,o=example"));
}

#[test]
fn already_exists_from_a_concurrent_creator_is_success() {
    let mut client = FakeClient::default();
    client.existing.insert("ou=people,o=example".to_owned());
    client.existing.insert("ou=eng,ou=people,o=example".to_owned());
    assert!(create_missing_ancestors("uid=bob,ou=eng,ou=people,o=example", &mut client).is_ok());
}

#[test]
fn unknown_rdn_attribute_gives_up() {
    let mut client = FakeClient::default();
    let err = create_missing_ancestors("uid=bob,dc=example,dc=com", &mut client).unwrap_err();
    assert_eq!(err, OpError::NoSuchObject);
}
