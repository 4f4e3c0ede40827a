// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter from `ldclt_core::LdapClient` onto the real `ldap3` crate
//! (§1's "LDAP client" and "cryptographic/TLS stack" external
//! collaborators). Uses `ldap3`'s `sync` feature, which itself drives a
//! per-connection Tokio runtime internally — from this crate's point of
//! view the call surface is synchronous, matching Core B's
//! thread-per-worker model (§5).

use std::collections::HashSet;

use ldap3::{LdapConn, LdapConnSettings, Mod, Scope, SearchEntry as Ldap3SearchEntry};
use ldclt_core::{Attr, LdapClient, OpError, SearchEntry};

use crate::config::{Config, SearchScope};

pub struct Ldap3Client {
    conn: LdapConn,
}

impl Ldap3Client {
    pub fn connect(config: &Config) -> Result<Self, OpError> {
        let url = format!("ldap://{}:{}", config.host, config.port);
        let mut settings = LdapConnSettings::new();
        if config.cert_file.is_some() {
            settings = settings.set_no_tls_verify(false);
        }
        let url = url::Url::parse(&url).map_err(|_| OpError::ServerDown)?;
        let conn = LdapConn::from_url_with_settings(settings, &url).map_err(|_| OpError::ServerDown)?;
        Ok(Self { conn })
    }

    fn map_result(res: ldap3::LdapResult) -> Result<(), OpError> {
        match OpError::from_result_code(res.rc as i32) {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    fn scope(scope: SearchScope) -> Scope {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::One => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }

    pub fn search_with_scope(&mut self, base: &str, scope: SearchScope, filter: &str) -> Result<Vec<SearchEntry>, OpError> {
        let (results, _) = self
            .conn
            .search(base, Self::scope(scope), filter, vec!["*"])
            .and_then(|r| r.success())
            .map_err(|_| OpError::ServerDown)?;
        Ok(results
            .into_iter()
            .map(Ldap3SearchEntry::construct)
            .map(|e| SearchEntry {
                dn: e.dn,
                attrs: e.attrs.into_iter().collect(),
            })
            .collect())
    }
}

impl LdapClient for Ldap3Client {
    fn bind(&mut self, dn: &str, password: &str) -> Result<(), OpError> {
        let res = self.conn.simple_bind(dn, password).map_err(|_| OpError::ServerDown)?;
        Self::map_result(res)
    }

    fn add(&mut self, dn: &str, attrs: &[Attr]) -> Result<(), OpError> {
        let owned: Vec<(&str, HashSet<&str>)> = attrs
            .iter()
            .map(|(k, vs)| (k.as_str(), vs.iter().map(String::as_str).collect()))
            .collect();
        let res = self.conn.add(dn, owned).map_err(|_| OpError::ServerDown)?;
        Self::map_result(res)
    }

    fn delete(&mut self, dn: &str) -> Result<(), OpError> {
        let res = self.conn.delete(dn).map_err(|_| OpError::ServerDown)?;
        Self::map_result(res)
    }

    fn modify_replace(&mut self, dn: &str, attr: &str, values: &[String]) -> Result<(), OpError> {
        let value_set: HashSet<&str> = values.iter().map(String::as_str).collect();
        let res = self
            .conn
            .modify(dn, vec![Mod::Replace(attr, value_set)])
            .map_err(|_| OpError::ServerDown)?;
        Self::map_result(res)
    }

    fn rename(&mut self, dn: &str, new_rdn: &str, new_parent: Option<&str>) -> Result<(), OpError> {
        let res = self
            .conn
            .modifydn(dn, new_rdn, true, new_parent)
            .map_err(|_| OpError::ServerDown)?;
        Self::map_result(res)
    }

    fn search(&mut self, base: &str, filter: &str) -> Result<Vec<SearchEntry>, OpError> {
        self.search_with_scope(base, SearchScope::Subtree, filter)
    }

    fn abandon(&mut self, msgid: i32) -> Result<(), OpError> {
        self.conn.abandon(msgid).map_err(|_| OpError::ServerDown)
    }

    fn unbind(&mut self) -> Result<(), OpError> {
        self.conn.unbind().map_err(|_| OpError::ServerDown)
    }
}
