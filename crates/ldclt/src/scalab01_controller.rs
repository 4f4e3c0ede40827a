// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scalab01 controller thread (§4.12). Ticks the shared session queue
//! once a second, releasing the modem slot and DN lock for every session
//! that expires and charging back the configured accounting attribute.

use std::sync::Arc;
use std::time::Duration;

use ldclt_core::{LdapClient, LoginGuard, ModemPool, SessionQueue};
use tracing::debug;

use crate::config::Config;
use crate::ldap_client_adapter::Ldap3Client;

pub struct Scalab01State {
    pub modems: ModemPool,
    pub logins: LoginGuard,
    pub sessions: SessionQueue,
}

impl Scalab01State {
    pub fn new(max_connections: usize) -> Self {
        Self {
            modems: ModemPool::new(max_connections),
            logins: LoginGuard::new(),
            sessions: SessionQueue::new(),
        }
    }
}

/// Runs the once-a-second tick loop on the calling thread until
/// `should_stop` returns true. Intended as the body of a dedicated
/// `ldclt-scalab01` thread started whenever `-e scalab01` is set.
pub fn run(config: &Config, state: &Arc<Scalab01State>, client: &mut Ldap3Client, should_stop: impl Fn() -> bool) {
    let accounting_attr = config
        .sub
        .attreplace
        .as_ref()
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "loginCount".to_owned());

    loop {
        std::thread::sleep(Duration::from_secs(1));
        if should_stop() {
            return;
        }
        for dn in state.sessions.tick() {
            if let Err(e) = client.modify_replace(&dn, &accounting_attr, &["0".to_owned()]) {
                debug!(?e, dn, "scalab01 accounting charge-back failed");
            }
            state.logins.release(&dn);
            state.modems.release();
        }
    }
}
