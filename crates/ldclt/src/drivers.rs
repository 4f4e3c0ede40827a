// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation drivers (§4.6). One function per operation, dispatched by
//! [`crate::config::Operation`]; each carries the same framing: a
//! `-e bindeach` worker tears down and rebuilds its connection before every
//! operation, the active entry/RDN is rendered through whichever template
//! is configured (`-e object=file` when present, else the `-f` filter
//! pattern), and `add`/`rename` retry once after creating a missing parent
//! on `NO_SUCH_OBJECT`.
//!
//! `-a asyncMax` pipelines `add` by deferring the wire call: issuing an
//! entry enqueues it on the worker's [`AsyncTracker`] instead of sending it
//! immediately, and the oldest enqueued entries are actually sent once the
//! outstanding count runs past `asyncMax`, down to `asyncMax`'s midpoint.
//! `issued - completed` therefore equals the tracker's length at every
//! point in between, which is what makes the outstanding count observable
//! at all against a client whose wire calls are otherwise fully
//! synchronous. Full SASL mechanism dispatch, protocol-version selection
//! and referral chasing are out of scope here: the adapter this module
//! drives only ever does simple/anonymous binds (see
//! [`crate::ldap_client_adapter::Ldap3Client`]).

use ldclt_core::{
    create_missing_ancestors, Attr, AsyncTracker, CommonCounter, LdapClient, ObjectScope, OpError, TemplateFile,
};
use tracing::warn;

use crate::config::{Config, Operation};
use crate::filter::FilterTemplate;
use crate::ldap_client_adapter::Ldap3Client;
use crate::ldif::LdifWriter;

#[derive(Debug)]
pub enum DriverError {
    Op(OpError),
    ServerDown,
    /// A NOLOOP counter or template field ran out; the worker ends cleanly
    /// rather than treating this as a failure (§4.4).
    NoLoopExhausted,
}

impl From<OpError> for DriverError {
    fn from(e: OpError) -> Self {
        match e {
            OpError::ServerDown => DriverError::ServerDown,
            other => DriverError::Op(other),
        }
    }
}

/// Builds the `-f` filter pattern in effect: the configured one, or a
/// default sized to the configured `-r`/`-R` range's digit width (§6).
fn filter_template(config: &Config) -> FilterTemplate {
    let width = crate::filter::digit_width(config.random_high);
    let pattern = config
        .filter
        .clone()
        .unwrap_or_else(|| format!("cn=entry{}", "X".repeat(width)));
    FilterTemplate::parse(&pattern)
}

fn next_dn(config: &Config, counter: &mut CommonCounter) -> Result<String, DriverError> {
    let n = counter.next().ok_or(DriverError::NoLoopExhausted)?;
    Ok(format!("{},{}", filter_template(config).render(n), config.base_dn))
}

fn attrs_for(dn: &str) -> Vec<Attr> {
    vec![
        ("objectClass".to_owned(), vec!["top".to_owned(), "person".to_owned()]),
        ("cn".to_owned(), vec![dn.to_owned()]),
        ("sn".to_owned(), vec![dn.to_owned()]),
    ]
}

/// Renders one entry's DN and attributes, through the `-e object=file`
/// template when one is configured, else the `-f` filter plus the fixed
/// `person`-shaped default attribute set (§4.5, §6).
fn render_entry(config: &Config, counter: &mut CommonCounter) -> Result<(String, Vec<Attr>), DriverError> {
    match &config.template {
        Some(template) => render_from_template(template, config),
        None => {
            let dn = next_dn(config, counter)?;
            let attrs = attrs_for(&dn);
            Ok((dn, attrs))
        }
    }
}

fn render_from_template(template: &TemplateFile, config: &Config) -> Result<(String, Vec<Attr>), DriverError> {
    let mut scope = ObjectScope::default();
    let mut rdn = None;
    let mut attrs = Vec::with_capacity(template.attributes.len());
    for field in &template.attributes {
        let value = field.render(&mut scope).map_err(|_| DriverError::NoLoopExhausted)?;
        if field.is_rdn() {
            rdn = Some(value);
        } else {
            attrs.push((field.name.clone(), vec![value]));
        }
    }
    let rdn = rdn.unwrap_or_else(|| "cn=entry".to_owned());
    Ok((format!("{rdn},{}", config.base_dn), attrs))
}

/// Issues exactly one operation per the configured `-e` mode, returning
/// once it (and any missing-node retry it triggered) completes.
pub fn run_one(
    config: &Config,
    client: &mut Ldap3Client,
    counter: &mut CommonCounter,
    tracker: &mut AsyncTracker,
    ldif: &mut Option<LdifWriter>,
) -> Result<(), DriverError> {
    apply_framing(config, client)?;
    match config.sub.op {
        Operation::Add => add(config, client, counter, tracker),
        Operation::Delete => delete(config, client, counter),
        Operation::ModifyReplace => modify_replace(config, client, counter),
        Operation::Rename => rename(config, client, counter),
        Operation::Search => search(config, client),
        Operation::Abandon => abandon(client, tracker),
        Operation::BindOnly => dispatch_bind(config, client),
        Operation::GenerateLdif => generate_ldif(config, counter, ldif),
    }
}

/// `-e bindeach` (§4.6 step 1): tear the connection down and rebuild it
/// before every operation instead of reusing one bind for the worker's
/// whole run.
fn apply_framing(config: &Config, client: &mut Ldap3Client) -> Result<(), DriverError> {
    if !config.sub.bindeach {
        return Ok(());
    }
    let _ = client.unbind();
    *client = Ldap3Client::connect(config).map_err(DriverError::from)?;
    dispatch_bind(config, client)
}

/// Picks a bind mode from what's configured: a SASL mechanism name is
/// accepted but not actually driven (the adapter only wraps `ldap3`'s
/// `sync` feature, which carries no SASL support), a bind DN gets a simple
/// bind, and no bind DN falls back to an anonymous simple bind.
fn dispatch_bind(config: &Config, client: &mut Ldap3Client) -> Result<(), DriverError> {
    if let Some(mech) = config.sasl.mech.as_deref() {
        warn!(mech, "SASL bind mechanisms are not supported by this build; falling back to simple bind");
    }
    match config.bind_dn.as_deref() {
        Some(dn) => client.bind(dn, config.password.as_deref().unwrap_or("")).map_err(DriverError::from),
        None => client.bind("", "").map_err(DriverError::from),
    }
}

/// Writes one entry to the `-e genldif` output file instead of issuing it
/// over the wire; the DN template and attribute set match what `add` would
/// have sent (§6).
fn generate_ldif(config: &Config, counter: &mut CommonCounter, ldif: &mut Option<LdifWriter>) -> Result<(), DriverError> {
    let (dn, attrs) = render_entry(config, counter)?;
    let Some(writer) = ldif.as_mut() else {
        return Err(DriverError::Op(OpError::Other(-1)));
    };
    writer.write_entry(&dn, &attrs).map_err(|_| DriverError::Op(OpError::Other(-1)))
}

fn add(
    config: &Config,
    client: &mut Ldap3Client,
    counter: &mut CommonCounter,
    tracker: &mut AsyncTracker,
) -> Result<(), DriverError> {
    let (dn, attrs) = render_entry(config, counter)?;
    match config.async_max {
        Some(max) => add_async(config, client, tracker, max, dn, attrs),
        None => finish_add(config, client, dn, attrs),
    }
}

/// Enqueues `dn`/`attrs` on the tracker instead of sending them, then drains
/// the oldest outstanding entries down to the window's midpoint once the
/// outstanding count runs past `max` (§4.6's `[asyncMin, asyncMax]`).
fn add_async(
    config: &Config,
    client: &mut Ldap3Client,
    tracker: &mut AsyncTracker,
    max: usize,
    dn: String,
    attrs: Vec<Attr>,
) -> Result<(), DriverError> {
    let msgid = tracker.next_msgid();
    tracker.add(msgid, dn, encode_attrs(&attrs));

    if tracker.below_max(max) {
        return Ok(());
    }

    let min = (max / 2).max(1);
    let mut result = Ok(());
    while tracker.at_or_above_min(min) {
        let Some(pending) = tracker.pop_oldest() else {
            break;
        };
        let pending_attrs = decode_attrs(&pending.attrs);
        if let Err(e) = finish_add(config, client, pending.dn, pending_attrs) {
            if result.is_ok() {
                result = Err(e);
            }
        }
    }
    result
}

/// Flushes every entry still buffered on `tracker`, actually issuing the
/// `add` for each (§4.6: nothing pipelined may be lost at worker shutdown).
pub fn drain_all(config: &Config, client: &mut Ldap3Client, tracker: &mut AsyncTracker) {
    while let Some(pending) = tracker.pop_oldest() {
        let attrs = decode_attrs(&pending.attrs);
        if let Err(e) = finish_add(config, client, pending.dn, attrs) {
            warn!(?e, "dropping pipelined add that failed while draining at shutdown");
        }
    }
}

fn finish_add(config: &Config, client: &mut Ldap3Client, dn: String, attrs: Vec<Attr>) -> Result<(), DriverError> {
    match client.add(&dn, &attrs) {
        Ok(()) => Ok(()),
        Err(OpError::AlreadyExists) => {
            if config.sub.counteach {
                Err(DriverError::Op(OpError::AlreadyExists))
            } else {
                Ok(())
            }
        }
        Err(OpError::NoSuchObject) => {
            create_missing_ancestors(&dn, client)?;
            client.add(&dn, &attrs).map_err(DriverError::from)
        }
        Err(e) => Err(DriverError::from(e)),
    }
}

/// Flattens one attribute into a single string so it fits
/// [`ldclt_core::PendingRequest`]'s `Vec<String>` slot; `\u{1f}` (ASCII unit
/// separator) can't appear in an LDAP attribute value, so it's safe as the
/// multi-value delimiter.
fn encode_attrs(attrs: &[Attr]) -> Vec<String> {
    attrs.iter().map(|(name, values)| format!("{name}={}", values.join("\u{1f}"))).collect()
}

fn decode_attrs(encoded: &[String]) -> Vec<Attr> {
    encoded
        .iter()
        .filter_map(|entry| entry.split_once('='))
        .map(|(name, values)| (name.to_owned(), values.split('\u{1f}').map(str::to_owned).collect()))
        .collect()
}

fn delete(config: &Config, client: &mut Ldap3Client, counter: &mut CommonCounter) -> Result<(), DriverError> {
    let dn = next_dn(config, counter)?;
    client.delete(&dn).map_err(DriverError::from)
}

fn modify_replace(config: &Config, client: &mut Ldap3Client, counter: &mut CommonCounter) -> Result<(), DriverError> {
    let dn = next_dn(config, counter)?;
    let (attr, pattern) = config
        .sub
        .attreplace
        .clone()
        .unwrap_or_else(|| ("description".to_owned(), dn.clone()));
    client.modify_replace(&dn, &attr, &[pattern]).map_err(DriverError::from)
}

fn rename(config: &Config, client: &mut Ldap3Client, counter: &mut CommonCounter) -> Result<(), DriverError> {
    let dn = next_dn(config, counter)?;
    let new_dn = next_dn(config, counter)?;
    let new_rdn = new_dn.split_once(',').map(|(rdn, _)| rdn).unwrap_or(&new_dn).to_owned();
    match client.rename(&dn, &new_rdn, None) {
        Ok(()) => Ok(()),
        Err(OpError::NoSuchObject) => {
            create_missing_ancestors(&dn, client)?;
            client.rename(&dn, &new_rdn, None).map_err(DriverError::from)
        }
        Err(e) => Err(DriverError::from(e)),
    }
}

fn search(config: &Config, client: &mut Ldap3Client) -> Result<(), DriverError> {
    let filter = config.filter.as_deref().unwrap_or("(objectClass=*)");
    client
        .search_with_scope(&config.base_dn, config.scope, filter)
        .map(|_entries| ())
        .map_err(DriverError::from)
}

/// Cancels the oldest pipelined `add` still buffered on the tracker by
/// simply dropping it unsent, the one case where "abandon" can be exact
/// since the wire call was deferred rather than already in flight. With
/// nothing buffered, issues a real abandon against a freshly minted id so
/// the operation still exercises the wire (§4.6).
fn abandon(client: &mut Ldap3Client, tracker: &mut AsyncTracker) -> Result<(), DriverError> {
    if tracker.pop_oldest().is_some() {
        return Ok(());
    }
    let msgid = tracker.next_msgid();
    client.abandon(msgid).map_err(DriverError::from)
}
