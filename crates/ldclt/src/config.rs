// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable run configuration built once from parsed CLI flags (§6),
//! shared read-only as `Arc<Config>` across every worker — the "global
//! mutable main context" redesign note (§9) turned into a single value
//! plus the small per-field-group mutable run-state structs each owning
//! module defines for itself.

use std::collections::HashMap;
use std::sync::Arc;

use ldclt_core::TemplateFile;

use crate::cli::Cli;
use crate::error::{ExitError, ExitStatus};

/// Referral handling policy (`-e referral=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferralPolicy {
    #[default]
    Off,
    On,
    Rebind,
}

/// Which operation(s) `-e` selected (§4.6's "common framing").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    #[default]
    Add,
    Delete,
    ModifyReplace,
    Rename,
    Search,
    Abandon,
    BindOnly,
    GenerateLdif,
}

/// Object-class template preset selected by `-e person|inetOrgPerson|emailPerson`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectPreset {
    #[default]
    None,
    Person,
    InetOrgPerson,
    EmailPerson,
}

/// Parsed `-e` sub-options (§6). Everything this codebase doesn't branch
/// on by name still round-trips through `extra`, so no flag is silently
/// dropped even if no driver consults it yet.
#[derive(Debug, Clone, Default)]
pub struct SubOptions {
    pub esearch: bool,
    pub bindeach: bool,
    pub random: bool,
    pub close: bool,
    pub incr: bool,
    pub op: Operation,
    pub preset: ObjectPreset,
    pub string: bool,
    pub randombase: bool,
    pub randombase_low: Option<i64>,
    pub randombase_high: Option<i64>,
    pub v2: bool,
    pub ascii: bool,
    pub noloop: bool,
    pub imagesdir: Option<String>,
    pub smoothshutdown: bool,
    pub attreplace: Option<(String, String)>,
    pub cltcertname: Option<String>,
    pub keydbfile: Option<String>,
    pub keydbpin: Option<String>,
    pub counteach: bool,
    pub withnewparent: bool,
    pub noglobalstats: bool,
    pub attrsonly: bool,
    pub randombinddn: bool,
    pub randombinddn_low: Option<i64>,
    pub randombinddn_high: Option<i64>,
    pub randombinddnfromfile: Option<String>,
    pub scalab01: bool,
    pub scalab01_cnxduration: Option<u64>,
    pub scalab01_wait: Option<u64>,
    pub scalab01_maxcnxnb: Option<usize>,
    pub referral: ReferralPolicy,
    pub commoncounter: bool,
    pub dontsleeponserverdown: bool,
    pub attrlist: Vec<String>,
    pub randomattrlist: Vec<String>,
    pub object_file: Option<String>,
    pub genldif_file: Option<String>,
    pub rdn: Option<(String, String)>,
    pub append: bool,
    pub randomauthid: bool,
    pub randomauthid_low: Option<i64>,
    pub randomauthid_high: Option<i64>,
    pub extra: HashMap<String, String>,
}

impl SubOptions {
    pub fn parse(occurrences: &[String]) -> Result<Self, ExitError> {
        let mut opts = Self::default();
        for group in occurrences {
            for entry in group.split(',') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                let (key, value) = match entry.split_once('=') {
                    Some((k, v)) => (k, Some(v)),
                    None => (entry, None),
                };
                opts.apply(key, value)?;
            }
        }
        Ok(opts)
    }

    fn apply(&mut self, key: &str, value: Option<&str>) -> Result<(), ExitError> {
        let as_i64 = |v: Option<&str>, flag: &str| -> Result<i64, ExitError> {
            v.and_then(|s| s.parse().ok())
                .ok_or_else(|| bad_param(&format!("-e {flag} requires a numeric value")))
        };
        let as_u64 = |v: Option<&str>, flag: &str| -> Result<u64, ExitError> {
            v.and_then(|s| s.parse().ok())
                .ok_or_else(|| bad_param(&format!("-e {flag} requires a numeric value")))
        };
        match key {
            "esearch" => self.esearch = true,
            "bindeach" => self.bindeach = true,
            "random" => self.random = true,
            "close" => self.close = true,
            "incr" => self.incr = true,
            "add" => self.op = Operation::Add,
            "delete" => self.op = Operation::Delete,
            "rename" => self.op = Operation::Rename,
            "bindonly" => self.op = Operation::BindOnly,
            "person" => self.preset = ObjectPreset::Person,
            "inetOrgPerson" => self.preset = ObjectPreset::InetOrgPerson,
            "emailPerson" => self.preset = ObjectPreset::EmailPerson,
            "string" => self.string = true,
            "randombase" => self.randombase = true,
            "randombaselow" => self.randombase_low = Some(as_i64(value, "randombaselow")?),
            "randombasehigh" => self.randombase_high = Some(as_i64(value, "randombasehigh")?),
            "v2" => self.v2 = true,
            "ascii" => self.ascii = true,
            "noloop" => self.noloop = true,
            "imagesdir" => self.imagesdir = value.map(str::to_owned),
            "smoothshutdown" => self.smoothshutdown = true,
            "attreplace" => {
                let (name, pattern) = value
                    .and_then(|v| v.split_once(':'))
                    .ok_or_else(|| bad_param("-e attreplace requires name:pattern"))?;
                self.attreplace = Some((name.to_owned(), pattern.to_owned()));
            }
            "cltcertname" => self.cltcertname = value.map(str::to_owned),
            "keydbfile" => self.keydbfile = value.map(str::to_owned),
            "keydbpin" => self.keydbpin = value.map(str::to_owned),
            "counteach" => self.counteach = true,
            "withnewparent" => self.withnewparent = true,
            "noglobalstats" => self.noglobalstats = true,
            "attrsonly" => self.attrsonly = matches!(value, Some("1")),
            "randombinddn" => self.randombinddn = true,
            "randombinddnlow" => self.randombinddn_low = Some(as_i64(value, "randombinddnlow")?),
            "randombinddnhigh" => self.randombinddn_high = Some(as_i64(value, "randombinddnhigh")?),
            "randombinddnfromfile" => self.randombinddnfromfile = value.map(str::to_owned),
            "scalab01" => self.scalab01 = true,
            "scalab01_cnxduration" => self.scalab01_cnxduration = Some(as_u64(value, "scalab01_cnxduration")?),
            "scalab01_wait" => self.scalab01_wait = Some(as_u64(value, "scalab01_wait")?),
            "scalab01_maxcnxnb" => {
                self.scalab01_maxcnxnb = Some(as_u64(value, "scalab01_maxcnxnb")? as usize)
            }
            "referral" => {
                self.referral = match value {
                    Some("on") => ReferralPolicy::On,
                    Some("rebind") => ReferralPolicy::Rebind,
                    Some("off") | None => ReferralPolicy::Off,
                    Some(other) => return Err(bad_param(&format!("-e referral={other} is not on|off|rebind"))),
                }
            }
            "commoncounter" => self.commoncounter = true,
            "dontsleeponserverdown" => self.dontsleeponserverdown = true,
            "attrlist" => self.attrlist = value.unwrap_or_default().split(':').map(str::to_owned).collect(),
            "randomattrlist" => {
                self.randomattrlist = value.unwrap_or_default().split(':').map(str::to_owned).collect()
            }
            "object" => self.object_file = value.map(str::to_owned),
            "genldif" => {
                self.op = Operation::GenerateLdif;
                self.genldif_file = value.map(str::to_owned);
            }
            "rdn" => {
                let (ty, pattern) = value
                    .and_then(|v| v.split_once(':'))
                    .ok_or_else(|| bad_param("-e rdn requires type:pattern"))?;
                self.rdn = Some((ty.to_owned(), pattern.to_owned()));
            }
            "append" => self.append = true,
            "randomauthid" => self.randomauthid = true,
            "randomauthidlow" => self.randomauthid_low = Some(as_i64(value, "randomauthidlow")?),
            "randomauthidhigh" => self.randomauthid_high = Some(as_i64(value, "randomauthidhigh")?),
            other => {
                self.extra.insert(other.to_owned(), value.unwrap_or_default().to_owned());
            }
        }
        Ok(())
    }
}

fn bad_param(what: &str) -> ExitError {
    ExitError::from_status(ExitStatus::BadParams, what)
}

fn load_template(path: &str) -> Result<Arc<TemplateFile>, ExitError> {
    TemplateFile::load(std::path::Path::new(path))
        .map(Arc::new)
        .map_err(|e| ExitError::from_status(ExitStatus::InitFailure, format!("-e object={path}: {e}")))
}

/// SASL bind sub-options (`-o`, §6).
#[derive(Debug, Clone, Default)]
pub struct SaslOptions {
    pub mech: Option<String>,
    pub authid: Option<String>,
    pub authzid: Option<String>,
    pub realm: Option<String>,
    pub sec_prop: Option<String>,
    pub flags: Option<String>,
}

impl SaslOptions {
    pub fn parse(occurrences: &[String]) -> Self {
        let mut opts = Self::default();
        for group in occurrences {
            for entry in group.split(',') {
                let Some((key, value)) = entry.trim().split_once('=') else {
                    continue;
                };
                match key {
                    "mech" => opts.mech = Some(value.to_owned()),
                    "authid" => opts.authid = Some(value.to_owned()),
                    "authzid" => opts.authzid = Some(value.to_owned()),
                    "realm" => opts.realm = Some(value.to_owned()),
                    "secProp" => opts.sec_prop = Some(value.to_owned()),
                    "flags" => opts.flags = Some(value.to_owned()),
                    _ => {}
                }
            }
        }
        opts
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub bind_dn: Option<String>,
    pub password: Option<String>,
    pub base_dn: String,
    pub filter: Option<String>,
    pub threads: u32,
    pub max_errors: u32,
    pub ignore_errors: Vec<i32>,
    pub inactivity_max: u32,
    pub sample_budget: u32,
    pub replication_port: Option<u16>,
    pub slave_hosts: Vec<String>,
    pub quiet: bool,
    pub super_quiet: bool,
    pub random_low: i64,
    pub random_high: i64,
    pub scope: SearchScope,
    pub time_limit: Option<u64>,
    pub total_ops: Option<u64>,
    pub verbose: bool,
    pub wait_secs: u64,
    pub cert_file: Option<String>,
    pub async_max: Option<usize>,
    pub sub: SubOptions,
    pub sasl: SaslOptions,
    /// Parsed `-e object=<file>` attribute-value template, loaded once and
    /// shared read-only across every worker (§3's "shared template object").
    pub template: Option<Arc<TemplateFile>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    Base,
    #[default]
    One,
    Subtree,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Arc<Self>, ExitError> {
        if cli.ignore_errors.len() > 20 {
            return Err(bad_param("-I may be repeated at most 20 times"));
        }
        if cli.slave_hosts.len() > 20 {
            return Err(bad_param("-S may be repeated at most 20 times"));
        }
        let threads = cli.threads.unwrap_or(1);
        if !(1..=1000).contains(&threads) {
            return Err(bad_param("-n must be in 1..1000"));
        }

        let scope = match cli.scope.as_deref() {
            Some("base") => SearchScope::Base,
            Some("one") | None => SearchScope::One,
            Some("subtree") => SearchScope::Subtree,
            Some(other) => return Err(bad_param(&format!("-s {other} is not base|one|subtree"))),
        };

        let sub = SubOptions::parse(&cli.sub_options)?;
        let sasl = SaslOptions::parse(&cli.sasl_options);
        let template = sub.object_file.as_deref().map(load_template).transpose()?;

        Ok(Arc::new(Self {
            host: cli.host.unwrap_or_else(|| "localhost".to_owned()),
            port: cli.port.unwrap_or(389),
            bind_dn: cli.bind_dn,
            password: cli.password,
            base_dn: cli.base_dn.unwrap_or_default(),
            filter: cli.filter,
            threads,
            max_errors: cli.max_errors.unwrap_or(u32::MAX),
            ignore_errors: cli.ignore_errors,
            inactivity_max: cli.inactivity_max.unwrap_or(u32::MAX),
            sample_budget: cli.sample_budget.unwrap_or(u32::MAX),
            replication_port: cli.replication_port,
            slave_hosts: cli.slave_hosts,
            quiet: cli.quiet,
            super_quiet: cli.super_quiet,
            random_low: cli.random_low.unwrap_or(0),
            random_high: cli.random_high.unwrap_or(0),
            scope,
            time_limit: cli.time_limit,
            total_ops: cli.total_ops,
            verbose: cli.verbose,
            wait_secs: cli.wait_secs.unwrap_or(1),
            cert_file: cli.cert_file,
            async_max: cli.async_max,
            sub,
            sasl,
            template,
        }))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
