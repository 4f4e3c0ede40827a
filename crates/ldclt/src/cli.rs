// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface (§6). Argument-parsing mechanics and `-H` help
//! rendering stay out of scope; this is a thin `clap` derive whose job is
//! only to get every flag into a typed struct for [`crate::config::Config`]
//! to build from.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "ldclt", version, about = "LDAP load generator", disable_help_flag = true)]
pub struct Cli {
    /// Print help and exit (clap's generated text is accepted as-is).
    #[arg(short = 'H', long = "help", action = clap::ArgAction::Help)]
    pub help: Option<bool>,

    /// Async max pending (min is half of this).
    #[arg(short = 'a')]
    pub async_max: Option<usize>,

    /// Base DN.
    #[arg(short = 'b')]
    pub base_dn: Option<String>,

    /// Bind DN.
    #[arg(short = 'D')]
    pub bind_dn: Option<String>,

    /// Bind password.
    #[arg(short = 'w')]
    pub password: Option<String>,

    /// `-e` sub-options, comma-separated, repeatable.
    #[arg(short = 'e')]
    pub sub_options: Vec<String>,

    /// Max errors before exiting.
    #[arg(short = 'E')]
    pub max_errors: Option<u32>,

    /// Filter template.
    #[arg(short = 'f')]
    pub filter: Option<String>,

    /// Server host.
    #[arg(short = 'h')]
    pub host: Option<String>,

    /// Inactivity-sample limit.
    #[arg(short = 'i')]
    pub inactivity_max: Option<u32>,

    /// Error codes to ignore (repeatable, at most 20).
    #[arg(short = 'I')]
    pub ignore_errors: Vec<i32>,

    /// Thread count, 1..1000.
    #[arg(short = 'n')]
    pub threads: Option<u32>,

    /// Sample budget.
    #[arg(short = 'N')]
    pub sample_budget: Option<u32>,

    /// `-o` SASL sub-options, comma-separated.
    #[arg(short = 'o')]
    pub sasl_options: Vec<String>,

    /// Server port.
    #[arg(short = 'p')]
    pub port: Option<u16>,

    /// Replication-listener port.
    #[arg(short = 'P')]
    pub replication_port: Option<u16>,

    #[arg(short = 'q')]
    pub quiet: bool,

    #[arg(short = 'Q')]
    pub super_quiet: bool,

    /// Random range low.
    #[arg(short = 'r')]
    pub random_low: Option<i64>,

    /// Random range high.
    #[arg(short = 'R')]
    pub random_high: Option<i64>,

    /// Search scope: base|one|subtree.
    #[arg(short = 's')]
    pub scope: Option<String>,

    /// Time limit in seconds.
    #[arg(short = 't')]
    pub time_limit: Option<u64>,

    /// Slave/replica host to compare against (repeatable, at most 20).
    #[arg(short = 'S')]
    pub slave_hosts: Vec<String>,

    /// Total-ops budget.
    #[arg(short = 'T')]
    pub total_ops: Option<u64>,

    #[arg(short = 'v')]
    pub verbose: bool,

    #[arg(short = 'V')]
    pub version_flag: bool,

    /// Wait in seconds (scalab01).
    #[arg(short = 'W')]
    pub wait_secs: Option<u64>,

    /// TLS cert file.
    #[arg(short = 'Z')]
    pub cert_file: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
