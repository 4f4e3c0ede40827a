// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ldclt`: a multithreaded LDAP load generator (§2). Parses its CLI
//! surface, builds an immutable [`config::Config`], spins up one worker
//! thread per `-n`, and optionally a replication checker and a scalab01
//! session-lifecycle controller, then waits for completion or a signal.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod cli;
mod config;
mod drivers;
mod error;
mod filter;
mod ldap_client_adapter;
mod ldif;
mod monitor;
mod replication_checker;
mod scalab01_controller;
mod shutdown;
mod workers;

use std::process::ExitCode;
use std::sync::Arc;

use ldclt_core::{CommonCounter, OpList};
use signal_hook::consts::{SIGINT, SIGQUIT};
use signal_hook::iterator::Signals;
use tracing::info;

use cli::Cli;
use config::Config;
use error::ExitStatus;
use monitor::ErrorHistogram;
use scalab01_controller::Scalab01State;
use workers::Worker;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse_args();
    let config = match Config::from_cli(cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ldclt: {e}");
            return ExitCode::from(e.code as u8);
        }
    };

    let status = run(config);
    ExitCode::from(status.code() as u8)
}

fn run(config: Arc<Config>) -> ExitStatus {
    info!(threads = config.threads, host = %config.host, "ldclt starting");

    let errors = Arc::new(ErrorHistogram::default());
    let shared_counter = config.sub.commoncounter.then(|| {
        CommonCounter::new(config.random_low, config.random_high, config.sub.noloop)
    });

    let workers: Vec<Arc<Worker>> = (0..config.threads as usize)
        .map(|id| Worker::new(id, config.clone(), shared_counter.clone(), errors.clone()))
        .collect();

    let handles: Vec<_> = workers
        .iter()
        .cloned()
        .map(|worker| std::thread::spawn(move || worker.run()))
        .collect();

    if let Some(port) = config.replication_port {
        let ops = Arc::new(OpList::new());
        std::thread::spawn(move || {
            if let Err(e) = replication_checker::run(port, ops) {
                tracing::warn!(error = ?e, "replication checker exited");
            }
        });
    }

    if config.sub.scalab01 {
        let scalab01_config = config.clone();
        let max_connections = config.sub.scalab01_maxcnxnb.unwrap_or(config.threads as usize);
        let state = Arc::new(Scalab01State::new(max_connections));
        if let Ok(mut client) = ldap_client_adapter::Ldap3Client::connect(&scalab01_config) {
            std::thread::spawn(move || {
                scalab01_controller::run(&scalab01_config, &state, &mut client, || false);
            });
        }
    }

    let signal_config = config.clone();
    let signal_workers = workers.clone();
    let signal_errors = errors.clone();
    if let Ok(mut signals) = Signals::new([SIGINT, SIGQUIT]) {
        std::thread::spawn(move || {
            for sig in signals.forever() {
                monitor::print_global_stats(&signal_workers, &signal_errors);
                if sig == SIGINT {
                    let status = shutdown::shutdown_workers(&signal_config, &signal_workers);
                    std::process::exit(status.code());
                }
            }
        });
    }

    monitor::run(&config, &workers, &errors);

    for handle in handles {
        let _ = handle.join();
    }

    shutdown::shutdown_workers(&config, &workers)
}
