// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_bare_and_keyed_sub_options() {
    let opts = SubOptions::parse(&["esearch,noloop,randombaselow=5,randombasehigh=10".to_owned()]).unwrap();
    assert!(opts.esearch);
    assert!(opts.noloop);
    assert_eq!(opts.randombase_low, Some(5));
    assert_eq!(opts.randombase_high, Some(10));
}

#[test]
fn genldif_selects_the_generate_ldif_operation() {
    let opts = SubOptions::parse(&["genldif=out.ldif".to_owned()]).unwrap();
    assert_eq!(opts.op, Operation::GenerateLdif);
    assert_eq!(opts.genldif_file.as_deref(), Some("out.ldif"));
}

#[test]
fn unknown_sub_option_is_preserved_in_extra() {
    let opts = SubOptions::parse(&["totally-unknown-flag".to_owned()]).unwrap();
    assert!(opts.extra.contains_key("totally-unknown-flag"));
}

#[test]
fn malformed_numeric_sub_option_is_bad_params() {
    let err = SubOptions::parse(&["randombaselow=not-a-number".to_owned()]).unwrap_err();
    assert_eq!(err.code, ExitStatus::BadParams.code());
}

#[test]
fn referral_rejects_unknown_value() {
    let err = SubOptions::parse(&["referral=bogus".to_owned()]).unwrap_err();
    assert_eq!(err.code, ExitStatus::BadParams.code());
}

#[test]
fn sasl_options_parse_key_value_pairs() {
    let opts = SaslOptions::parse(&["mech=EXTERNAL,authid=uid=bob".to_owned()]);
    assert_eq!(opts.mech.as_deref(), Some("EXTERNAL"));
}

#[test]
fn thread_count_out_of_range_is_rejected() {
    let cli = Cli {
        help: None,
        async_max: None,
        base_dn: None,
        bind_dn: None,
        password: None,
        sub_options: vec![],
        max_errors: None,
        filter: None,
        host: None,
        inactivity_max: None,
        ignore_errors: vec![],
        threads: Some(5000),
        sample_budget: None,
        sasl_options: vec![],
        port: None,
        replication_port: None,
        quiet: false,
        super_quiet: false,
        random_low: None,
        random_high: None,
        scope: None,
        time_limit: None,
        slave_hosts: vec![],
        total_ops: None,
        verbose: false,
        version_flag: false,
        wait_secs: None,
        cert_file: None,
    };
    let err = Config::from_cli(cli).unwrap_err();
    assert_eq!(err.code, ExitStatus::BadParams.code());
}
