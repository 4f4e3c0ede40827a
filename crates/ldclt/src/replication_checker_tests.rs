// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ldclt_core::OpList;

fn dn(n: usize) -> String {
    format!("cn=entry{n},dc=example,dc=com")
}

/// Scenario 6 (§8): one auditor delivers the same operations as locally
/// issued but with every third pair swapped. Every swapped record should
/// surface once in the early bucket and once again as matched; everything
/// else matches directly with no not-on-list and no lost entries.
#[test]
fn every_third_pair_swapped_still_fully_matches() {
    let ops = OpList::new();
    ops.register_checker();

    let pair_count = 6;
    for i in 0..pair_count * 2 {
        ops.record(OpKind::Add, dn(i), Vec::new(), None, None);
    }

    let mut delivery = Vec::new();
    for pair in 0..pair_count {
        let (a, b) = (pair * 2, pair * 2 + 1);
        if (pair + 1) % 3 == 0 {
            delivery.push(b);
            delivery.push(a);
        } else {
            delivery.push(a);
            delivery.push(b);
        }
    }

    let mut checker = Checker::new();
    let mut matched = std::collections::HashSet::new();
    let mut early_bucket = std::collections::HashSet::new();
    let mut not_on_list = 0;

    for idx in delivery {
        let (outcome, early) = checker.classify(&ops, OpKind::Add, &dn(idx), 0);
        match outcome {
            MatchOutcome::Matched => {
                matched.insert(idx);
            }
            MatchOutcome::NotOnList => not_on_list += 1,
            other => panic!("unexpected outcome {other:?} for entry {idx}"),
        }
        for e in early {
            let n: usize = e.trim_start_matches("cn=entry").split(',').next().unwrap().parse().unwrap();
            early_bucket.insert(n);
        }
    }

    assert_eq!(not_on_list, 0);
    assert_eq!(matched.len(), pair_count * 2);
    let swapped_firsts: std::collections::HashSet<usize> = (0..pair_count)
        .filter(|&pair| (pair + 1) % 3 == 0)
        .map(|pair| pair * 2)
        .collect();
    assert_eq!(early_bucket, swapped_firsts);

    let stranded = checker.drain_remaining(&ops);
    assert!(stranded.is_empty(), "nothing should still be on queue");
}

#[test]
fn unregistered_dn_is_not_on_list() {
    let ops = OpList::new();
    ops.register_checker();
    let mut checker = Checker::new();
    let (outcome, early) = checker.classify(&ops, OpKind::Add, "cn=ghost,dc=example,dc=com", 0);
    assert_eq!(outcome, MatchOutcome::NotOnList);
    assert!(early.is_empty());
}

#[test]
fn connection_close_flags_remaining_entries_as_still_on_queue() {
    let ops = OpList::new();
    ops.register_checker();
    ops.record(OpKind::Add, dn(0), Vec::new(), None, None);
    ops.record(OpKind::Add, dn(1), Vec::new(), None, None);

    let mut checker = Checker::new();
    checker.classify(&ops, OpKind::Add, &dn(0), 0);
    let remaining = checker.drain_remaining(&ops);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].dn, dn(1));
}
