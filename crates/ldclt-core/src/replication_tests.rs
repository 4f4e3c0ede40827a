// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn op_kind_round_trips_through_wire_type() {
    for kind in [OpKind::Add, OpKind::Delete, OpKind::ModRdn, OpKind::Modify] {
        assert_eq!(OpKind::from_wire_type(kind.wire_type()), Some(kind));
    }
    assert_eq!(OpKind::from_wire_type(0xff), None);
}

#[test]
fn last_checker_to_pass_gets_true() {
    let list = OpList::new();
    list.register_checker();
    list.register_checker();
    let record = list.record(OpKind::Add, "dn=x".into(), vec![], None, None);
    assert!(!record.mark_passed());
    assert!(record.mark_passed());
}

#[test]
fn sweep_drops_fully_passed_records() {
    let list = OpList::new();
    list.register_checker();
    let record = list.record(OpKind::Delete, "dn=y".into(), vec![], None, None);
    assert_eq!(list.len(), 1);
    record.mark_passed();
    list.sweep();
    assert_eq!(list.len(), 0);
}
