// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_constant_and_literal_text() {
    let file = TemplateFile::parse("cn: hello-[CONSTANT(world)]\n").unwrap();
    assert_eq!(file.attributes.len(), 1);
    let mut scope = ObjectScope::default();
    let rendered = file.attributes[0].render(&mut scope).unwrap();
    assert_eq!(rendered, "hello-world");
}

#[test]
fn ignores_blank_lines_and_comments() {
    let file = TemplateFile::parse("# a comment\n\ncn: [CONSTANT(x)]\n").unwrap();
    assert_eq!(file.attributes.len(), 1);
}

#[test]
fn rdn_line_is_detected() {
    let file = TemplateFile::parse("rdn: uid:[CONSTANT(bob)]\n").unwrap();
    assert!(file.attributes[0].is_rdn());
}

#[test]
fn incrn_increments_and_pads_width() {
    let file = TemplateFile::parse("uid: [INCRN(0;2;3)]\n").unwrap();
    let mut scope = ObjectScope::default();
    assert_eq!(file.attributes[0].render(&mut scope).unwrap(), "000");
    assert_eq!(file.attributes[0].render(&mut scope).unwrap(), "001");
    assert_eq!(file.attributes[0].render(&mut scope).unwrap(), "002");
    // wraps without NOLOOP
    assert_eq!(file.attributes[0].render(&mut scope).unwrap(), "000");
}

#[test]
fn incrn_noloop_signals_exhaustion_past_high() {
    let file = TemplateFile::parse("uid: [INCRNNOLOOP(0;1;1)]\n").unwrap();
    let mut scope = ObjectScope::default();
    assert_eq!(file.attributes[0].render(&mut scope).unwrap(), "0");
    assert_eq!(file.attributes[0].render(&mut scope).unwrap(), "1");
    assert_eq!(file.attributes[0].render(&mut scope), Err(RenderSignal::NoLoopExhausted));
}

#[test]
fn var_write_and_read_round_trip() {
    let file = TemplateFile::parse("cn: [A=CONSTANT(shared)]-[A]\n").unwrap();
    let mut scope = ObjectScope::default();
    assert_eq!(file.attributes[0].render(&mut scope).unwrap(), "shared-shared");
}

#[test]
fn rnds_renders_requested_width() {
    let file = TemplateFile::parse("cn: [RNDS(12)]\n").unwrap();
    let mut scope = ObjectScope::default();
    let rendered = file.attributes[0].render(&mut scope).unwrap();
    assert_eq!(rendered.chars().count(), 12);
}

#[test]
fn unknown_generator_is_rejected() {
    let err = TemplateFile::parse("cn: [BOGUS(1)]\n").unwrap_err();
    assert!(matches!(err, TemplateError::UnknownGenerator(_)));
}

#[test]
fn missing_colon_is_malformed() {
    let err = TemplateFile::parse("not-a-valid-line\n").unwrap_err();
    assert!(matches!(err, TemplateError::Malformed { .. }));
}
