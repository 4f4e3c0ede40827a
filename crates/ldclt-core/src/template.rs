// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object-template parser and renderer (§6 "Template file format").
//!
//! A template file is line-oriented UTF-8; `#` and blank lines are
//! ignored. Each remaining line is `attrname: value-template`, where
//! `value-template` concatenates literal text with bracketed generator
//! specifiers: `[HOW(args)]`, `[VAR=HOW(args)]` (write the rendered value
//! into object-scoped slot `VAR`), or bare `[VAR]` (read a previously
//! written slot). A line named `rdn` supplies the entry's RDN template
//! instead of an attribute value.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::counters::CommonCounter;
use crate::error::TemplateError;
use crate::random::{rand_dn_string, rand_int, DataFile};

/// Object-scoped variable slots `'A'..='H'`, written by one field and read
/// by any later field in the same rendered entry.
#[derive(Debug, Default, Clone)]
pub struct ObjectScope([Option<String>; 8]);

impl ObjectScope {
    fn slot_index(slot: char) -> Result<usize, TemplateError> {
        match slot {
            'A'..='H' => Ok(slot as usize - 'A' as usize),
            other => Err(TemplateError::BadVarSlot(other)),
        }
    }

    pub fn set(&mut self, slot: char, value: String) -> Result<(), TemplateError> {
        self.0[Self::slot_index(slot)?] = Some(value);
        Ok(())
    }

    pub fn get(&self, slot: char) -> Result<Option<&str>, TemplateError> {
        Ok(self.0[Self::slot_index(slot)?].as_deref())
    }
}

/// A shared incrementing counter private to one field (as opposed to
/// [`CommonCounter`], which is shared across every worker under
/// `-e commoncounter`).
#[derive(Debug, Clone)]
struct IncrNum {
    state: Arc<Mutex<i64>>,
    low: i64,
    high: i64,
    width: usize,
    noloop: bool,
}

impl IncrNum {
    fn new(low: i64, high: i64, width: usize, noloop: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(low)),
            low,
            high,
            width,
            noloop,
        }
    }

    fn render(&self) -> Result<String, RenderSignal> {
        let mut cur = self.state.lock();
        let value = *cur;
        if value > self.high {
            return Err(RenderSignal::NoLoopExhausted);
        }
        *cur = if value >= self.high {
            if self.noloop {
                self.high + 1 // sentinel past high; next call signals exhaustion
            } else {
                self.low
            }
        } else {
            value + 1
        };
        Ok(format!("{value:0width$}", width = self.width))
    }
}

#[derive(Debug, Clone)]
struct IncrFile {
    file: DataFile,
    cursor: Arc<Mutex<usize>>,
    noloop: bool,
}

impl IncrFile {
    fn render(&self) -> Result<String, RenderSignal> {
        let mut idx = self.cursor.lock();
        if *idx >= self.file.len() {
            if self.noloop {
                return Err(RenderSignal::NoLoopExhausted);
            }
            *idx = 0;
        }
        let value = self.file.get(*idx).unwrap_or_default().to_owned();
        *idx += 1;
        Ok(value)
    }
}

/// One generator, tagged by the grammar's `HOW` keyword (§3, §6).
#[derive(Debug, Clone)]
pub enum FieldKind {
    Constant(String),
    IncrFromFile(IncrFile),
    IncrNum(IncrNum),
    RndFromFile(DataFile),
    RndNum { low: i64, high: i64, width: usize },
    RndStr { width: usize },
    CommonCounter(CommonCounter, usize),
}

/// Signal a field generator can raise instead of producing text: a
/// `NOLOOP` field that has exceeded its bound tells the caller to end the
/// worker cleanly with `ExitStatus::Ok` rather than keep rendering (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSignal {
    NoLoopExhausted,
}

impl FieldKind {
    fn render(&self) -> Result<String, RenderSignal> {
        match self {
            FieldKind::Constant(s) => Ok(s.clone()),
            FieldKind::IncrFromFile(f) => f.render(),
            FieldKind::IncrNum(n) => n.render(),
            FieldKind::RndFromFile(df) => Ok(df.pick_random().unwrap_or_default().to_owned()),
            FieldKind::RndNum { low, high, width } => Ok(format!("{:0width$}", rand_int(*low, *high), width = width)),
            FieldKind::RndStr { width } => Ok(rand_dn_string(*width)),
            FieldKind::CommonCounter(counter, width) => counter
                .next()
                .map(|v| format!("{v:0width$}", width = width))
                .ok_or(RenderSignal::NoLoopExhausted),
        }
    }
}

/// A bracketed specifier or a run of literal text inside a template value.
#[derive(Debug, Clone)]
pub enum Segment {
    Literal(String),
    /// `[HOW(args)]` or `[VAR=HOW(args)]`; `write_slot` is `Some` for the latter.
    Field { kind: FieldKind, write_slot: Option<char> },
    /// Bare `[VAR]`: substitutes a previously written slot's value.
    VarRef(char),
}

#[derive(Debug, Clone)]
pub struct AttributeTemplate {
    pub name: String,
    pub segments: Vec<Segment>,
}

impl AttributeTemplate {
    pub fn is_rdn(&self) -> bool {
        self.name.eq_ignore_ascii_case("rdn")
    }

    /// Renders every segment in order, threading object-scoped variable
    /// writes into `scope` as they occur (§3).
    pub fn render(&self, scope: &mut ObjectScope) -> Result<String, RenderSignal> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Field { kind, write_slot } => {
                    let rendered = kind.render()?;
                    if let Some(slot) = write_slot {
                        let _ = scope.set(*slot, rendered.clone());
                    }
                    out.push_str(&rendered);
                }
                Segment::VarRef(slot) => {
                    if let Ok(Some(value)) = scope.get(*slot) {
                        out.push_str(value);
                    }
                }
            }
        }
        Ok(out)
    }
}

#[derive(Debug)]
pub struct TemplateFile {
    pub attributes: Vec<AttributeTemplate>,
}

impl TemplateFile {
    /// Reads and parses `-e object=<path>` (§6).
    pub fn load(path: &std::path::Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut attributes = Vec::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (name, value) = line.split_once(':').ok_or_else(|| TemplateError::Malformed {
                line: lineno + 1,
                what: "expected 'attrname: value-template'".into(),
            })?;
            let segments = parse_segments(value.trim_start(), lineno + 1)?;
            attributes.push(AttributeTemplate {
                name: name.trim().to_owned(),
                segments,
            });
        }
        Ok(Self { attributes })
    }
}

fn parse_segments(value: &str, lineno: usize) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '[' {
            let end = chars[i..].iter().position(|&c| c == ']').map(|p| p + i).ok_or_else(|| {
                TemplateError::Malformed {
                    line: lineno,
                    what: "unterminated '['".into(),
                }
            })?;
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            let spec: String = chars[i + 1..end].iter().collect();
            segments.push(parse_spec(&spec, lineno)?);
            i = end + 1;
        } else {
            literal.push(chars[i]);
            i += 1;
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn parse_spec(spec: &str, lineno: usize) -> Result<Segment, TemplateError> {
    // Bare `[VAR]`: a single uppercase letter, no '=' or '('.
    if spec.len() == 1 && spec.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return Ok(Segment::VarRef(spec.chars().next().expect("checked len 1")));
    }

    let (write_slot, rest) = match spec.split_once('=') {
        Some((var, rest)) if var.len() == 1 && var.chars().next().is_some_and(|c| c.is_ascii_uppercase()) => {
            (Some(var.chars().next().expect("checked len 1")), rest)
        }
        _ => (None, spec),
    };

    let (how, args) = rest.split_once('(').ok_or_else(|| TemplateError::Malformed {
        line: lineno,
        what: format!("missing '(' in generator spec {rest:?}"),
    })?;
    let args = args.strip_suffix(')').ok_or_else(|| TemplateError::Malformed {
        line: lineno,
        what: format!("missing ')' in generator spec {rest:?}"),
    })?;

    let kind = match how {
        "CONSTANT" => FieldKind::Constant(args.to_owned()),
        "INCRFROMFILE" => FieldKind::IncrFromFile(IncrFile {
            file: load_data_file(args, lineno)?,
            cursor: Arc::new(Mutex::new(0)),
            noloop: false,
        }),
        "INCRFROMFILENOLOOP" => FieldKind::IncrFromFile(IncrFile {
            file: load_data_file(args, lineno)?,
            cursor: Arc::new(Mutex::new(0)),
            noloop: true,
        }),
        "INCRN" => parse_incr_num(args, false, lineno)?,
        "INCRNNOLOOP" => parse_incr_num(args, true, lineno)?,
        "RNDFROMFILE" => FieldKind::RndFromFile(load_data_file(args, lineno)?),
        "RNDN" => parse_rnd_num(args, lineno)?,
        "RNDS" => {
            let width: usize = args.trim().parse().map_err(|_| TemplateError::Malformed {
                line: lineno,
                what: format!("RNDS width {args:?} is not a number"),
            })?;
            FieldKind::RndStr { width }
        }
        other => return Err(TemplateError::UnknownGenerator(other.to_owned())),
    };

    Ok(Segment::Field { kind, write_slot })
}

fn load_data_file(path: &str, lineno: usize) -> Result<DataFile, TemplateError> {
    DataFile::load(std::path::Path::new(path.trim())).map_err(|e| TemplateError::Malformed {
        line: lineno,
        what: format!("loading data file {path:?}: {e}"),
    })
}

fn split_triplet(args: &str, lineno: usize) -> Result<(i64, i64, usize), TemplateError> {
    let parts: Vec<&str> = args.split(';').collect();
    let bad = || TemplateError::Malformed {
        line: lineno,
        what: format!("expected 'low;high;width', got {args:?}"),
    };
    if parts.len() != 3 {
        return Err(bad());
    }
    let low: i64 = parts[0].trim().parse().map_err(|_| bad())?;
    let high: i64 = parts[1].trim().parse().map_err(|_| bad())?;
    let width: usize = parts[2].trim().parse().map_err(|_| bad())?;
    Ok((low, high, width))
}

fn parse_incr_num(args: &str, noloop: bool, lineno: usize) -> Result<FieldKind, TemplateError> {
    let (low, high, width) = split_triplet(args, lineno)?;
    Ok(FieldKind::IncrNum(IncrNum::new(low, high, width, noloop)))
}

fn parse_rnd_num(args: &str, lineno: usize) -> Result<FieldKind, TemplateError> {
    let (low, high, width) = split_triplet(args, lineno)?;
    Ok(FieldKind::RndNum { low, high, width })
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
