//! Line-level diff operations between two text buffers.
//!
//! A diff sequence is an ordered list of [`DiffOperation`]s, each tagged
//! [`OpKind::Equal`], [`OpKind::Insert`] or [`OpKind::Delete`] and carrying a
//! span of text that may contain any number of line breaks. The sequence is
//! produced once per pair of buffers and then read by the
//! [`crate::indexer`] once per side.
//!
//! Sequences either come from [`diff_lines`], which runs a line-mode diff with
//! the [`similar`] crate, or from an external tool as JSON via [`parse`].
//!
//! ## JSON Format
//!
//! Both a JSON array and newline-separated objects are accepted:
//!
//! ```json
//! [
//!   {"kind": "equal", "text": "a\n"},
//!   {"kind": "delete", "text": "b\n"},
//!   {"kind": "insert", "text": "c\n"}
//! ]
//! ```

use crate::comparison::Side;
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Equal,
    Insert,
    Delete,
}

impl From<ChangeTag> for OpKind {
    fn from(tag: ChangeTag) -> Self {
        match tag {
            ChangeTag::Equal => Self::Equal,
            ChangeTag::Insert => Self::Insert,
            ChangeTag::Delete => Self::Delete,
        }
    }
}

/// A single tagged span of text.
///
/// Operations are plain values: the same operation is copied into every line
/// bucket it touches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffOperation {
    pub kind: OpKind,
    pub text: String,
}

impl DiffOperation {
    #[inline]
    #[must_use]
    pub fn new(kind: OpKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Number of line breaks in the text.
    #[inline]
    #[must_use]
    pub fn line_breaks(&self) -> usize {
        self.text.bytes().filter(|&b| b == b'\n').count()
    }

    /// Length of the text in characters.
    #[inline]
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether this operation contributes text to the given side.
    #[inline]
    #[must_use]
    pub fn is_relevant_to(&self, side: Side) -> bool {
        self.kind == OpKind::Equal || self.kind == side.target_kind()
    }
}

#[cfg(test)]
impl DiffOperation {
    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(OpKind::Equal, text)
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(OpKind::Insert, text)
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(OpKind::Delete, text)
    }
}

/// Computes a line-mode diff of `old` against `new`.
///
/// Runs of consecutive lines sharing a tag are coalesced into one operation,
/// so an unchanged block is a single EQUAL and a replaced block is one DELETE
/// followed by one INSERT.
#[must_use]
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffOperation> {
    let diff = TextDiff::from_lines(old, new);
    let mut ops: Vec<DiffOperation> = Vec::new();

    for change in diff.iter_all_changes() {
        let kind = OpKind::from(change.tag());
        match ops.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(change.value()),
            _ => ops.push(DiffOperation::new(kind, change.value())),
        }
    }

    tracing::debug!(
        operations = ops.len(),
        old_len = old.len(),
        new_len = new.len(),
        "computed line diff"
    );
    ops
}

/// Reassembles the text of one side from a diff sequence.
#[must_use]
pub fn side_text(ops: &[DiffOperation], side: Side) -> String {
    ops.iter()
        .filter(|op| op.is_relevant_to(side))
        .map(|op| op.text.as_str())
        .collect()
}

/// Parses an externally produced diff sequence.
///
/// Handles two formats:
/// - JSON array `[{...}, {...}]`
/// - newline-separated JSON objects
pub fn parse(json: &str) -> Result<Vec<DiffOperation>, serde_json::Error> {
    if let Ok(ops) = serde_json::from_str::<Vec<DiffOperation>>(json) {
        return Ok(ops);
    }

    json.lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_replaced_line() {
        let ops = diff_lines("a\nb\n", "a\nc\n");
        assert_eq!(
            ops,
            vec![
                DiffOperation::equal("a\n"),
                DiffOperation::delete("b\n"),
                DiffOperation::insert("c\n"),
            ]
        );
    }

    #[test]
    fn diff_identical_is_single_equal() {
        let text = "one\ntwo\nthree\n";
        let ops = diff_lines(text, text);
        assert_eq!(ops, vec![DiffOperation::equal(text)]);
    }

    #[test]
    fn diff_empty_buffers() {
        assert!(diff_lines("", "").is_empty());
    }

    #[test]
    fn diff_coalesces_runs() {
        let ops = diff_lines("x\n", "x\ny\nz\n");
        assert_eq!(
            ops,
            vec![DiffOperation::equal("x\n"), DiffOperation::insert("y\nz\n")]
        );
    }

    #[test]
    fn diff_round_trips_both_sides() {
        let old = "Mary had a little lamb,\nwhose fleece was white as snow.\n\n";
        let new = "Mary had a little lamb,\nwhose fleece was red as snow.\n\nAnd everywhere that Mary went,\nthe lamb was sure to go.\n";
        let ops = diff_lines(old, new);

        assert_eq!(side_text(&ops, Side::Left), old);
        assert_eq!(side_text(&ops, Side::Right), new);
    }

    #[test]
    fn diff_round_trips_without_trailing_newline() {
        let old = "alpha\nbeta";
        let new = "alpha\ngamma\nbeta";
        let ops = diff_lines(old, new);

        assert_eq!(side_text(&ops, Side::Left), old);
        assert_eq!(side_text(&ops, Side::Right), new);
    }

    #[test]
    fn line_breaks_and_char_len() {
        let op = DiffOperation::equal("ä\nb\n");
        assert_eq!(op.line_breaks(), 2);
        assert_eq!(op.char_len(), 4);
        assert_eq!(DiffOperation::insert("no break").line_breaks(), 0);
    }

    #[test]
    fn relevance_per_side() {
        assert!(DiffOperation::equal("a").is_relevant_to(Side::Left));
        assert!(DiffOperation::equal("a").is_relevant_to(Side::Right));
        assert!(DiffOperation::delete("a").is_relevant_to(Side::Left));
        assert!(!DiffOperation::delete("a").is_relevant_to(Side::Right));
        assert!(DiffOperation::insert("a").is_relevant_to(Side::Right));
        assert!(!DiffOperation::insert("a").is_relevant_to(Side::Left));
    }

    #[test]
    fn parse_array() {
        let json = r#"[
            {"kind": "equal", "text": "a\n"},
            {"kind": "delete", "text": "b\n"},
            {"kind": "insert", "text": "c\n"}
        ]"#;

        let ops = parse(json).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0], DiffOperation::equal("a\n"));
        assert_eq!(ops[1].kind, OpKind::Delete);
        assert_eq!(ops[2].text, "c\n");
    }

    #[test]
    fn parse_empty_array() {
        assert!(parse("[]").unwrap().is_empty());
    }

    #[test]
    fn parse_newline_separated_objects() {
        let json = r#"{"kind":"equal","text":"x\n"}

{"kind":"insert","text":"y\n"}"#;

        let ops = parse(json).unwrap();
        assert_eq!(
            ops,
            vec![DiffOperation::equal("x\n"), DiffOperation::insert("y\n")]
        );
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        assert!(parse(r#"[{"kind":"replace","text":"x"}]"#).is_err());
    }
}
