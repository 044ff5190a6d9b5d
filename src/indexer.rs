//! Turning a diff sequence into a per-line lookup for one side of the view.
//!
//! The renderer needs to know, for each display line of the left or right
//! buffer, whether that line was deleted, inserted, both or neither. A
//! [`LineTable`] answers that question: bucket *i* holds every operation that
//! contributed to display line *i* on that side.
//!
//! ## Bucketing
//!
//! Operations are visited in sequence order. Operations of the opposite kind
//! (INSERT on the left, DELETE on the right) are skipped. A relevant operation
//! without line breaks joins the current bucket; one with `n` line breaks is
//! copied into the current bucket and closes it, `n` times over. This means a
//! multi-line operation tags every line it crosses with the whole operation.
//!
//! [`Tagging::PerLine`] splits operations at line breaks first, so each bucket
//! only sees the piece of text that sits on its own line.

use crate::comparison::Side;
use crate::operation::{DiffOperation, OpKind};
use mlua::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::Level;

/// Most lines reference one or two operations; inline storage avoids heap allocation.
pub type Bucket = SmallVec<[DiffOperation; 2]>;

/// How a multi-line operation is attached to the lines it spans.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Tagging {
    /// Every crossed line receives a copy of the whole operation.
    #[default]
    #[serde(rename = "whole")]
    WholeOperation,
    /// Operations are split at each line break before bucketing.
    #[serde(rename = "line")]
    PerLine,
}

/// Shading verdict for one display line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineStatus {
    #[default]
    None,
    Deleted,
    Inserted,
    Both,
}

impl LineStatus {
    /// Reduces a bucket to a status. Presence decides, not count or order.
    #[must_use]
    pub fn of(ops: &[DiffOperation]) -> Self {
        let deleted = ops.iter().any(|op| op.kind == OpKind::Delete);
        let inserted = ops.iter().any(|op| op.kind == OpKind::Insert);

        match (deleted, inserted) {
            (true, true) => Self::Both,
            (false, true) => Self::Inserted,
            (true, false) => Self::Deleted,
            (false, false) => Self::None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_changed(self) -> bool {
        self != Self::None
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Deleted => "deleted",
            Self::Inserted => "inserted",
            Self::Both => "both",
        }
    }
}

/// Where the first change on a side begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirstChange {
    /// Character offset into the side's text.
    pub offset: usize,
    /// Display line (bucket index) holding the change.
    pub line: usize,
}

/// Per-line classification of one side of a comparison.
///
/// A default table has no buckets at all and stands for "not built yet";
/// every built table has at least one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTable {
    buckets: Vec<Bucket>,
    first_change: Option<FirstChange>,
}

impl LineTable {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Status of one display line.
    ///
    /// Querying a line past the end is a caller bug; it trips a debug
    /// assertion and answers [`LineStatus::None`] in release builds.
    #[must_use]
    pub fn status(&self, line: usize) -> LineStatus {
        if self.buckets.is_empty() {
            return LineStatus::None;
        }
        debug_assert!(
            line < self.buckets.len(),
            "line {line} out of bounds for table with {} lines",
            self.buckets.len()
        );
        self.buckets
            .get(line)
            .map_or(LineStatus::None, |bucket| LineStatus::of(bucket))
    }

    /// Statuses for the inclusive range `first..=last`, clamped to the table.
    #[must_use]
    pub fn statuses(&self, first: usize, last: usize) -> Vec<LineStatus> {
        let Some(end) = self.buckets.len().checked_sub(1) else {
            return Vec::new();
        };
        let last = last.min(end);
        if first > last {
            return Vec::new();
        }
        self.buckets[first..=last]
            .iter()
            .map(|bucket| LineStatus::of(bucket))
            .collect()
    }

    /// Start of the first change, or the start of the document when the side
    /// has none.
    #[inline]
    #[must_use]
    pub fn first_change(&self) -> FirstChange {
        self.first_change.unwrap_or_default()
    }

    #[inline]
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.first_change.is_some()
    }

    /// Number of lines that are shaded.
    #[must_use]
    pub fn changed_lines(&self) -> usize {
        self.buckets
            .iter()
            .filter(|bucket| LineStatus::of(bucket).is_changed())
            .count()
    }

    /// Appends `op` to the current bucket, opening a new bucket for each line
    /// break it contains.
    fn push(&mut self, op: &DiffOperation) {
        let breaks = op.line_breaks();
        if breaks == 0 {
            self.current().push(op.clone());
            return;
        }
        for _ in 0..breaks {
            self.current().push(op.clone());
            self.buckets.push(Bucket::new());
        }
    }

    fn current(&mut self) -> &mut Bucket {
        if self.buckets.is_empty() {
            self.buckets.push(Bucket::new());
        }
        let last = self.buckets.len() - 1;
        &mut self.buckets[last]
    }

    fn current_line(&self) -> usize {
        self.buckets.len().saturating_sub(1)
    }
}

/// Builds the line lookup for one side of a diff.
///
/// The left side is built against DELETE, the right side against INSERT.
#[must_use]
pub fn build_line_lookup(ops: &[DiffOperation], side: Side, tagging: Tagging) -> LineTable {
    let mut table = LineTable {
        buckets: vec![Bucket::new()],
        first_change: None,
    };
    let target = side.target_kind();
    let mut offset = 0;

    for op in ops.iter().filter(|op| op.is_relevant_to(side)) {
        if op.kind == target && table.first_change.is_none() {
            table.first_change = Some(FirstChange {
                offset,
                line: table.current_line(),
            });
        }

        match tagging {
            Tagging::WholeOperation => table.push(op),
            Tagging::PerLine if op.text.is_empty() => table.push(op),
            Tagging::PerLine => {
                for piece in op.text.split_inclusive('\n') {
                    table.push(&DiffOperation::new(op.kind, piece));
                }
            }
        }

        offset += op.char_len();
    }

    tracing::debug!(?side, ?tagging, lines = table.len(), "built line lookup");
    if tracing::enabled!(Level::TRACE) {
        summarize(&table);
    }
    table
}

/// Status of `line` in `table`; see [`LineTable::status`].
#[inline]
#[must_use]
pub fn classify_line(table: &LineTable, line: usize) -> LineStatus {
    table.status(line)
}

/// Character offset of the first change in `table`, 0 when there is none.
#[inline]
#[must_use]
pub fn first_change_offset(table: &LineTable) -> usize {
    table.first_change().offset
}

fn summarize(table: &LineTable) {
    for (line, bucket) in table.buckets().iter().enumerate() {
        for (index, op) in bucket.iter().enumerate() {
            tracing::trace!(line, index, kind = ?op.kind, "bucket entry");
        }
    }
}

impl IntoLua for LineStatus {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        self.as_str().into_lua(lua)
    }
}

impl IntoLua for FirstChange {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        let table = lua.create_table()?;
        table.set("offset", self.offset)?;
        table.set("line", self.line)?;
        Ok(LuaValue::Table(table))
    }
}
