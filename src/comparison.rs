//! An open side-by-side comparison of two buffers.
//!
//! A [`Comparison`] owns both texts, the diff sequence between them and the
//! two [`LineTable`]s built from it. Everything is computed once on
//! construction; afterwards the view only reads.

use crate::indexer::{
    FirstChange, LineTable, Tagging, build_line_lookup, classify_line, first_change_offset,
};
use crate::operation::{DiffOperation, OpKind, diff_lines, side_text};
use mlua::prelude::*;
use rayon::prelude::*;
use std::path::Path;

pub const DEFAULT_LEFT_NAME: &str = "left.txt";
pub const DEFAULT_RIGHT_NAME: &str = "right.txt";

pub const SAMPLE_LEFT: &str = "Mary had a little lamb,\nwhose fleece was white as snow.\n\n";
pub const SAMPLE_RIGHT: &str = "Mary had a little lamb,\nwhose fleece was red as snow.\n\nAnd everywhere that Mary went,\nthe lamb was sure to go.\n";

/// One pane of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Old version; highlights deletions.
    Left,
    /// New version; highlights insertions.
    Right,
}

impl Side {
    /// The non-equal operation kind shaded on this side.
    #[inline]
    #[must_use]
    pub fn target_kind(self) -> OpKind {
        match self {
            Self::Left => OpKind::Delete,
            Self::Right => OpKind::Insert,
        }
    }
}

impl FromLua for Side {
    fn from_lua(value: LuaValue, _: &Lua) -> LuaResult<Self> {
        let LuaValue::String(name) = &value else {
            return Err(LuaError::RuntimeError(format!(
                "expected side name, got {}",
                value.type_name()
            )));
        };
        let name = name.to_string_lossy();
        match name.as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(LuaError::RuntimeError(format!(
                "invalid side {name:?}, expected \"left\" or \"right\""
            ))),
        }
    }
}

/// A named text buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub text: String,
}

impl Source {
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Reads `path` if it names an existing regular file, otherwise keeps
    /// `fallback` as the content. The path is used as the name either way.
    #[must_use]
    pub fn load(path: &str, fallback: &str) -> Self {
        let text = read_text(Path::new(path)).unwrap_or_else(|| fallback.to_string());
        Self::new(path, text)
    }
}

/// Reads a whole file as text, or `None` if it is not a readable regular file.
fn read_text(path: &Path) -> Option<String> {
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no such file, using sample text");
        return None;
    }
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "unable to open file, using sample text");
            None
        }
    }
}

/// The pair of buffers to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub left: Source,
    pub right: Source,
}

impl Sources {
    /// Buffers under the default names.
    #[must_use]
    pub fn unnamed(left_text: &str, right_text: &str) -> Self {
        Self {
            left: Source::new(DEFAULT_LEFT_NAME, left_text),
            right: Source::new(DEFAULT_RIGHT_NAME, right_text),
        }
    }

    /// Resolves positional path arguments.
    ///
    /// Only a full pair of paths is used; with fewer, both sides are the
    /// samples. A named file that does not exist keeps its sample text.
    #[must_use]
    pub fn from_args<S: AsRef<str>>(args: &[S], left_text: &str, right_text: &str) -> Self {
        match args {
            [left, right, ..] => Self {
                left: Source::load(left.as_ref(), left_text),
                right: Source::load(right.as_ref(), right_text),
            },
            _ => Self::unnamed(left_text, right_text),
        }
    }
}

/// Both sides of a diff with their line lookups.
#[derive(Debug, Clone)]
pub struct Comparison {
    left: Source,
    right: Source,
    operations: Vec<DiffOperation>,
    deletions: LineTable,
    insertions: LineTable,
}

impl Comparison {
    /// Diffs the two sources and indexes both sides.
    #[must_use]
    pub fn new(sources: Sources, tagging: Tagging) -> Self {
        let operations = diff_lines(&sources.left.text, &sources.right.text);
        Self::with_operations(sources.left.name, sources.right.name, operations, tagging)
    }

    /// Builds a comparison from an externally produced diff sequence. The text
    /// of each side is reassembled from the operations.
    #[must_use]
    pub fn from_operations(operations: Vec<DiffOperation>, tagging: Tagging) -> Self {
        Self::with_operations(
            DEFAULT_LEFT_NAME.to_string(),
            DEFAULT_RIGHT_NAME.to_string(),
            operations,
            tagging,
        )
    }

    fn with_operations(
        left_name: String,
        right_name: String,
        operations: Vec<DiffOperation>,
        tagging: Tagging,
    ) -> Self {
        let deletions = build_line_lookup(&operations, Side::Left, tagging);
        let insertions = build_line_lookup(&operations, Side::Right, tagging);
        let left = Source::new(left_name, side_text(&operations, Side::Left));
        let right = Source::new(right_name, side_text(&operations, Side::Right));

        tracing::info!(
            left = %left.name,
            right = %right.name,
            left_lines = deletions.len(),
            right_lines = insertions.len(),
            deleted = deletions.changed_lines(),
            inserted = insertions.changed_lines(),
            "opened comparison"
        );

        Self {
            left,
            right,
            operations,
            deletions,
            insertions,
        }
    }

    #[inline]
    #[must_use]
    pub fn table(&self, side: Side) -> &LineTable {
        match side {
            Side::Left => &self.deletions,
            Side::Right => &self.insertions,
        }
    }

    #[inline]
    #[must_use]
    pub fn source(&self, side: Side) -> &Source {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    #[inline]
    #[must_use]
    pub fn operations(&self) -> &[DiffOperation] {
        &self.operations
    }

    /// Window title: the name of the new file.
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.right.name
    }

    /// The table the divider between the panes is shaded from.
    #[inline]
    #[must_use]
    pub fn gutter(&self) -> &LineTable {
        &self.deletions
    }

    /// Initial scroll target for a side.
    #[inline]
    #[must_use]
    pub fn first_change(&self, side: Side) -> FirstChange {
        self.table(side).first_change()
    }
}

/// Builds many comparisons in parallel. Output order matches input order.
#[must_use]
pub fn compare_all(pairs: Vec<Sources>, tagging: Tagging) -> Vec<Comparison> {
    pairs
        .into_par_iter()
        .map(|sources| Comparison::new(sources, tagging))
        .collect()
}

/// Rejects lines past the end of a built table.
fn check_line(table: &LineTable, line: usize) -> LuaResult<()> {
    if !table.is_empty() && line >= table.len() {
        return Err(LuaError::RuntimeError(format!(
            "line {line} out of range (0..{})",
            table.len()
        )));
    }
    Ok(())
}

impl LuaUserData for Comparison {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("line_count", |_, this, side: Side| Ok(this.table(side).len()));
        methods.add_method("line_status", |_, this, (side, line): (Side, usize)| {
            let table = this.table(side);
            check_line(table, line)?;
            Ok(classify_line(table, line))
        });
        methods.add_method(
            "line_statuses",
            |_, this, (side, first, last): (Side, usize, usize)| {
                Ok(this.table(side).statuses(first, last))
            },
        );
        methods.add_method("gutter_statuses", |_, this, (first, last): (usize, usize)| {
            Ok(this.gutter().statuses(first, last))
        });
        methods.add_method("first_change", |_, this, side: Side| {
            Ok(this.first_change(side))
        });
        methods.add_method("first_change_offset", |_, this, side: Side| {
            Ok(first_change_offset(this.table(side)))
        });
        methods.add_method("has_changes", |_, this, ()| {
            Ok(this.table(Side::Left).has_changes() || this.table(Side::Right).has_changes())
        });
        methods.add_method("operations", |lua, this, ()| lua.to_value(this.operations()));
        methods.add_method("text", |_, this, side: Side| {
            Ok(this.source(side).text.clone())
        });
        methods.add_method("name", |_, this, side: Side| {
            Ok(this.source(side).name.clone())
        });
        methods.add_method("title", |_, this, ()| Ok(this.title().to_string()));
    }
}
