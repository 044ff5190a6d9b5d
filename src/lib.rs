//! # linediff-nvim
//!
//! A Neovim plugin for showing two text files side by side with changed lines
//! shaded.
//!
//! The Rust side computes a line diff of the two buffers and indexes it once
//! per pane, so that the Lua side can ask, on every redraw, which of the
//! visible lines were deleted, inserted or both. It also reports where the
//! first change sits so each window can be scrolled there on open.
//!
//! ## Architecture
//!
//! - `operation` - Diff operations, the line diff itself and JSON input
//! - `indexer` - Per-line lookup tables, line statuses and the first change
//! - `comparison` - Loading the two buffers and the open comparison view
//! - `config` / `log` / `error` - Options, logging and errors
//! - `lib` (this module) - Lua bindings
//!
//! ## Usage from Lua
//!
//! ```lua
//! local linediff = require("linediff_nvim")
//! linediff.setup({ tagging = "whole" })
//!
//! local cmp = linediff.compare("old.txt", "new.txt")
//! local top, bottom = vim.fn.line("w0") - 1, vim.fn.line("w$") - 1
//! for i, status in ipairs(cmp:line_statuses("left", top, bottom)) do
//!   -- shade line top + i - 1 unless status == "none"
//! end
//! local first = cmp:first_change("right") -- { offset = ..., line = ... }
//! ```
//!
//! ## Environment Variables
//!
//! - `LINEDIFF_LOG` / `RUST_LOG` - Log filter, see [`log`]

use mlua::prelude::*;

mod comparison;
mod config;
mod error;
mod indexer;
mod log;
mod operation;

use comparison::{Comparison, Sources, compare_all};
use config::Options;
use error::Error;

/// Options from the last `setup()` call, or the defaults.
fn options(lua: &Lua) -> Options {
    lua.app_data_ref::<Options>()
        .map(|options| (*options).clone())
        .unwrap_or_default()
}

/// Positional path arguments that were actually passed.
#[inline]
fn path_args(left: Option<String>, right: Option<String>) -> Vec<String> {
    [left, right].into_iter().flatten().collect()
}

/// Stores options and installs logging when a log file is configured.
fn setup(lua: &Lua, opts: Option<LuaValue>) -> LuaResult<()> {
    let options: Options = match opts {
        Some(value) => lua.from_value(value)?,
        None => Options::default(),
    };
    if let Some(path) = &options.log_file {
        log::init(path, &options.log_level)?;
    }
    tracing::debug!(tagging = ?options.tagging, "configured");
    lua.set_app_data(options);
    Ok(())
}

/// Compares two files, falling back to the sample texts.
fn compare(lua: &Lua, (left, right): (Option<String>, Option<String>)) -> LuaResult<Comparison> {
    let options = options(lua);
    let sources = Sources::from_args(
        &path_args(left, right),
        &options.left_sample,
        &options.right_sample,
    );
    Ok(Comparison::new(sources, options.tagging))
}

/// Compares two in-memory texts.
fn compare_texts(lua: &Lua, (left, right): (String, String)) -> LuaResult<Comparison> {
    let options = options(lua);
    Ok(Comparison::new(
        Sources::unnamed(&left, &right),
        options.tagging,
    ))
}

/// Indexes a diff sequence produced elsewhere, given as JSON.
fn compare_operations(lua: &Lua, json: String) -> LuaResult<Comparison> {
    let operations = operation::parse(&json).map_err(Error::from)?;
    Ok(Comparison::from_operations(operations, options(lua).tagging))
}

/// Compares a list of `{ left_text, right_text }` pairs in parallel.
fn compare_many(lua: &Lua, pairs: Vec<(String, String)>) -> LuaResult<Vec<Comparison>> {
    let pairs = pairs
        .iter()
        .map(|(left, right)| Sources::unnamed(left, right))
        .collect();
    Ok(compare_all(pairs, options(lua).tagging))
}

/// Creates the Lua module exports. Called by mlua when loaded via `require("linediff_nvim")`.
#[mlua::lua_module]
fn linediff_nvim(lua: &Lua) -> LuaResult<LuaTable> {
    let exports = lua.create_table()?;
    exports.set(
        "setup",
        lua.create_function(|lua, opts: Option<LuaValue>| setup(lua, opts))?,
    )?;
    exports.set(
        "compare",
        lua.create_function(|lua, args: (Option<String>, Option<String>)| compare(lua, args))?,
    )?;
    exports.set(
        "compare_texts",
        lua.create_function(|lua, args: (String, String)| compare_texts(lua, args))?,
    )?;
    exports.set(
        "compare_operations",
        lua.create_function(|lua, json: String| compare_operations(lua, json))?,
    )?;
    exports.set(
        "compare_many",
        lua.create_function(|lua, pairs: Vec<LuaTable>| {
            let pairs = pairs
                .iter()
                .map(|pair| Ok((pair.get::<String>(1)?, pair.get::<String>(2)?)))
                .collect::<LuaResult<Vec<_>>>()?;
            compare_many(lua, pairs)
        })?,
    )?;
    Ok(exports)
}
