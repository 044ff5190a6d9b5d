//! Plugin options passed to `setup()` from Lua.
//!
//! ```lua
//! require("linediff_nvim").setup({
//!   tagging = "line",
//!   log_level = "debug",
//!   log_file = vim.fn.stdpath("log") .. "/linediff.log",
//! })
//! ```

use crate::comparison::{SAMPLE_LEFT, SAMPLE_RIGHT};
use crate::indexer::Tagging;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Options {
    /// Shown on the left when no readable file is given.
    pub left_sample: String,
    /// Shown on the right when no readable file is given.
    pub right_sample: String,
    pub tagging: Tagging,
    /// Default filter directive when neither `LINEDIFF_LOG` nor `RUST_LOG` is set.
    pub log_level: String,
    /// Logging stays disabled without a file.
    pub log_file: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            left_sample: SAMPLE_LEFT.to_string(),
            right_sample: SAMPLE_RIGHT.to_string(),
            tagging: Tagging::default(),
            log_level: "warn".to_string(),
            log_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let options: Options = serde_json::from_str("{}").unwrap();
        assert_eq!(options, Options::default());
    }

    #[test]
    fn partial_options_keep_defaults() {
        let options: Options =
            serde_json::from_str(r#"{"tagging": "line", "log_file": "/tmp/linediff.log"}"#)
                .unwrap();
        assert_eq!(options.tagging, Tagging::PerLine);
        assert_eq!(options.log_file, Some(PathBuf::from("/tmp/linediff.log")));
        assert_eq!(options.log_level, "warn");
        assert_eq!(options.left_sample, SAMPLE_LEFT);
    }

    #[test]
    fn whole_tagging_by_name() {
        let options: Options = serde_json::from_str(r#"{"tagging": "whole"}"#).unwrap();
        assert_eq!(options.tagging, Tagging::WholeOperation);
    }

    #[test]
    fn unknown_tagging_is_rejected() {
        assert!(serde_json::from_str::<Options>(r#"{"tagging": "chars"}"#).is_err());
    }
}
