//! Centralised error types used across the crate.

use std::io;

use thiserror::Error;

use crate::core::color::ColorError;

/// Top-level error type bubbled up by public APIs.
///
/// Only faults that make a whole call meaningless end up here. Bad rows,
/// bad cells and fixable option values are logged and skipped instead.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// No separator could be detected in the first line.
    #[error("no separator detected in \"{line}\"; set one explicitly")]
    Format { line: String },

    #[error("input is empty")]
    EmptyInput,

    #[error("input holds a header row and nothing else")]
    HeaderOnly,

    #[error("column {column} does not exist, the table is {width} columns wide")]
    ColumnIndexOutOfRange { column: usize, width: usize },

    #[error("unrecognized colour format \"{0}\"")]
    UnrecognizedColorFormat(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("row has {got} columns, the cached table has {expected}")]
    RowWidthMismatch { expected: usize, got: usize },
}

impl From<ColorError> for PlotError {
    fn from(e: ColorError) -> Self {
        Self::UnrecognizedColorFormat(e.to_string())
    }
}

impl PlotError {
    /// `true` for the errors that mean "nothing to plot".
    #[must_use]
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::HeaderOnly)
    }
}
