//! Error type shared by data loading, theming and rendering.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NeonError {
    #[error("column `{0}` not found in dataset")]
    MissingColumn(String),

    #[error("column `{column}` is not numeric (row {row}: {value:?})")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("column `{column}` has {found} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("no data to plot")]
    EmptyData,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid color `{0}`, expected #RRGGBB")]
    InvalidColor(String),

    #[error("cannot read theme {path}: {reason}")]
    Theme { path: PathBuf, reason: String },

    #[error("no usable font found (set NEON_TOKYO_FONT or Theme::font_path)")]
    FontUnavailable,

    #[error("drawing failed: {0}")]
    Draw(String),
}

/// Map a plotters error (only `Debug` is guaranteed) into an `anyhow::Error`.
pub(crate) fn draw_err<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    NeonError::Draw(format!("{e:?}")).into()
}
