// src/error.rs

use std::fmt;
use thiserror::Error;

/// Which input a structural problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSide {
    Source,
    Reference,
}

impl fmt::Display for RecordSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSide::Source => write!(f, "source"),
            RecordSide::Reference => write!(f, "reference"),
        }
    }
}

/// Structural failures raised by the resolution engine. Anything not listed
/// here (no candidates, nothing above `min_score`) is a normal outcome.
#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("{side} records are missing required column '{column}'")]
    MissingColumn { side: RecordSide, column: String },

    #[error("source record at row {row} has an empty SourceID")]
    MissingSourceId { row: usize },
}
