//! Error types for shape reading and analysis.

use std::path::PathBuf;

use thiserror::Error;

use crate::hull::HullError;

/// Result type alias for shape operations.
pub type Result<T> = std::result::Result<T, ShapeError>;


/// Errors raised while reading or analysing crystal shapes.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// Missing or malformed input handed to the analyser.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A coordinate file neither the flat nor the movie parser understands.
    #[error("cannot interpret {}: {message}", path.display())]
    Format { path: PathBuf, message: String },

    /// A mesh file the geometry loader could not open.
    #[error("failed to load mesh {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// Hull or principal axes could not be computed for the point set.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Normalisation of a point set whose points all coincide.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Underlying read failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShapeError {
    pub fn validation(details: impl Into<String>) -> Self {
        Self::Validation(details.into())
    }

    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn geometry(details: impl Into<String>) -> Self {
        Self::Geometry(details.into())
    }

    pub fn degenerate(details: impl Into<String>) -> Self {
        Self::DegenerateInput(details.into())
    }
}

impl From<HullError> for ShapeError {
    fn from(err: HullError) -> Self {
        Self::Geometry(err.to_string())
    }
}

/// A row of a flat coordinate table that could not be read as numbers.
///
/// Only produced by the flat stage of the reader; it signals that the file
/// should be retried as a movie.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line number in the file.
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}
