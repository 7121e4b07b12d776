use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the irlgraph library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a tuning parameter is outside its accepted range.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// Raised when a cost grid is malformed or dimensions disagree.
    #[error("invalid grid: {message}")]
    InvalidGrid { message: String },

    /// Raised when a start location cannot be resolved to a graph node or cell.
    #[error("invalid start location: {message}")]
    InvalidStart { message: String },

    /// Raised when the landmark mesh cannot be built.
    #[error("triangulation failed: {message}")]
    Triangulation { message: String },

    /// Raised when a points-of-interest file cannot be parsed.
    #[error("invalid points of interest: {message}")]
    PointsOfInterest { message: String },

    /// Raised when serializing a graph fails.
    #[error("failed to serialize graph: {message}")]
    GraphSerialize { message: String },

    /// Raised when loading a graph from a file fails.
    #[error("failed to load graph from {path}: {message}")]
    GraphLoad { path: PathBuf, message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for CSV parsing errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn invalid_grid(message: impl Into<String>) -> Self {
        Error::InvalidGrid {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_start(message: impl Into<String>) -> Self {
        Error::InvalidStart {
            message: message.into(),
        }
    }
}
