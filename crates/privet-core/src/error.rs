//! Error types for Privet operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all Privet crates. Uses `thiserror` for derive macros.
//!
//! Note that most access-control failures are *not* errors: a malformed
//! stored allow-list degrades to an empty set and a rejected save is an
//! ordinary outcome. `Error` covers the plumbing around them (store I/O,
//! configuration, file formats).

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in Privet operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error tied to a specific path.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// The underlying I/O error.
        source: std::io::Error,
        /// The path being accessed.
        path: PathBuf,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A store or pipeline operation failed.
    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an operation error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Wrap an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            source,
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Privet's Error type.
pub type Result<T> = std::result::Result<T, Error>;
