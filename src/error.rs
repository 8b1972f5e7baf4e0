//! Domain-specific error types for the dodot engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors (e.g., [`PackError`],
//! [`HandlerError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! DodotError
//! ├── Config(ConfigError)       — TOML loading and parsing
//! ├── Pack(PackError)           — pack names, discovery, selection
//! ├── Datastore(DatastoreError) — state directory I/O, checksums
//! └── Handler(HandlerError)     — deploy conflicts, status failures
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the dodot engine.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum DodotError {
    /// Configuration-related error (loading, parsing).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pack-related error (invalid name, not found, structural issues).
    #[error("Pack error: {0}")]
    Pack(#[from] PackError),

    /// Datastore operation error (state I/O, checksum).
    #[error("Datastore error: {0}")]
    Datastore(#[from] DatastoreError),

    /// Handler operation error (conflicts, broken links).
    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

/// Errors that arise from configuration loading and parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading a config file.
    #[error("cannot read config file {path}: {source}")]
    Load {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file contains a syntax error that prevents parsing.
    #[error("invalid TOML in {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parser-reported message.
        message: String,
    },
}

/// Errors that arise from pack discovery, validation, and selection.
#[derive(Error, Debug)]
pub enum PackError {
    /// A supplied value (pack name, path, or option) is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The dotfiles root or a requested pack does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// One or more requested pack names matched nothing.
    #[error("pack(s) not found: [{}]", .0.join(", "))]
    PacksNotFound(Vec<String>),

    /// A pack directory exists but is structurally unusable.
    #[error("invalid pack '{name}': {reason}")]
    Invalid {
        /// Name of the offending pack.
        name: String,
        /// Why the pack cannot be used.
        reason: String,
    },

    /// A pack directory contains no deployable files.
    #[error("pack '{0}' is empty")]
    Empty(String),

    /// A pack with the given name already exists (init).
    #[error("pack '{0}' already exists")]
    Exists(String),
}

/// Errors that arise from datastore reads and writes.
#[derive(Error, Debug)]
pub enum DatastoreError {
    /// A stat/read/write/symlink operation failed at the OS level.
    #[error("file access error at {path}: {source}")]
    FileAccess {
        /// Path of the failing operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A source file disappeared or was unreadable while checksumming.
    #[error("cannot checksum {path}: {source}")]
    Checksum {
        /// Path of the file being checksummed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise from handler deploy/status/clear operations.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The user-visible target exists and is not owned by dodot.
    #[error("target {target} exists and is not managed by dodot (use --force to overwrite)")]
    Conflict {
        /// The occupied user-visible path.
        target: PathBuf,
    },

    /// An intermediate link exists but points at a different source.
    #[error("link points to wrong source")]
    WrongSource,

    /// A handler operation failed at the OS level.
    #[error("file access error at {path}: {source}")]
    FileAccess {
        /// Path of the failing operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
