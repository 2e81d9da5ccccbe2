//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror. Per-operation failures
//! are reported as [`CacheError`] values in the operation's result list;
//! only [`OpenError`] is ever returned as a hard failure.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

// == Error Kind ==
/// Classification of a per-operation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Key exceeds the maximum key length
    KeyTooLong,
    /// Serialized value exceeds the maximum value size
    ValueTooLong,
    /// Put or batch-create target is already present
    KeyAlreadyExists,
    /// Delete target is absent
    KeyNotFound,
    /// Value failed to decode, or any other unexpected failure
    UnknownError,
}

impl ErrorKind {
    /// Returns the wire name of the kind (e.g. `KEY_TOO_LONG`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::KeyTooLong => "KEY_TOO_LONG",
            ErrorKind::ValueTooLong => "VALUE_TOO_LONG",
            ErrorKind::KeyAlreadyExists => "KEY_ALREADY_EXISTS",
            ErrorKind::KeyNotFound => "KEY_NOT_FOUND",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Cache Error ==
/// A recoverable failure of a single get/put/delete/batch item.
///
/// Carries the offending key and, where one was supplied, the offending
/// serialized value.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind}: {message} (key: {key})")]
pub struct CacheError {
    pub kind: ErrorKind,
    pub message: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl CacheError {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        key: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            key: key.into(),
            value,
        }
    }

    pub fn key_too_long(key: &str, value: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyTooLong, "key too long", key, Some(value.into()))
    }

    pub fn value_too_long(key: &str, value: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueTooLong, "value too long", key, Some(value.into()))
    }

    pub fn key_already_exists(key: &str, value: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::KeyAlreadyExists,
            "key already exists",
            key,
            Some(value.into()),
        )
    }

    pub fn key_not_found(key: &str) -> Self {
        Self::new(ErrorKind::KeyNotFound, "key not found", key, None)
    }

    /// Wraps an underlying failure (typically a decode error) with its message.
    pub fn unknown(key: &str, value: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::UnknownError,
            cause.to_string(),
            key,
            Some(value.into()),
        )
    }
}

// == Open Error ==
/// Fatal failures while opening, persisting or closing a store.
#[derive(Error, Debug)]
pub enum OpenError {
    /// Another owner holds the exclusive lock on the backing file
    #[error("backing file {} is locked by another owner", path.display())]
    Locked { path: PathBuf },

    /// Filesystem failure on the backing file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OpenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        OpenError::Io {
            path: path.into(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for store lifecycle operations.
pub type Result<T> = std::result::Result<T, OpenError>;
