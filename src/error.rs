// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types shared across the songbook.

use thiserror::Error;

/// Failures raised by the host key-value store or the catalogue on top of it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage could not be read or written
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The store refused the write because it is full
    #[error("storage quota exceeded writing {key} ({bytes} bytes)")]
    QuotaExceeded { key: String, bytes: usize },
    /// A value could not be serialized for storage
    #[error("could not serialize catalogue: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Song names must contain something other than whitespace
    #[error("song name is empty")]
    InvalidName,
    /// The named song does not exist
    #[error("song \"{0}\" not found")]
    NotFound(String),
}

/// Reasons a share code is rejected. Each maps to a user-facing message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareCodeError {
    #[error("paste a code first")]
    Empty,
    #[error("the code must start with OC6: or OC6GZ:")]
    UnknownPrefix,
    #[error("the code looks incomplete")]
    Incomplete,
    #[error("the code contains invalid characters")]
    InvalidCharacters,
    #[error("the code is not valid base64url data")]
    InvalidEncoding,
    #[error("the code is not valid compressed data")]
    InvalidCompressedData,
    #[error("the code does not contain valid JSON")]
    InvalidJson,
    #[error("the code is not a valid v6 bundle (found version {found})")]
    NotCurrentBundle { found: String },
    #[error("the code must contain exactly 1 song (found {found})")]
    SongCount { found: usize },
}

/// Whole-file import failures. Per-song problems never surface here.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid file: could not parse JSON ({0})")]
    Json(#[from] serde_json::Error),
    #[error("invalid file: no songs found")]
    InvalidFile,
}
