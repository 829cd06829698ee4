// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error taxonomy for the annotation engine.
//!
//! Every variant is recoverable: the [`Session`](crate::session::Session)
//! catches it where it happens and turns it into a user-visible notification.

use std::fmt;

/// Errors produced by engine operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A user action could not run with the current inputs
    /// (e.g. no active video player when saving a timestamp).
    Input(String),
    /// A persisted blob or an embedded image could not be parsed.
    Parse(String),
    /// The session could not be written: the key-value store refused it
    /// or it could not be encoded.
    StorageFull(String),
    /// An uploaded file is unsupported or could not be decoded.
    MediaLoad(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Input(msg) => write!(f, "input error: {msg}"),
            Error::Parse(msg) => write!(f, "parse error: {msg}"),
            Error::StorageFull(msg) => write!(f, "storage full: {msg}"),
            Error::MediaLoad(msg) => write!(f, "media load error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, Error>;
