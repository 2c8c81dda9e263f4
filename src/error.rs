// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `topas_lib` library.
//!
//! Failures fall into three groups: transport failures (network, HTTP
//! status, JSON decoding), lookup failures (a motor name or index that is
//! absent from the current mirror), and missing presets. None of them are
//! retried internally; every operation surfaces its first failure to the
//! caller.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP round-trip to the instrument failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A motor referenced by name or index is not in the current mirror.
    ///
    /// The roster may be stale; refresh it and retry.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// No saved position preset carries the requested name.
    #[error("no preset named {0:?}")]
    PresetNotFound(String),
}

/// Errors raised by the HTTP transport.
///
/// Transport failures are fatal to the operation that triggered them; the
/// library performs no retries and exposes no partial-failure recovery.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The instrument answered with a non-success status code.
    #[error("HTTP {status} from {path}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The instrument-relative path that was requested.
        path: String,
    },

    /// The response body was not the JSON the endpoint is documented to
    /// return.
    #[error("invalid JSON from {path}: {source}")]
    Json {
        /// The instrument-relative path that was requested.
        path: String,
        /// The decoding failure.
        source: serde_json::Error,
    },

    /// The configured instrument address could not be turned into a client.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors raised when a mirror lookup misses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No motor with this name exists in the roster.
    #[error("unknown motor name: {0:?}")]
    UnknownMotor(String),

    /// No motor with this instrument-assigned index exists in the roster.
    #[error("unknown motor index: {0}")]
    UnknownIndex(u32),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
