// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport to the instrument's REST server.
//!
//! The WinTopas server exposes every operation under a base URL of the form
//! `http://{host}:{port}/{serial}/{version}/PublicAPI`. The transport layer
//! translates instrument-relative paths into requests against that base URL
//! and decodes JSON responses. It performs no retries; any failure is fatal
//! to the operation that triggered it.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::TransportError;

/// Configuration for a connection to a Topas instrument.
///
/// # Examples
///
/// ```
/// use topas_lib::transport::ConnectionConfig;
/// use std::time::Duration;
///
/// // Defaults: port 8000, API version "v0", 10 s timeout
/// let config = ConnectionConfig::new("127.0.0.1", "14187");
///
/// // With all options
/// let config = ConnectionConfig::new("192.168.1.50", "14187")
///     .with_port(8001)
///     .with_api_version("v1")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    serial: String,
    api_version: String,
    timeout: Duration,
}

impl ConnectionConfig {
    /// Default port of the WinTopas REST server.
    pub const DEFAULT_PORT: u16 = 8000;
    /// Default public API version.
    pub const DEFAULT_API_VERSION: &'static str = "v0";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the instrument with the given serial
    /// number, reachable at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            serial: serial.into(),
            api_version: Self::DEFAULT_API_VERSION.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets a custom public API version segment.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the instrument serial number.
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Returns the API version segment.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the public API base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!(
            "http://{}:{}/{}/{}/PublicAPI",
            self.host, self.port, self.serial, self.api_version
        )
    }

    /// Creates a [`Connection`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidAddress`] if the HTTP client cannot
    /// be created for this configuration.
    pub fn into_connection(self) -> Result<Connection, TransportError> {
        let base_url = self.base_url();

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::InvalidAddress(format!("{base_url}: {e}")))?;

        Ok(Connection { base_url, client })
    }
}

/// The transport seam between the device state mirror and the instrument.
///
/// [`Connection`] is the real reqwest-backed implementation; tests substitute
/// recording fakes. Paths are instrument-relative (e.g.
/// `/Motors/AllProperties`) and may carry a query string.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Issues a read and decodes the JSON response body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails, the server answers
    /// with a non-success status, or the body is not valid JSON.
    async fn get(&self, path: &str) -> Result<Value, TransportError>;

    /// Issues a write with a JSON body and returns the raw response body.
    ///
    /// Callers decide whether and how to parse the returned text.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails or the server answers
    /// with a non-success status.
    async fn put(&self, path: &str, body: Value) -> Result<String, TransportError>;

    /// Like [`Transport::put`], but issues a POST.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails or the server answers
    /// with a non-success status.
    async fn post(&self, path: &str, body: Value) -> Result<String, TransportError>;
}

/// HTTP connection to a Topas instrument.
///
/// Stateless apart from the base URL; each call is an independent request.
///
/// # Examples
///
/// ```no_run
/// use topas_lib::transport::{Connection, ConnectionConfig, Transport};
///
/// # async fn example() -> Result<(), topas_lib::TransportError> {
/// let conn = ConnectionConfig::new("127.0.0.1", "14187").into_connection()?;
/// let motors = conn.get("/Motors/AllProperties").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Connection {
    base_url: String,
    client: Client,
}

impl Connection {
    /// Returns the public API base URL of the instrument.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn check_status(path: &str, response: &reqwest::Response) -> Result<(), TransportError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            })
        }
    }
}

impl Transport for Connection {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        let url = self.url(path);

        tracing::debug!(url = %url, "GET");

        let response = self.client.get(&url).send().await?;
        Self::check_status(path, &response)?;

        let body = response.text().await?;

        tracing::debug!(body = %body, "GET response");

        serde_json::from_str(&body).map_err(|source| TransportError::Json {
            path: path.to_string(),
            source,
        })
    }

    async fn put(&self, path: &str, body: Value) -> Result<String, TransportError> {
        let url = self.url(path);

        tracing::debug!(url = %url, body = %body, "PUT");

        let response = self.client.put(&url).json(&body).send().await?;
        Self::check_status(path, &response)?;

        let text = response.text().await?;

        tracing::debug!(body = %text, "PUT response");

        Ok(text)
    }

    async fn post(&self, path: &str, body: Value) -> Result<String, TransportError> {
        let url = self.url(path);

        tracing::debug!(url = %url, body = %body, "POST");

        let response = self.client.post(&url).json(&body).send().await?;
        Self::check_status(path, &response)?;

        let text = response.text().await?;

        tracing::debug!(body = %text, "POST response");

        Ok(text)
    }
}
