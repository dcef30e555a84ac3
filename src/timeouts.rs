//! Timeout configuration for modem requests.
//!
//! Cancellation is exclusively by timeout; there is no other way to abort a
//! request in flight.
//!
//! # Timeout Types
//!
//! - **connect**: TCP connect + TLS handshake
//! - **request**: request written until the full response body is read
//! - **login**: replaces `request` for the login form POST, which the device
//!   answers slowly while it tears down or sets up sessions
//!
//! # Usage
//!
//! ```rust,ignore
//! use hitron_exporter::{Client, Timeouts};
//! use std::time::Duration;
//!
//! let client = Client::builder("192.168.0.1")
//!     .timeouts(Timeouts::default().login(Duration::from_secs(20)))
//!     .build()?;
//! ```

use std::time::Duration;

/// Timeout configuration for modem requests.
///
/// When a timeout is `None`, no limit is applied for that phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Deadline for establishing the transport connection.
    ///
    /// Default: 5s
    pub connect: Option<Duration>,

    /// Deadline for one request/response exchange once connected.
    ///
    /// Default: 5s
    pub request: Option<Duration>,

    /// Deadline for the login POST exchange.
    ///
    /// Default: 15s
    pub login: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Some(Duration::from_secs(5)),
            request: Some(Duration::from_secs(5)),
            login: Some(Duration::from_secs(15)),
        }
    }
}

impl Timeouts {
    /// Create a new Timeouts with all timeouts set to None.
    pub fn none() -> Self {
        Self {
            connect: None,
            request: None,
            login: None,
        }
    }

    /// Set connect timeout.
    pub fn connect(mut self, timeout: Duration) -> Self {
        self.connect = Some(timeout);
        self
    }

    /// Set request timeout.
    pub fn request(mut self, timeout: Duration) -> Self {
        self.request = Some(timeout);
        self
    }

    /// Set login timeout.
    pub fn login(mut self, timeout: Duration) -> Self {
        self.login = Some(timeout);
        self
    }

    /// Disable connect timeout.
    pub fn no_connect_timeout(mut self) -> Self {
        self.connect = None;
        self
    }

    /// Disable request timeout.
    pub fn no_request_timeout(mut self) -> Self {
        self.request = None;
        self
    }
}
