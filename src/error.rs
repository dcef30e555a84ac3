//! Error types for the hitron-exporter crate.

use std::io;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the modem or exporting its data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection error (DNS, TCP connect, socket I/O).
    #[error("Connection error: {0}")]
    Connection(String),

    /// TLS/SSL error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The peer certificate does not match the pinned fingerprint.
    #[error("Fingerprints did not match. Expected \"{expected}\", got \"{actual}\"")]
    FingerprintMismatch { expected: String, actual: String },

    /// Connect timeout (TCP + TLS handshake).
    #[error("Connect timeout after {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// Request timeout (request sent until response body received).
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// HTTP protocol error.
    #[error("HTTP protocol error: {0}")]
    HttpProtocol(String),

    /// The device behaved outside every variant we have observed.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// The login form rejected the credentials. Carries the device's message.
    #[error("Login failed: {0}")]
    LoginFailure(String),

    /// The device dropped the session (302 on a data resource).
    #[error("Not logged in")]
    NotLoggedIn,

    /// A status code outside the documented set for a call.
    #[error("Unexpected {context} response status: {status}")]
    UnexpectedStatus { context: &'static str, status: u16 },

    /// Wrong content type or unusable body.
    #[error("Unexpected response format: {0}")]
    ResponseFormat(String),

    /// Certificate fingerprint string could not be parsed.
    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    /// Cookie parsing error.
    #[error("Cookie parse error: {0}")]
    CookieParse(String),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Credentials could not be obtained.
    #[error("Credential retrieval failed: {0}")]
    Credentials(String),

    /// A probe request lacked a required parameter.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// A probe request parameter could not be interpreted.
    #[error("Invalid parameter {name}: {value:?}")]
    InvalidParameter { name: &'static str, value: String },

    /// Metric registration or encoding error.
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an HTTP protocol error.
    pub fn http_protocol(message: impl Into<String>) -> Self {
        Self::HttpProtocol(message.into())
    }

    /// Create a protocol violation error.
    pub fn protocol_violation(message: impl Into<String>) -> Self {
        Self::ProtocolViolation(message.into())
    }

    /// Create a response format error.
    pub fn response_format(message: impl Into<String>) -> Self {
        Self::ResponseFormat(message.into())
    }

    /// Create an unexpected status error.
    pub fn unexpected_status(context: &'static str, status: u16) -> Self {
        Self::UnexpectedStatus { context, status }
    }

    /// Create a credential retrieval error.
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials(message.into())
    }

    /// Whether this failure happened below HTTP (socket, TLS, pinning, timeouts).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::Tls(_)
                | Self::FingerprintMismatch { .. }
                | Self::ConnectTimeout(_)
                | Self::Timeout(_)
                | Self::HttpProtocol(_)
                | Self::Io(_)
        )
    }

    /// Whether cached credentials must be discarded after this failure.
    ///
    /// Only a rejected login or a dropped session say anything about the
    /// credentials themselves.
    pub fn invalidates_credentials(&self) -> bool {
        matches!(self, Self::LoginFailure(_) | Self::NotLoggedIn)
    }
}
