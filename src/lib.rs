//! # hitron-exporter
//!
//! Authenticated client for the web management interface of Hitron cable
//! modems (CGNV4 family), and a Prometheus exporter built on it.
//!
//! The device speaks HTTPS with a self-signed certificate and dated cipher
//! suites, so the TLS layer trusts by SHA-256 certificate pin instead of a
//! CA chain. Sessions follow the device's form protocol: a `preSession`
//! cookie from the landing page, a login POST, JSON datasets under `data/`,
//! and a logout POST.

pub mod client;
pub mod cookie;
pub mod credentials;
pub mod dataset;
pub mod error;
pub mod fingerprint;
pub mod metrics;
pub mod probe;
pub mod response;
pub mod server;
pub mod session;
pub mod timeouts;
pub mod transport;

// Re-exports
pub use client::{Client, ClientBuilder};
pub use cookie::CookieJar;
pub use credentials::Credential;
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use fingerprint::CertFingerprint;
pub use session::SessionState;
pub use timeouts::Timeouts;
