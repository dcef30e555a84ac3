//! Transport layer.
//!
//! - TLS configuration for the device's legacy stack, pinned by fingerprint
//! - TCP/TLS connector built on tokio-boring
//! - Cookie-scoped HTTP/1.1 requests via hyper

pub mod connector;
pub mod http;
pub mod tls;
