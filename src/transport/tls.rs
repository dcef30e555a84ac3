//! Relaxed TLS configuration for the modem's embedded web server.
//!
//! The device serves a 1024-bit RSA certificate with a MAC address as its
//! subject and only speaks older TLS 1.2 suites. We therefore:
//!
//! - skip chain and hostname validation entirely,
//! - offer the legacy RSA key exchange and AES-CBC suites next to the modern ones,
//! - never go below TLS 1.2,
//! - optionally pin the peer certificate by SHA-256 digest, which is the only
//!   trust decision made for the connection.

use boring::ssl::{SslConnector, SslMethod, SslRef, SslVerifyMode, SslVersion};

use crate::error::{Error, Result};
use crate::fingerprint::CertFingerprint;

/// TLS 1.2 cipher suites offered to the device, modern first.
///
/// The tail (plain RSA key exchange, CBC with SHA-1 MAC) is what the modem
/// actually negotiates.
pub const LEGACY_CIPHER_SUITES: &[&str] = &[
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "ECDHE-ECDSA-AES128-SHA",
    "ECDHE-RSA-AES128-SHA",
    "ECDHE-ECDSA-AES256-SHA",
    "ECDHE-RSA-AES256-SHA",
    "AES128-GCM-SHA256",
    "AES256-GCM-SHA384",
    "AES128-SHA",
    "AES256-SHA",
];

/// TLS client configuration tolerant of the modem's legacy server.
#[derive(Debug, Clone)]
pub struct LegacyTlsConfig {
    /// Cipher suites in order (OpenSSL names).
    pub cipher_list: Vec<&'static str>,
    /// Expected peer certificate digest, if pinned.
    pin: Option<CertFingerprint>,
}

impl Default for LegacyTlsConfig {
    fn default() -> Self {
        Self {
            cipher_list: LEGACY_CIPHER_SUITES.to_vec(),
            pin: None,
        }
    }
}

impl LegacyTlsConfig {
    /// Relaxed configuration without a pin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relaxed configuration that only accepts a peer with this certificate.
    pub fn pinned(pin: CertFingerprint) -> Self {
        Self::default().with_pin(Some(pin))
    }

    /// Set or clear the certificate pin.
    pub fn with_pin(mut self, pin: Option<CertFingerprint>) -> Self {
        self.pin = pin;
        self
    }

    /// Same configuration with the pin removed.
    pub fn unpinned(&self) -> Self {
        self.clone().with_pin(None)
    }

    pub fn pin(&self) -> Option<&CertFingerprint> {
        self.pin.as_ref()
    }

    /// Build the BoringSSL connector.
    ///
    /// Peer verification is disabled at the library level; the pin is
    /// enforced by [`LegacyTlsConfig::check_peer`] once the handshake completes.
    pub fn connector(&self) -> Result<SslConnector> {
        let mut builder = SslConnector::builder(SslMethod::tls_client())
            .map_err(|e| Error::tls(format!("Failed to create SSL connector: {}", e)))?;

        if !self.cipher_list.is_empty() {
            builder
                .set_cipher_list(&self.cipher_list.join(":"))
                .map_err(|e| Error::tls(format!("Failed to set cipher list: {}", e)))?;
        }

        builder
            .set_min_proto_version(Some(SslVersion::TLS1_2))
            .map_err(|e| Error::tls(format!("Failed to set min TLS version: {}", e)))?;
        builder
            .set_max_proto_version(Some(SslVersion::TLS1_3))
            .map_err(|e| Error::tls(format!("Failed to set max TLS version: {}", e)))?;

        builder.set_verify(SslVerifyMode::NONE);

        builder
            .set_alpn_protos(b"\x08http/1.1")
            .map_err(|e| Error::tls(format!("Failed to set ALPN: {}", e)))?;

        Ok(builder.build())
    }

    /// Fingerprint the peer of an established session and enforce the pin.
    ///
    /// Must run before any application data is written.
    pub fn check_peer(&self, ssl: &SslRef) -> Result<CertFingerprint> {
        let cert = ssl.peer_certificate().ok_or_else(|| {
            Error::protocol_violation("TLS handshake completed without a peer certificate")
        })?;
        let der = cert
            .to_der()
            .map_err(|e| Error::tls(format!("Failed to encode peer certificate: {}", e)))?;
        let actual = CertFingerprint::of_der(&der);

        match &self.pin {
            Some(expected) if *expected != actual => Err(Error::FingerprintMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            }),
            _ => Ok(actual),
        }
    }
}
