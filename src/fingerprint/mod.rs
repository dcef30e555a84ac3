//! Certificate fingerprints for pinning the modem's self-signed certificate.
//!
//! The modem presents a certificate whose subject is its MAC address, so
//! neither hostname nor chain validation can work. Trust is instead anchored
//! on the SHA-256 digest of the certificate's DER encoding, written the way
//! `openssl x509 -fingerprint -sha256` prints it (colon-separated octets).

pub mod probe;

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

pub use probe::probe_fingerprint;

/// SHA-256 digest of a DER-encoded X.509 certificate.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CertFingerprint([u8; CertFingerprint::LEN]);

impl CertFingerprint {
    /// Digest length in bytes.
    pub const LEN: usize = 32;

    /// Fingerprint a DER-encoded certificate.
    pub fn of_der(der: &[u8]) -> Self {
        Self(Sha256::digest(der).into())
    }

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl FromStr for CertFingerprint {
    type Err = Error;

    /// Parse `aa:bb:...` (32 octets, either case) or the same 64 hex digits
    /// without separators.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut bytes = [0u8; Self::LEN];

        if !s.contains(':') {
            if s.len() != Self::LEN * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::InvalidFingerprint(format!(
                    "expected {} hex digits, got {:?}",
                    Self::LEN * 2,
                    s
                )));
            }
            for (byte, pair) in bytes.iter_mut().zip(s.as_bytes().chunks(2)) {
                let pair = std::str::from_utf8(pair)
                    .map_err(|e| Error::InvalidFingerprint(e.to_string()))?;
                *byte = u8::from_str_radix(pair, 16)
                    .map_err(|e| Error::InvalidFingerprint(e.to_string()))?;
            }
            return Ok(Self(bytes));
        }

        let mut count = 0;
        for part in s.split(':') {
            if count == Self::LEN {
                return Err(Error::InvalidFingerprint(format!(
                    "expected {} octets, got more",
                    Self::LEN
                )));
            }
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::InvalidFingerprint(format!("bad octet {:?}", part)));
            }
            bytes[count] = u8::from_str_radix(part, 16)
                .map_err(|e| Error::InvalidFingerprint(e.to_string()))?;
            count += 1;
        }
        if count != Self::LEN {
            return Err(Error::InvalidFingerprint(format!(
                "expected {} octets, got {}",
                Self::LEN,
                count
            )));
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for CertFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CertFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertFingerprint({})", self)
    }
}
