//! Report the fingerprint a host presents, for operators who have not pinned one yet.

use std::time::Duration;

use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::fingerprint::CertFingerprint;
use crate::transport::connector::LegacyConnector;
use crate::transport::tls::LegacyTlsConfig;

/// Connect to `host:port` with trust disabled and fingerprint the peer certificate.
///
/// Any pin in `tls` is ignored. The result is informational only and must
/// not be fed back as a pin automatically.
pub async fn probe_fingerprint(
    host: &str,
    port: u16,
    tls: &LegacyTlsConfig,
    connect_timeout: Duration,
) -> Result<CertFingerprint> {
    let connector =
        LegacyConnector::new(tls.unpinned())?.with_connect_timeout(Some(connect_timeout));
    let (mut stream, fingerprint) = connector.connect_tls(host, port).await?;
    // close_notify is a courtesy; the embedded server often just drops the socket.
    let _ = stream.shutdown().await;
    Ok(fingerprint)
}
