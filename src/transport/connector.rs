//! BoringSSL connector for the modem's HTTPS interface.

use boring::ssl::SslConnector;
use http::Uri;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_boring::SslStream;

use crate::error::{Error, Result};
use crate::fingerprint::CertFingerprint;
use crate::transport::tls::LegacyTlsConfig;

/// Opens TCP or TLS streams using a [`LegacyTlsConfig`].
#[derive(Clone)]
pub struct LegacyConnector {
    tls: LegacyTlsConfig,
    ssl: SslConnector,
    connect_timeout: Option<Duration>,
}

/// Stream that can be either HTTP (plain TCP) or HTTPS (TLS).
#[derive(Debug)]
pub enum MaybeHttpsStream {
    /// Plain TCP stream for HTTP.
    Http(TcpStream),
    /// TLS-wrapped stream for HTTPS.
    Https(SslStream<TcpStream>),
}

impl LegacyConnector {
    /// Create a connector for a TLS configuration.
    pub fn new(tls: LegacyTlsConfig) -> Result<Self> {
        let ssl = tls.connector()?;
        Ok(Self {
            tls,
            ssl,
            connect_timeout: None,
        })
    }

    /// Bound TCP connect plus TLS handshake.
    pub fn with_connect_timeout(mut self, connect_timeout: Option<Duration>) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn tls_config(&self) -> &LegacyTlsConfig {
        &self.tls
    }

    /// Connect to a URI, returning either a plain TCP or TLS stream.
    pub async fn connect(&self, uri: &Uri) -> Result<MaybeHttpsStream> {
        let host = uri
            .host()
            .ok_or_else(|| Error::connection("Missing host"))?;
        let https = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            other => {
                return Err(Error::connection(format!(
                    "Unsupported scheme: {}",
                    other.unwrap_or("<none>")
                )))
            }
        };
        let port = uri.port_u16().unwrap_or(if https { 443 } else { 80 });

        if https {
            let (stream, _) = self.connect_tls(host, port).await?;
            Ok(MaybeHttpsStream::Https(stream))
        } else {
            let stream = self.with_deadline(Self::tcp_connect(host, port)).await?;
            Ok(MaybeHttpsStream::Http(stream))
        }
    }

    /// Establish a TLS session and enforce the pin.
    ///
    /// Returns the stream together with the peer certificate fingerprint. On
    /// a pin mismatch the stream is dropped before anything is written to it.
    pub async fn connect_tls(
        &self,
        host: &str,
        port: u16,
    ) -> Result<(SslStream<TcpStream>, CertFingerprint)> {
        self.with_deadline(async {
            let tcp = Self::tcp_connect(host, port).await?;

            let mut config = self
                .ssl
                .configure()
                .map_err(|e| Error::tls(format!("Failed to configure SSL: {}", e)))?;
            // The certificate subject is a MAC address, never a DNS name.
            config.set_verify_hostname(false);

            let domain = host.trim_start_matches('[').trim_end_matches(']');
            let stream = tokio_boring::connect(config, domain, tcp)
                .await
                .map_err(|e| Error::tls(format!("TLS handshake failed: {}", e)))?;

            let fingerprint = self.tls.check_peer(stream.ssl())?;
            tracing::debug!("TLS session with {}:{} (peer {})", host, port, fingerprint);
            Ok((stream, fingerprint))
        })
        .await
    }

    async fn tcp_connect(host: &str, port: u16) -> Result<TcpStream> {
        let addr = format!("{}:{}", host, port);
        let host_only = host.trim_start_matches('[').trim_end_matches(']');
        TcpStream::connect((host_only, port))
            .await
            .map_err(|e| Error::connection(format!("Failed to connect to {}: {}", addr, e)))
    }

    async fn with_deadline<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        match self.connect_timeout {
            Some(limit) => timeout(limit, fut)
                .await
                .map_err(|_| Error::ConnectTimeout(limit))?,
            None => fut.await,
        }
    }
}

impl AsyncRead for MaybeHttpsStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            MaybeHttpsStream::Http(stream) => Pin::new(stream).poll_read(cx, buf),
            MaybeHttpsStream::Https(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeHttpsStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            MaybeHttpsStream::Http(stream) => Pin::new(stream).poll_write(cx, buf),
            MaybeHttpsStream::Https(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            MaybeHttpsStream::Http(stream) => Pin::new(stream).poll_flush(cx),
            MaybeHttpsStream::Https(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            MaybeHttpsStream::Http(stream) => Pin::new(stream).poll_shutdown(cx),
            MaybeHttpsStream::Https(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_unknown_scheme() {
        let connector = LegacyConnector::new(LegacyTlsConfig::new()).unwrap();
        let uri: Uri = "ftp://127.0.0.1/".parse().unwrap();
        let err = connector.connect(&uri).await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_connection_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connector = LegacyConnector::new(LegacyTlsConfig::new())
            .unwrap()
            .with_connect_timeout(Some(Duration::from_secs(2)));
        let uri: Uri = format!("https://127.0.0.1:{}/", port).parse().unwrap();
        let err = connector.connect(&uri).await.unwrap_err();
        assert!(err.is_transport());
    }
}
