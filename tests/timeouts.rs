use std::time::Duration;

use hitron_exporter::transport::connector::LegacyConnector;
use hitron_exporter::transport::http::HttpClient;
use hitron_exporter::transport::tls::LegacyTlsConfig;
use hitron_exporter::{Client, Error, Timeouts};
use tokio::net::TcpListener;

/// Accepts connections and never answers.
async fn silent_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    port
}

#[tokio::test]
async fn test_request_timeout() {
    let port = silent_server().await;
    let mut http = HttpClient::new(LegacyConnector::new(LegacyTlsConfig::new()).unwrap())
        .with_timeout(Some(Duration::from_millis(200)));

    let err = http
        .get(format!("http://127.0.0.1:{}/", port))
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(200)));
}

#[tokio::test]
async fn test_tls_handshake_counts_as_connect() {
    // The handshake never completes, so the connect deadline fires.
    let port = silent_server().await;
    let mut client = Client::builder("127.0.0.1")
        .port(port)
        .timeouts(Timeouts::default().connect(Duration::from_millis(200)))
        .build()
        .unwrap();

    let err = client.login("u", "p", false).await.unwrap_err();
    assert!(matches!(err, Error::ConnectTimeout(_)));
    assert!(err.is_transport());
}
