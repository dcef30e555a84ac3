//! Cookie-scoped HTTP/1.1 requests over the legacy TLS connector.
//!
//! Every request opens its own connection and is sent exactly once. There is
//! no retry and no redirect following: a 3xx comes back to the caller as a
//! plain [`Response`]. Cookies are attached from, and stored into, the bucket
//! of the request URL's host only.

use std::time::Duration;

use bytes::Bytes;
use http::header::{CONNECTION, CONTENT_TYPE, COOKIE, HOST};
use http::{Method, Request as HttpRequest, Uri};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::time::timeout as tokio_timeout;
use url::Url;

use crate::cookie::CookieJar;
use crate::error::{Error, Result};
use crate::response::Response;
use crate::transport::connector::{LegacyConnector, MaybeHttpsStream};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP client owning one connector and one cookie jar.
pub struct HttpClient {
    connector: LegacyConnector,
    jar: CookieJar,
    timeout: Option<Duration>,
}

/// Builder for a single request.
pub struct RequestBuilder<'a> {
    client: &'a mut HttpClient,
    url: String,
    method: Method,
    headers: Vec<(String, String)>,
    form: Option<Vec<(String, String)>>,
    timeout: Option<Option<Duration>>,
}

impl HttpClient {
    pub fn new(connector: LegacyConnector) -> Self {
        Self {
            connector,
            jar: CookieJar::new(),
            timeout: None,
        }
    }

    /// Default per-request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connector(&self) -> &LegacyConnector {
        &self.connector
    }

    /// Cookies received so far.
    pub fn cookies(&self) -> &CookieJar {
        &self.jar
    }

    /// Forget every stored cookie.
    pub fn clear_cookies(&mut self) {
        self.jar.clear();
    }

    /// Create a GET request builder.
    pub fn get(&mut self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::GET, url)
    }

    /// Create a POST request builder.
    pub fn post(&mut self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::POST, url)
    }

    /// Create a custom method request builder.
    pub fn request(&mut self, method: Method, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            url: url.into(),
            method,
            headers: Vec::new(),
            form: None,
            timeout: None,
        }
    }
}

impl<'a> RequestBuilder<'a> {
    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Send form fields as an urlencoded body, in the given order.
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.form = Some(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Override the client's timeout for this request.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send the request and return the response.
    pub async fn send(self) -> Result<Response> {
        let RequestBuilder {
            client,
            url,
            method,
            headers,
            form,
            timeout,
        } = self;

        let url = Url::parse(&url)?;
        let uri: Uri = url
            .as_str()
            .parse()
            .map_err(|e| Error::http_protocol(format!("Invalid URI: {}", e)))?;
        let limit = timeout.unwrap_or(client.timeout);

        let request = build_request(&method, &url, &headers, form.as_deref(), &client.jar)?;

        // Connect errors (refused, TLS, pin mismatch) surface before any
        // request bytes exist on the wire.
        let stream = client.connector.connect(&uri).await?;

        let exchange = send_http1(stream, request);
        let (status, response_headers, body) = match limit {
            Some(limit) => tokio_timeout(limit, exchange)
                .await
                .map_err(|_| Error::Timeout(limit))??,
            None => exchange.await?,
        };

        let response = Response::new(status, response_headers, body).with_url(url.as_str());
        tracing::debug!("{} {} -> {}", method, url, response.status);

        client.jar.store_from_set_cookie(response.set_cookies(), &url);
        Ok(response)
    }
}

fn build_request(
    method: &Method,
    url: &Url,
    headers: &[(String, String)],
    form: Option<&[(String, String)]>,
    jar: &CookieJar,
) -> Result<HttpRequest<Full<Bytes>>> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::http_protocol(format!("URL has no host: {}", url)))?;
    let host_header = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let target = match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    };

    let mut builder = HttpRequest::builder()
        .method(method.clone())
        .uri(target)
        .header(HOST, host_header)
        .header(CONNECTION, "close");

    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    if let Some(cookie) = jar.build_cookie_header(url) {
        builder = builder.header(COOKIE, cookie);
    }

    let body = match form {
        Some(fields) => {
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE);
            Bytes::from(encode_form(fields))
        }
        None => Bytes::new(),
    };

    builder
        .body(Full::new(body))
        .map_err(|e| Error::http_protocol(format!("Failed to build request: {}", e)))
}

/// `application/x-www-form-urlencoded` body, field order preserved.
pub fn encode_form(fields: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

async fn send_http1(
    stream: MaybeHttpsStream,
    request: HttpRequest<Full<Bytes>>,
) -> Result<(u16, Vec<String>, Bytes)> {
    let io = TokioIo::new(stream);
    let (mut sender, conn) = http1::handshake(io)
        .await
        .map_err(|e| Error::http_protocol(format!("HTTP/1.1 handshake failed: {}", e)))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("HTTP/1.1 connection closed with error: {}", e);
        }
    });

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| Error::http_protocol(format!("HTTP/1.1 request failed: {}", e)))?;

    let (parts, body) = response.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|e| Error::http_protocol(format!("Failed to read body: {}", e)))?
        .to_bytes();

    let headers = parts
        .headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())))
        .collect();

    Ok((parts.status.as_u16(), headers, body))
}
