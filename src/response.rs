//! Raw HTTP response as returned by the request wrapper.

use bytes::Bytes;

use crate::error::{Error, Result};

/// HTTP response. Status is not interpreted here.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// Header lines as `Name: value`, in wire order.
    pub headers: Vec<String>,
    body: Bytes,
    /// The URL that was requested.
    pub effective_url: Option<String>,
}

impl Response {
    pub fn new(status: u16, headers: Vec<String>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            effective_url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.effective_url = Some(url.into());
        self
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
    pub fn redirect_url(&self) -> Option<&str> {
        self.get_header("Location")
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.get_headers(name).into_iter().next()
    }

    pub fn get_headers(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter_map(|h| {
                let (key, value) = h.split_once(':')?;
                if key.trim().eq_ignore_ascii_case(name) {
                    Some(value.trim())
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get_header("Content-Type")
    }

    /// All `Set-Cookie` values, one per header line.
    pub fn set_cookies(&self) -> Vec<&str> {
        self.get_headers("Set-Cookie")
    }

    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| Error::response_format(format!("UTF-8 decode error: {}", e)))
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Error::from)
    }
}
