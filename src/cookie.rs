//! Host-scoped cookie storage.
//!
//! Manual cookie storage and management - no automatic cookie engine. Cookies
//! are keyed by the exact host of the request that received them; a `Domain`
//! attribute is recorded but never widens that scope, so a cookie from one
//! host cannot reach another host's request.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use url::Url;

use crate::error::{Error, Result};

/// A cookie received from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Host the cookie was received from (lowercase).
    pub host: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    /// Absolute expiry. `Max-Age` is folded in at parse time.
    pub expires: Option<DateTime<Utc>>,
    /// `Domain` attribute as sent, informational only.
    pub domain_attr: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            host: normalize_host(&host.into()),
            path: "/".to_string(),
            secure: false,
            http_only: false,
            expires: None,
            domain_attr: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Parse a `Set-Cookie` value received in response to `request_url`.
    pub fn from_set_cookie_header(header: &str, request_url: &str) -> Result<Self> {
        let parsed_url = Url::parse(request_url)?;
        Self::parse_for_url(header, &parsed_url, Utc::now())
    }

    fn parse_for_url(header: &str, url: &Url, now: DateTime<Utc>) -> Result<Self> {
        let request_host = url
            .host_str()
            .ok_or_else(|| Error::CookieParse("No host in URL".to_string()))?;

        let mut parts = header.split(';').map(str::trim);
        let (name, value) = match parts.next().and_then(|p| p.split_once('=')) {
            Some((n, v)) => (n.trim().to_string(), v.trim().trim_matches('"').to_string()),
            None => return Err(Error::CookieParse("No = in cookie".to_string())),
        };

        if name.is_empty() {
            return Err(Error::CookieParse("Empty cookie name".to_string()));
        }

        let mut cookie = Cookie::new(name, value, request_host).with_path(default_path(url));
        let mut max_age: Option<i64> = None;

        for attr in parts {
            let attr_lower = attr.to_ascii_lowercase();
            if attr_lower == "secure" {
                cookie.secure = true;
            } else if attr_lower == "httponly" {
                cookie.http_only = true;
            } else if let Some((key, val)) = attr.split_once('=') {
                let val = val.trim();
                match key.trim().to_ascii_lowercase().as_str() {
                    "domain" => cookie.domain_attr = Some(val.to_string()),
                    "path" if val.starts_with('/') => cookie.path = val.to_string(),
                    "expires" => cookie.expires = parse_cookie_date(val),
                    "max-age" => max_age = val.parse().ok(),
                    _ => {}
                }
            }
        }

        // Max-Age takes precedence over Expires.
        if let Some(secs) = max_age {
            cookie.expires = if secs <= 0 {
                Some(DateTime::<Utc>::MIN_UTC)
            } else {
                chrono::Duration::try_seconds(secs).and_then(|d| now.checked_add_signed(d))
            };
        }

        Ok(cookie)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|e| e <= now)
    }

    pub fn matches_url(&self, url: &Url) -> bool {
        let request_host = match url.host_str() {
            Some(h) => normalize_host(h),
            None => return false,
        };

        if request_host != self.host {
            return false;
        }
        if self.secure && url.scheme() != "https" {
            return false;
        }
        if self.is_expired(Utc::now()) {
            return false;
        }

        path_matches(url.path(), &self.path)
    }

    /// Short hash of the value, for logs that must not show session tokens.
    pub fn value_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let result = Sha256::digest(self.value.as_bytes());
        result[..4].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Cookie store: host -> name -> cookie.
#[derive(Debug, Default, Clone)]
pub struct CookieJar {
    cookies: HashMap<String, HashMap<String, Cookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; an already-expired cookie deletes the stored one.
    pub fn store(&mut self, cookie: Cookie) {
        if cookie.is_expired(Utc::now()) {
            self.remove(&cookie.host, &cookie.name);
            return;
        }
        self.cookies
            .entry(cookie.host.clone())
            .or_default()
            .insert(cookie.name.clone(), cookie);
    }

    pub fn cookies(&self) -> Vec<&Cookie> {
        self.cookies.values().flat_map(|m| m.values()).collect()
    }

    /// Cookies to send with a request to `url`. Only the bucket for the
    /// request's own host is consulted.
    pub fn cookies_for_url(&self, url: &Url) -> Vec<&Cookie> {
        let Some(host) = url.host_str() else {
            return Vec::new();
        };
        let mut matching: Vec<&Cookie> = self
            .cookies
            .get(&normalize_host(host))
            .map(|m| m.values().filter(|c| c.matches_url(url)).collect())
            .unwrap_or_default();
        // RFC 6265 5.4: longer paths first; name order keeps the header stable.
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()).then(a.name.cmp(&b.name)));
        matching
    }

    pub fn build_cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.cookies_for_url(url);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Merge `Set-Cookie` values received in response to `request_url`.
    /// Malformed values are skipped.
    pub fn store_from_set_cookie<'a>(
        &mut self,
        values: impl IntoIterator<Item = &'a str>,
        request_url: &Url,
    ) {
        let now = Utc::now();
        for value in values {
            match Cookie::parse_for_url(value, request_url, now) {
                Ok(cookie) => {
                    tracing::debug!(
                        "cookie {} (#{}) from {}",
                        cookie.name,
                        cookie.value_hash(),
                        cookie.host
                    );
                    self.store(cookie);
                }
                Err(e) => tracing::debug!("ignoring Set-Cookie from {}: {}", request_url, e),
            }
        }
    }

    pub fn get(&self, host: &str, name: &str) -> Option<&Cookie> {
        self.cookies.get(&normalize_host(host))?.get(name)
    }

    pub fn remove(&mut self, host: &str, name: &str) -> Option<Cookie> {
        let host = normalize_host(host);
        let bucket = self.cookies.get_mut(&host)?;
        let removed = bucket.remove(name);
        if bucket.is_empty() {
            self.cookies.remove(&host);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    pub fn len(&self) -> usize {
        self.cookies.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// RFC 6265 5.1.4 default-path.
fn default_path(url: &Url) -> String {
    let path = url.path();
    if !path.starts_with('/') {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

/// RFC 6265 5.1.4 path-match.
fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

fn parse_cookie_date(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(date_str) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%a, %d %b %Y %H:%M:%S GMT",
        "%a, %d-%b-%Y %H:%M:%S GMT",
        "%a, %d-%b-%y %H:%M:%S GMT",
        "%Y-%m-%dT%H:%M:%SZ",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, fmt) {
            return Some(dt.and_utc());
        }
    }
    date_str
        .parse::<i64>()
        .ok()
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
}
