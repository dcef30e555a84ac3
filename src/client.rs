//! Authenticated client for the modem's management interface.
//!
//! One [`Client`] serves one probe: login, a few dataset fetches, logout.
//! Every network operation takes `&mut self`, so a client cannot be driven
//! by two callers at once; concurrent probes build their own clients.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::fingerprint::{probe_fingerprint, CertFingerprint};
use crate::response::Response;
use crate::session::{SessionState, LOGIN_SUCCESS, PRESESSION_COOKIE};
use crate::timeouts::Timeouts;
use crate::transport::connector::LegacyConnector;
use crate::transport::http::HttpClient;
use crate::transport::tls::LegacyTlsConfig;

/// Default HTTPS port of the management interface.
pub const DEFAULT_PORT: u16 = 443;

/// Timeout used when probing the certificate of an unpinned host.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for one modem.
pub struct Client {
    base_url: Url,
    host: String,
    port: u16,
    http: HttpClient,
    timeouts: Timeouts,
    state: SessionState,
}

/// Builder for creating clients.
pub struct ClientBuilder {
    host: String,
    port: u16,
    fingerprint: Option<CertFingerprint>,
    tls: LegacyTlsConfig,
    timeouts: Timeouts,
}

impl Client {
    /// Create a new client builder for `host`.
    pub fn builder(host: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(host)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Session state as last observed.
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn fingerprint(&self) -> Option<&CertFingerprint> {
        self.http.connector().tls_config().pin()
    }

    /// Raw cookie-scoped HTTP access.
    pub fn http(&mut self) -> &mut HttpClient {
        &mut self.http
    }

    /// Probe and log the certificate fingerprint when none is pinned.
    ///
    /// Returns the fingerprint that was observed, or `None` when pinned.
    /// The observed value is never used as a pin.
    pub async fn report_unpinned(&self) -> Result<Option<CertFingerprint>> {
        if self.fingerprint().is_some() {
            return Ok(None);
        }
        let tls = self.http.connector().tls_config();
        let observed = probe_fingerprint(&self.host, self.port, tls, PROBE_TIMEOUT).await?;
        tracing::warn!(
            "Communication with <{}> is insecure because the expected TLS server certificate \
             fingerprint was not specified. The host presented a certificate with the \
             following fingerprint: {}",
            self.base_url,
            observed
        );
        Ok(Some(observed))
    }

    /// Log in with the device's form protocol.
    ///
    /// `force` logs off any other active session instead of failing with
    /// `Repeat Login`. On any error the state is [`SessionState::LoggedOut`]
    /// and the cookie jar is emptied.
    pub async fn login(&mut self, usr: &str, pwd: &str, force: bool) -> Result<()> {
        let result = self.login_sequence(usr, pwd, force).await;
        self.state = match &result {
            Ok(()) => SessionState::LoggedIn,
            Err(e) => {
                tracing::debug!("login to {} failed while {}: {}", self.base_url, self.state, e);
                // Whatever the device set during a failed attempt is not a session.
                self.http.clear_cookies();
                SessionState::LoggedOut
            }
        };
        result
    }

    async fn login_sequence(&mut self, usr: &str, pwd: &str, force: bool) -> Result<()> {
        // The landing page hands out a preSession cookie; without it echoed
        // in the form, the device answers "session timeout expired".
        self.state = SessionState::AwaitingPreSession;
        let landing = self.base_url.clone();
        self.http.get(landing.as_str()).send().await?;

        let presession = self
            .http
            .cookies()
            .get(&self.host, PRESESSION_COOKIE)
            .cloned()
            .ok_or_else(|| Error::protocol_violation("preSession cookie not in jar"))?;

        self.state = SessionState::LoggingIn;
        let login_url = self.url("goform/login")?;
        let fields = [
            ("usr", usr.to_string()),
            ("pwd", pwd.to_string()),
            ("forcelogoff", String::from(if force { "1" } else { "0" })),
            (presession.name.as_str(), presession.value.clone()),
        ];
        let response = self
            .http
            .post(login_url.as_str())
            .form(fields)
            .timeout(self.timeouts.login)
            .send()
            .await?;

        if response.status != 200 {
            return Err(Error::unexpected_status("login", response.status));
        }

        // Observed failures: "Repeat Login", "Wrong Credentials."
        if response.body().as_ref() != LOGIN_SUCCESS {
            let message = String::from_utf8_lossy(response.body()).into_owned();
            tracing::debug!("login to {} rejected: {:?}", self.base_url, message);
            return Err(Error::LoginFailure(message));
        }

        tracing::debug!("logged in to {} as {}", self.base_url, usr);
        Ok(())
    }

    /// Fetch one dataset and return its JSON verbatim.
    pub async fn get_data(&mut self, dataset: Dataset) -> Result<Value> {
        let response = self.fetch(dataset).await?;
        serde_json::from_slice(response.body()).map_err(|e| {
            Error::response_format(format!("{} is not valid JSON: {}", dataset, e))
        })
    }

    /// Fetch one dataset and deserialize it into `T`.
    pub async fn get_data_as<T: DeserializeOwned>(&mut self, dataset: Dataset) -> Result<T> {
        let response = self.fetch(dataset).await?;
        serde_json::from_slice(response.body())
            .map_err(|e| Error::response_format(format!("{}: {}", dataset, e)))
    }

    async fn fetch(&mut self, dataset: Dataset) -> Result<Response> {
        let url = self.url(&dataset.path())?;
        let response = self.http.get(url.as_str()).send().await?;

        match response.status {
            200 => {}
            // The device silently dropped the session and redirects to login.
            302 => {
                self.state = SessionState::LoggedOut;
                return Err(Error::NotLoggedIn);
            }
            status => return Err(Error::unexpected_status("data", status)),
        }

        match response.content_type() {
            Some("application/json") => Ok(response),
            other => Err(Error::response_format(format!(
                "Unexpected data response content-type: {:?}",
                other
            ))),
        }
    }

    /// Log out. The state is `LoggedOut` afterwards whatever the outcome.
    pub async fn logout(&mut self) -> Result<()> {
        let result = self.logout_request().await;
        self.state = SessionState::LoggedOut;
        result
    }

    async fn logout_request(&mut self) -> Result<()> {
        let url = self.url("goform/logout")?;
        let response = self
            .http
            .post(url.as_str())
            .form([("data", "byebye")])
            .send()
            .await?;
        if response.status != 302 {
            return Err(Error::unexpected_status("logout", response.status));
        }
        Ok(())
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

impl ClientBuilder {
    /// Create a new client builder with default settings.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            fingerprint: None,
            tls: LegacyTlsConfig::default(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Pin the modem's certificate.
    pub fn fingerprint(mut self, fingerprint: CertFingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// Pin from an optional string; empty means unpinned.
    pub fn fingerprint_str(mut self, fingerprint: Option<&str>) -> Result<Self> {
        self.fingerprint = match fingerprint.map(str::trim) {
            Some("") | None => None,
            Some(s) => Some(s.parse()?),
        };
        Ok(self)
    }

    /// Replace the TLS configuration (cipher list). The pin set with
    /// [`ClientBuilder::fingerprint`] still applies.
    pub fn tls(mut self, tls: LegacyTlsConfig) -> Self {
        self.tls = tls;
        self
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        let host = self.host.trim().to_ascii_lowercase();
        if host.is_empty() {
            return Err(Error::connection("Missing host"));
        }
        let authority = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]", host)
        } else {
            host
        };
        let base_url = Url::parse(&format!("https://{}:{}/", authority, self.port))?;
        let url_host = base_url
            .host_str()
            .ok_or_else(|| Error::connection("Missing host"))?
            .to_string();

        let tls = self.tls.with_pin(self.fingerprint);
        let connector = LegacyConnector::new(tls)?.with_connect_timeout(self.timeouts.connect);
        let http = HttpClient::new(connector).with_timeout(self.timeouts.request);

        Ok(Client {
            base_url,
            host: url_host,
            port: self.port,
            http,
            timeouts: self.timeouts,
            state: SessionState::LoggedOut,
        })
    }
}
