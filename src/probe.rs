//! One exporter scrape: login, collect, logout.

use std::sync::Arc;

use serde::Deserialize;

use crate::client::{Client, DEFAULT_PORT};
use crate::credentials::{Credential, CredentialCache, CredentialSource, VaultNamespace};
use crate::error::{Error, Result};
use crate::metrics::Collector;
use crate::timeouts::Timeouts;

/// Query parameters of a probe request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeParams {
    pub target: Option<String>,
    #[serde(rename = "_port")]
    pub port: Option<u16>,
    pub fingerprint: Option<String>,
    pub usr: Option<String>,
    pub pwd: Option<String>,
    pub ipa_vault_namespace: Option<String>,
    pub force: Option<String>,
}

impl ProbeParams {
    pub fn target(&self) -> Result<&str> {
        non_empty(&self.target).ok_or_else(|| Error::MissingParameter("target".into()))
    }

    /// `force=0` (default) or any non-zero integer.
    pub fn force(&self) -> Result<bool> {
        match non_empty(&self.force) {
            None => Ok(false),
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map(|n| n != 0)
                .map_err(|_| Error::InvalidParameter {
                    name: "force",
                    value: raw.to_string(),
                }),
        }
    }

    fn login_source(&self) -> Result<LoginSource> {
        if let (Some(usr), Some(pwd)) = (non_empty(&self.usr), non_empty(&self.pwd)) {
            return Ok(LoginSource::Direct(Credential::new(usr, pwd)));
        }
        match non_empty(&self.ipa_vault_namespace) {
            Some(ns) => ns
                .parse()
                .map(LoginSource::Vault)
                .map_err(|_| Error::InvalidParameter {
                    name: "ipa_vault_namespace",
                    value: ns.to_string(),
                }),
            None => Err(Error::MissingParameter(
                "usr, pwd or ipa_vault_namespace".into(),
            )),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

enum LoginSource {
    Direct(Credential),
    Vault(VaultNamespace),
}

/// Runs probes. Cheap to clone; clones share the credential cache.
#[derive(Clone, Default)]
pub struct Prober {
    source: Option<Arc<dyn CredentialSource>>,
    cache: CredentialCache,
    timeouts: Timeouts,
}

impl Prober {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where `ipa_vault_namespace` probes fetch credentials from.
    pub fn with_credential_source(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    /// Scrape one modem and return the text exposition of its metrics.
    pub async fn probe(&self, params: &ProbeParams) -> Result<String> {
        let target = params.target()?;
        let login = params.login_source()?;
        let force = params.force()?;

        let mut client = Client::builder(target)
            .port(params.port.unwrap_or(DEFAULT_PORT))
            .fingerprint_str(params.fingerprint.as_deref())?
            .timeouts(self.timeouts.clone())
            .build()?;
        client.report_unpinned().await?;

        let vault = match login {
            LoginSource::Direct(cred) => {
                client.login(&cred.usr, &cred.pwd, force).await?;
                None
            }
            LoginSource::Vault(ns) => {
                let cred = self.vault_credential(&ns).await?;
                match client.login(&cred.usr, &cred.pwd, force).await {
                    Ok(()) => self.cache.put(ns.clone(), cred),
                    Err(e) => {
                        if e.invalidates_credentials() {
                            self.cache.invalidate();
                        }
                        return Err(e);
                    }
                }
                Some(ns)
            }
        };

        let collected = Collector::fetch(&mut client).await;

        if let Err(e) = client.logout().await {
            tracing::error!("logout from {} failed: {}", client.base_url(), e);
        }

        let collector = match collected {
            Ok(c) => c,
            Err(e) => {
                if vault.is_some() && e.invalidates_credentials() {
                    self.cache.invalidate();
                }
                return Err(e);
            }
        };
        collector.encode()
    }

    async fn vault_credential(&self, ns: &VaultNamespace) -> Result<Credential> {
        if let Some(cred) = self.cache.get(ns) {
            return Ok(cred);
        }
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| Error::credentials("no credential source configured"))?;
        source.retrieve(ns).await
    }
}
