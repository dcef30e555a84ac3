//! Login credentials and where they come from.
//!
//! The client itself treats a [`Credential`] as opaque. Retrieval and caching
//! belong to the probe layer: [`CredentialSource`] fetches from an external
//! store, [`CredentialCache`] keeps the last good pair process-wide until a
//! login proves it stale.

use std::fmt;
use std::process::Stdio;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Username/password pair for the modem's login form.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credential {
    pub usr: String,
    pub pwd: String,
}

impl Credential {
    pub fn new(usr: impl Into<String>, pwd: impl Into<String>) -> Self {
        Self {
            usr: usr.into(),
            pwd: pwd.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("usr", &self.usr)
            .field("pwd", &"***")
            .finish()
    }
}

/// Vault location of a credential: `user:<name>` or `service:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VaultNamespace {
    User(String),
    Service(String),
}

impl FromStr for VaultNamespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some(("user", name)) if !name.is_empty() => Ok(Self::User(name.to_string())),
            Some(("service", name)) if !name.is_empty() => Ok(Self::Service(name.to_string())),
            _ => Err(Error::credentials(format!(
                "vault namespace must be 'user:<name>' or 'service:<name>', got {:?}",
                s
            ))),
        }
    }
}

impl VaultNamespace {
    /// JSON request understood by the retrieval helper.
    fn to_request(&self) -> serde_json::Value {
        match self {
            Self::User(name) => serde_json::json!({ "user": name }),
            Self::Service(name) => serde_json::json!({ "service": name }),
        }
    }
}

/// Somewhere credentials can be fetched from.
pub trait CredentialSource: Send + Sync {
    fn retrieve<'a>(
        &'a self,
        namespace: &'a VaultNamespace,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Credential>> + Send + 'a>>;
}

/// Runs an external helper: JSON request on stdin, `{"usr":..,"pwd":..}` on stdout.
#[derive(Debug, Clone)]
pub struct CommandCredentialSource {
    program: String,
    args: Vec<String>,
}

impl CommandCredentialSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a shell-style command line on whitespace.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| Error::credentials("empty credential command"))?;
        Ok(Self::new(program, words.collect()))
    }

    async fn run(&self, namespace: &VaultNamespace) -> Result<Credential> {
        let input = namespace.to_request().to_string();
        tracing::debug!("Launching {} with input: {}", self.program, input);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| Error::credentials(format!("failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).await.map_err(|e| {
                Error::credentials(format!("failed to write to {}: {}", self.program, e))
            })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::credentials(format!("{} failed: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(Error::credentials(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::credentials(format!("unusable helper output: {}", e)))
    }
}

impl CredentialSource for CommandCredentialSource {
    fn retrieve<'a>(
        &'a self,
        namespace: &'a VaultNamespace,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Credential>> + Send + 'a>> {
        Box::pin(self.run(namespace))
    }
}

/// Process-wide cache of the last credential that logged in successfully.
#[derive(Debug, Clone, Default)]
pub struct CredentialCache {
    inner: Arc<Mutex<Option<(VaultNamespace, Credential)>>>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, namespace: &VaultNamespace) -> Option<Credential> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, c)| c.clone())
    }

    pub fn put(&self, namespace: VaultNamespace, credential: Credential) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some((namespace, credential));
    }

    pub fn invalidate(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}
