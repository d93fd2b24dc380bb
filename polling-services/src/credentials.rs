//! Persisted OAuth credential and the authenticated flag derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::error::CredentialError;

/// OAuth token bundle in the layout written by the authorization flow
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Access token expiry, milliseconds since the Unix epoch
    #[serde(default)]
    pub expiry_date: Option<i64>,
}

impl Credential {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry_date.and_then(DateTime::from_timestamp_millis)
    }

    /// Whether the access token alone is past its expiry.
    /// A refresh token can still mint new access tokens.
    pub fn access_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at())
            .finish()
    }
}

/// Holds the provider credential for the lifetime of the process.
///
/// The credential is read once from disk by [`CredentialStore::load`]. When the
/// provider rejects it the poller calls [`CredentialStore::invalidate`] and every
/// later poll short-circuits until the process is restarted with a fresh token.
pub struct CredentialStore {
    path: PathBuf,
    credential: RwLock<Option<Credential>>,
    authenticated: AtomicBool,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            credential: RwLock::new(None),
            authenticated: AtomicBool::new(false),
        }
    }

    /// A store that already holds `credential`, without touching disk
    pub fn with_credential(path: impl Into<PathBuf>, credential: Credential) -> Self {
        let store = Self::new(path);
        store.set(Some(credential));
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted credential.
    ///
    /// A missing file is the normal unauthenticated state and returns `Ok(false)`.
    pub fn load(&self) -> Result<bool, CredentialError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No credential file");
                self.set(None);
                return Ok(false);
            }
            Err(source) => {
                self.set(None);
                return Err(CredentialError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let credential: Credential = serde_json::from_str(&contents).map_err(|source| {
            self.set(None);
            CredentialError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;

        if credential.access_token_expired(Utc::now()) && credential.refresh_token.is_none() {
            tracing::warn!(
                path = %self.path.display(),
                "Access token has expired and there is no refresh token"
            );
        }

        self.set(Some(credential));
        Ok(true)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// The held credential, if the store is still authenticated
    pub fn credential(&self) -> Option<Credential> {
        if !self.is_authenticated() {
            return None;
        }
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mark the credential as unusable. No re-authorization is attempted.
    pub fn invalidate(&self) {
        if self.authenticated.swap(false, Ordering::SeqCst) {
            tracing::warn!(
                path = %self.path.display(),
                "Credential invalidated; re-run the authorization flow"
            );
        }
    }

    fn set(&self, credential: Option<Credential>) {
        let authenticated = credential.is_some();
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = credential;
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }
}
