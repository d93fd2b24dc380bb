//! Error types for polling, fetching and notification.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a [`MailProvider`](crate::provider::MailProvider)
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider rejected the credential; retrying is futile until it is replaced
    #[error("credential rejected by provider: {0}")]
    AuthExpired(String),

    /// Network or provider error; the next poll may succeed
    #[error("fetch failed: {0}")]
    Transient(String),
}

/// Failure of a single outbound notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("http error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

// The request URL carries the bot token, keep it out of messages and logs
impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Http(err.without_url())
    }
}

/// Failure while reading the persisted credential
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed credential in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by [`Poller`](crate::poller::Poller) operations
#[derive(Debug, Error)]
pub enum PollError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("credential expired or revoked: {0}")]
    AuthExpired(String),

    #[error("failed to fetch unread messages: {0}")]
    Fetch(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl PollError {
    /// True for errors that mean the caller has to re-authorize
    pub fn is_auth(&self) -> bool {
        matches!(self, PollError::Unauthenticated | PollError::AuthExpired(_))
    }
}
