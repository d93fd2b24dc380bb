//! New-mail detection for a Gmail inbox.
//!
//! The [`Poller`] periodically asks a [`MailProvider`] for the unread set,
//! compares it with the set seen on the previous successful poll and hands every
//! new message to a [`NotificationSink`].

pub mod config;
pub mod credentials;
pub mod error;
pub mod gmail;
pub mod notify;
pub mod poller;
pub mod provider;
mod scheduler;
pub mod tracker;

pub use config::PollingConfig;
pub use credentials::{Credential, CredentialStore};
pub use error::{CredentialError, FetchError, NotifyError, PollError};
pub use gmail::GmailProvider;
pub use notify::{LogNotifier, NotificationSink, TelegramNotifier};
pub use poller::{
    PollInterval, PollOutcome, PollReport, PollTrigger, Poller, PollerOptions, PollerState,
    PollerStatus, MAX_POLL_INTERVAL,
};
pub use provider::MailProvider;
pub use tracker::SeenSetTracker;
