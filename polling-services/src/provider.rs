use async_trait::async_trait;
use shared::MessageSummary;

use crate::credentials::Credential;
use crate::error::FetchError;

/// Source of the inbox's current unread messages
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Fetch summaries of every currently-unread message the provider reports.
    ///
    /// Either the full list is returned or an error; a partial list would make
    /// the missing messages look as if they had been read.
    async fn fetch_unread(&self, credential: &Credential)
        -> Result<Vec<MessageSummary>, FetchError>;
}
