//! Gmail API client for listing unread messages.

use async_trait::async_trait;
use futures::future::try_join_all;
use google_gmail1::api::Message;
use google_gmail1::hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use google_gmail1::yup_oauth2::{self, authorized_user::AuthorizedUserSecret};
use google_gmail1::Gmail;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use shared::models::{NO_SUBJECT, UNKNOWN_SENDER};
use shared::MessageSummary;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::PollingConfig;
use crate::credentials::Credential;
use crate::error::FetchError;
use crate::provider::MailProvider;

type Hub = Gmail<HttpsConnector<HttpConnector>>;

const UNREAD_QUERY: &str = "is:unread";
const METADATA_HEADERS: [&str; 3] = ["From", "Subject", "Date"];

/// Hub built for one credential, reused until the credential changes
struct CachedHub {
    credential: Credential,
    hub: Arc<Hub>,
}

pub struct GmailProvider {
    client_id: Option<String>,
    client_secret: Option<String>,
    max_results: u32,
    hub: Mutex<Option<CachedHub>>,
}

impl GmailProvider {
    pub fn new(config: &PollingConfig) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            max_results: config.max_results,
            hub: Mutex::new(None),
        }
    }

    async fn hub(&self, credential: &Credential) -> Result<Arc<Hub>, FetchError> {
        let mut cached = self.hub.lock().await;
        if let Some(entry) = cached.as_ref() {
            if &entry.credential == credential {
                return Ok(Arc::clone(&entry.hub));
            }
        }

        let hub = Arc::new(self.build_hub(credential).await?);
        *cached = Some(CachedHub {
            credential: credential.clone(),
            hub: Arc::clone(&hub),
        });
        Ok(hub)
    }

    async fn build_hub(&self, credential: &Credential) -> Result<Hub, FetchError> {
        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| FetchError::Transient(format!("failed to load native TLS roots: {}", e)))?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        match (&credential.refresh_token, &self.client_id, &self.client_secret) {
            (Some(refresh_token), Some(client_id), Some(client_secret)) => {
                // Use the yup_oauth2 re-exported by google_gmail1 to avoid version mismatch
                let secret = AuthorizedUserSecret {
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    refresh_token: refresh_token.clone(),
                    key_type: "authorized_user".to_string(),
                };
                let auth = yup_oauth2::AuthorizedUserAuthenticator::builder(secret)
                    .build()
                    .await
                    .map_err(|e| {
                        FetchError::Transient(format!("failed to build authenticator: {}", e))
                    })?;
                Ok(Gmail::new(client, auth))
            }
            _ => {
                tracing::debug!(
                    "No refresh token or client credentials; using the stored access token as-is"
                );
                Ok(Gmail::new(client, credential.access_token.clone()))
            }
        }
    }

    async fn get_summary(hub: &Hub, message_id: &str) -> Result<MessageSummary, FetchError> {
        let mut call = hub.users().messages_get("me", message_id).format("metadata");
        for header in METADATA_HEADERS {
            call = call.add_metadata_headers(header);
        }
        let (_, message) = call.doit().await.map_err(classify_error)?;

        Ok(summarize(message_id, message))
    }
}

#[async_trait]
impl MailProvider for GmailProvider {
    async fn fetch_unread(
        &self,
        credential: &Credential,
    ) -> Result<Vec<MessageSummary>, FetchError> {
        let hub = self.hub(credential).await?;

        let (_, list_response) = hub
            .users()
            .messages_list("me")
            .q(UNREAD_QUERY)
            .max_results(self.max_results)
            .doit()
            .await
            .map_err(classify_error)?;

        let ids: Vec<String> = list_response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg| msg.id)
            .collect();

        tracing::trace!("Listed {} unread message ids", ids.len());

        try_join_all(ids.iter().map(|id| Self::get_summary(&hub, id))).await
    }
}

/// Build a summary from a metadata-format message, falling back to placeholder
/// sender and subject when the headers are missing
fn summarize(message_id: &str, message: Message) -> MessageSummary {
    let mut from = None;
    let mut subject = None;
    let mut date = None;

    if let Some(headers) = message.payload.as_ref().and_then(|p| p.headers.as_ref()) {
        for header in headers {
            match header.name.as_deref() {
                Some("From") => from = header.value.clone(),
                Some("Subject") => subject = header.value.clone(),
                Some("Date") => date = header.value.clone(),
                _ => {}
            }
        }
    }

    MessageSummary {
        id: message.id.unwrap_or_else(|| message_id.to_string()),
        from: from.unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
        subject: subject.unwrap_or_else(|| NO_SUBJECT.to_string()),
        snippet: message.snippet.unwrap_or_default(),
        date: date.unwrap_or_default(),
        thread_id: message.thread_id.unwrap_or_default(),
    }
}

/// Map an API error onto the poller's retry policy.
///
/// A 401 from the API or a rejected token refresh means the credential is dead;
/// everything else is worth retrying on the next tick.
fn classify_error(err: google_gmail1::Error) -> FetchError {
    let auth_failure = match &err {
        google_gmail1::Error::BadRequest(body) => {
            body.pointer("/error/code").and_then(|c| c.as_u64()) == Some(401)
        }
        google_gmail1::Error::Failure(response) => response.status().as_u16() == 401,
        google_gmail1::Error::MissingToken(source) => matches!(
            source.downcast_ref::<yup_oauth2::Error>(),
            Some(yup_oauth2::Error::AuthError(_))
        ),
        _ => false,
    };

    if auth_failure {
        FetchError::AuthExpired(err.to_string())
    } else {
        FetchError::Transient(err.to_string())
    }
}
