use serde::{Deserialize, Serialize};

/// Sender shown when a message has no `From` header
pub const UNKNOWN_SENDER: &str = "Unknown";
/// Subject shown when a message has no `Subject` header
pub const NO_SUBJECT: &str = "(No subject)";

/// An unread message as reported by the mail provider.
///
/// Identity is `id`; every other field is descriptive payload used when
/// building a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    pub date: String,
    pub thread_id: String,
}

impl MessageSummary {
    /// Display name of the sender, e.g. `Jane Doe` for `"Jane Doe" <jane@example.com>`.
    /// Falls back to the raw header when there is no name part.
    pub fn sender_name(&self) -> &str {
        let from = self.from.trim();
        match from.rfind('<') {
            Some(bracket) => {
                let name = from[..bracket].trim().trim_matches('"').trim();
                if name.is_empty() {
                    from
                } else {
                    name
                }
            }
            None => from,
        }
    }

    /// Text pushed to the notification channel for this message
    pub fn notification_text(&self) -> String {
        format!("{}\n{}", self.from, self.subject)
    }
}
