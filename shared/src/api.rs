use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::MessageSummary;

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    pub monitoring: bool,
    pub interval_seconds: f64,
    pub seen_count: usize,
    pub last_poll: Option<LastPoll>,
}

/// Outcome of the most recent poll execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastPoll {
    pub at: DateTime<Utc>,
    pub outcome: PollOutcomeKind,
    pub fetched: usize,
    pub new_messages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcomeKind {
    Completed,
    Baseline,
    FetchFailed,
    Unauthenticated,
    AuthExpired,
}

// ============================================================================
// Emails
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct EmailsResponse {
    pub emails: Vec<MessageSummary>,
    pub count: usize,
}

impl From<Vec<MessageSummary>> for EmailsResponse {
    fn from(emails: Vec<MessageSummary>) -> Self {
        let count = emails.len();
        Self { emails, count }
    }
}

// ============================================================================
// Control operations
// ============================================================================

/// Body of `POST /set-interval`. Either field may be given; `seconds` wins.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SetIntervalRequest {
    pub seconds: Option<f64>,
    pub minutes: Option<f64>,
}

impl SetIntervalRequest {
    /// Requested interval in seconds, if any field was provided
    pub fn as_seconds(&self) -> Option<f64> {
        self.seconds.or(self.minutes.map(|m| m * 60.0))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn bare() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_prefers_seconds() {
        let req = SetIntervalRequest {
            seconds: Some(30.0),
            minutes: Some(2.0),
        };
        assert_eq!(req.as_seconds(), Some(30.0));
    }

    #[test]
    fn test_interval_converts_minutes() {
        let req: SetIntervalRequest =
            serde_json::from_str(r#"{"minutes": 2}"#).expect("should parse");
        assert_eq!(req.as_seconds(), Some(120.0));
    }

    #[test]
    fn test_interval_missing() {
        let req: SetIntervalRequest = serde_json::from_str("{}").expect("should parse");
        assert_eq!(req.as_seconds(), None);
    }

    #[test]
    fn test_bare_action_response_omits_message() {
        let json = serde_json::to_string(&ActionResponse::bare()).expect("should serialize");
        assert_eq!(json, r#"{"success":true}"#);
    }
}
