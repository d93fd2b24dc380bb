use axum::{extract::State, Json};
use shared::api::ActionResponse;

use crate::state::AppState;

/// Push a test message through the notification channel.
/// Delivery problems are logged; the response is always a success.
pub async fn send_test(State(state): State<AppState>) -> Json<ActionResponse> {
    if let Err(e) = state.notifier.send_test().await {
        tracing::warn!("Test notification failed: {}", e);
    }
    Json(ActionResponse::bare())
}
