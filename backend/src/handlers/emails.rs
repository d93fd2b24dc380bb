use axum::{extract::State, Json};
use shared::api::EmailsResponse;

use crate::error::ApiResult;
use crate::state::AppState;

/// Current unread messages, straight from the provider; the seen set is untouched
pub async fn list_emails(State(state): State<AppState>) -> ApiResult<Json<EmailsResponse>> {
    let emails = state.poller.fetch_current().await?;
    Ok(Json(emails.into()))
}
