use axum::{extract::State, Json};
use shared::api::StatusResponse;

use crate::state::AppState;

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.poller.status();

    Json(StatusResponse {
        authenticated: state.credentials.is_authenticated(),
        monitoring: status.monitoring,
        interval_seconds: status.interval.as_secs_f64(),
        seen_count: status.seen_count,
        last_poll: status.last_poll,
    })
}
