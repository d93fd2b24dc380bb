use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use poller::{PollOutcome, PollTrigger};
use shared::api::{ActionResponse, SetIntervalRequest};

use crate::error::{ApiResult, AppError};
use crate::state::AppState;

/// Poll now. Queues behind a poll that is already running.
pub async fn check_now(State(state): State<AppState>) -> ApiResult<Json<ActionResponse>> {
    let message = match state.poller.poll_once(PollTrigger::OnDemand).await? {
        PollOutcome::Completed(report) if report.baseline => format!(
            "Checked for new emails: {} unread recorded as baseline",
            report.fetched
        ),
        PollOutcome::Completed(report) => format!(
            "Checked for new emails: {} new",
            report.dispatches.len()
        ),
        PollOutcome::Skipped => "A check is already in progress".to_string(),
    };

    Ok(Json(ActionResponse::ok(message)))
}

pub async fn set_interval(
    State(state): State<AppState>,
    payload: Result<Json<SetIntervalRequest>, JsonRejection>,
) -> ApiResult<Json<ActionResponse>> {
    let Json(payload) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let seconds = payload
        .as_seconds()
        .ok_or_else(|| AppError::Validation("Invalid interval".to_string()))?;

    let interval = state.poller.set_interval(seconds)?;

    Ok(Json(ActionResponse::ok(format!(
        "Interval set to {} sec(s)",
        interval.as_secs_f64()
    ))))
}
