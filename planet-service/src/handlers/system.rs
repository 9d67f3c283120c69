use crate::dtos::HostInfoResponse;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

/// `GET /os`: hostname of the machine and the configured environment name.
pub async fn host_info(State(state): State<AppState>) -> Result<Json<HostInfoResponse>, AppError> {
    let os = hostname::get()?.to_string_lossy().into_owned();

    Ok(Json(HostInfoResponse {
        os,
        env: state.environment.clone(),
    }))
}
