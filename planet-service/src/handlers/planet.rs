use crate::dtos::PlanetLookupRequest;
use crate::services::LogEntry;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use service_core::error::AppError;
use service_core::middleware::tracing::RequestId;

pub const LOOKUP_FAILED_BODY: &str = "Error in Planet Data";

/// `POST /planet`: the matching record, or an empty 200 when none matches.
///
/// Store failures answer 500 with a plain-text body.
pub async fn find_planet(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<PlanetLookupRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return AppError::BadRequest(anyhow::anyhow!(rejection.body_text())).into_response();
        }
    };
    let request_id = request_id.map(|Extension(id)| id.0).unwrap_or_default();

    match state.store.find_planet_by_id(request.id).await {
        Ok(planet) => {
            tracing::info!(
                planet_id = request.id,
                found = planet.is_some(),
                request_id = %request_id,
                "Planet data retrieved"
            );
            state
                .collector
                .send(LogEntry::info("Planet data retrieved").field("planetId", request.id));

            match planet {
                Some(planet) => Json(planet).into_response(),
                None => StatusCode::OK.into_response(),
            }
        }
        Err(e) => {
            tracing::error!(
                planet_id = request.id,
                request_id = %request_id,
                error = %e,
                "Planet lookup failed"
            );
            state
                .collector
                .send(LogEntry::error("Planet lookup failed").field("error", e.to_string()));

            (StatusCode::INTERNAL_SERVER_ERROR, LOOKUP_FAILED_BODY).into_response()
        }
    }
}
