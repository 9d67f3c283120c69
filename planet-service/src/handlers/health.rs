use crate::dtos::ProbeResponse;
use axum::Json;

pub async fn liveness() -> Json<ProbeResponse> {
    Json(ProbeResponse::live())
}

// No database round trip: readiness answers exactly like liveness.
pub async fn readiness() -> Json<ProbeResponse> {
    Json(ProbeResponse::ready())
}
