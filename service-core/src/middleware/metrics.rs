use crate::observability::MetricsRegistry;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Label used for requests that did not match a route (static files, 404s).
pub const UNMATCHED_PATH: &str = "unmatched";

pub async fn metrics_middleware(
    State(metrics): State<MetricsRegistry>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    // Route templates only, so static file paths cannot blow up label cardinality.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());

    let response = next.run(req).await;

    metrics.observe_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}
