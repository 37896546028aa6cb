use axum::http::StatusCode;

/// Liveness probe; unauthenticated and unaudited.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
