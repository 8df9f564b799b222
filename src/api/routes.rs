use std::time::Duration;

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Browsers cache the preflight answer for a day
const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Creates the relay router
///
/// Routes only accept the methods they declare; anything else is a 405.
/// CORS preflights are answered by `CorsLayer` with `200 OK` and an empty
/// body; browsers treat that the same as `204 No Content`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(CORS_MAX_AGE);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/recommend", post(handlers::recommend))
        .route("/recommendations/group", post(handlers::recommend_group))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(cors),
        )
        .with_state(state)
}
