//! Operational endpoints: `/health` and `/metrics`.

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{SecondsFormat, Utc};

use crate::context::ServiceContext;
use crate::error::AppError;
use crate::response::HealthResponse;

/// Create ops routes for any state that can hand out the service context.
pub fn ops_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Arc<ServiceContext>: FromRef<S>,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
}

/// Liveness check; never touches the database.
pub async fn health_check(State(ctx): State<Arc<ServiceContext>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: ctx.service.clone(),
        version: ctx.version.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Prometheus text exposition.
pub async fn metrics(State(ctx): State<Arc<ServiceContext>>) -> Response {
    match ctx.metrics.scrape() {
        Ok(scrape) => ([(header::CONTENT_TYPE, scrape.content_type)], scrape.body).into_response(),
        Err(err) => AppError::internal(err.to_string()).reply("Metrics", "scrape", None),
    }
}
