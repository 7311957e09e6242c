//! Route configuration.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::{middleware::instrument, ops::ops_router};

use crate::handlers::order_routes;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check and metrics
        .merge(ops_router::<AppState>())
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/orders", order_routes());

    instrument(router, state.ctx.clone()).with_state(state)
}
