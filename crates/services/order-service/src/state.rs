//! Application state for dependency injection.

use std::sync::Arc;

use axum::extract::FromRef;
use common::ServiceContext;

use crate::repository::OrderRepository;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<ServiceContext>,
    pub orders: Arc<dyn OrderRepository>,
}

impl AppState {
    /// Create new app state.
    pub fn new(ctx: Arc<ServiceContext>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { ctx, orders }
    }
}

impl FromRef<AppState> for Arc<ServiceContext> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.ctx)
    }
}
