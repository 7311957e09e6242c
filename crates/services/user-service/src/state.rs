//! Application state for dependency injection.

use std::sync::Arc;

use axum::extract::FromRef;
use common::ServiceContext;

use crate::repository::UserRepository;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<ServiceContext>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// Create new app state.
    pub fn new(ctx: Arc<ServiceContext>, users: Arc<dyn UserRepository>) -> Self {
        Self { ctx, users }
    }
}

impl FromRef<AppState> for Arc<ServiceContext> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.ctx)
    }
}
