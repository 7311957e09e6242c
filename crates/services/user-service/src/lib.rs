//! User Service Library
//!
//! CRUD HTTP service for users with health, metrics and OpenAPI endpoints.

pub mod config;
pub mod handlers;
pub mod infra;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tracing::info;

use common::{server, ServiceConfig, ServiceContext};

use crate::infra::Database;
use crate::repository::UserStore;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the fully layered application router on top of a connection.
pub fn build_app(db: DatabaseConnection, ctx: Arc<ServiceContext>) -> Router {
    let users = Arc::new(UserStore::new(db));
    create_router(AppState::new(ctx, users))
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = ServiceContext::init(&config.service_name, &config.version)?;
    let db = Database::connect(&config.database).await?;
    let app = build_app(db.get_connection(), ctx);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        version = config.version.as_str(),
        address = %addr,
        "User service starting"
    );

    let served = server::serve(app, addr).await;

    db.close().await?;
    info!("Database connection closed");

    served?;
    Ok(())
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(
    config: &ServiceConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    db.close().await?;
    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
