//! Common utilities shared across all microservices.
//!
//! This crate provides:
//! - Error handling and translation to HTTP responses
//! - Configuration structures
//! - Structured logging and Prometheus metrics
//! - Request instrumentation middleware, ops routes and server lifecycle

pub mod config;
pub mod context;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod ops;
pub mod response;
pub mod server;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::*;
pub use context::ServiceContext;
pub use error::{translate, AppError, AppResult, OptionExt, Translation};
pub use extractors::{parse_id, BodyRejection, JsonBody};
pub use logging::{init_logging, LogGuard, LogRecord};
pub use metrics::{MetricsRegistry, Scrape};
pub use response::{ErrorResponse, HealthResponse, MessageResponse};
