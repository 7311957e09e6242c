//! Process-scoped service context shared by handlers and middleware.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::metrics::MetricsRegistry;

/// Immutable facts about the running service plus its metrics.
pub struct ServiceContext {
    pub service: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub metrics: MetricsRegistry,
}

impl ServiceContext {
    /// Build the context and register the default metric collectors.
    pub fn init(service: &str, version: &str) -> prometheus::Result<Arc<Self>> {
        let metrics = MetricsRegistry::new(service)?;
        metrics.register_default_collectors(version)?;

        Ok(Arc::new(Self {
            service: service.to_string(),
            version: version.to_string(),
            started_at: Utc::now(),
            metrics,
        }))
    }
}
