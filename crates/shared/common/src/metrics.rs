//! Prometheus metrics registry.
//!
//! ## Metrics Exposed
//!
//! - `http_requests_total{method, route, status}` - counter of completed requests
//! - `http_request_duration_seconds{method, route, status}` - request latency histogram
//! - `process_*` - process collector gauges (Linux only)
//! - `process_uptime_seconds` - seconds since the registry was created
//! - `service_info{version}` - constant 1
//!
//! Every sample carries a constant `service` label.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

const REQUEST_LABELS: &[&str] = &["method", "route", "status"];

/// Encoded metrics ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scrape {
    pub content_type: String,
    pub body: String,
}

/// Per-service Prometheus registry.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    uptime: Gauge,
    started: Instant,
}

impl MetricsRegistry {
    /// Create a registry labelled with `service` and register request metrics.
    pub fn new(service: &str) -> prometheus::Result<Self> {
        let labels = HashMap::from([("service".to_string(), service.to_string())]);
        let registry = Registry::new_custom(None, Some(labels))?;

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests completed"),
            REQUEST_LABELS,
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            REQUEST_LABELS,
        )?;
        let uptime = Gauge::with_opts(Opts::new(
            "process_uptime_seconds",
            "Seconds since the service started",
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            uptime,
            started: Instant::now(),
        })
    }

    /// Register the process gauges and `service_info`.
    ///
    /// Calling this twice returns `AlreadyReg`.
    pub fn register_default_collectors(&self, version: &str) -> prometheus::Result<()> {
        #[cfg(target_os = "linux")]
        self.registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        self.registry.register(Box::new(self.uptime.clone()))?;

        let info = IntGaugeVec::new(
            Opts::new("service_info", "Service build information"),
            &["version"],
        )?;
        info.with_label_values(&[version]).set(1);
        self.registry.register(Box::new(info))?;

        Ok(())
    }

    /// Record one completed request.
    pub fn observe_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        let labels = [method, route, status.as_str()];
        self.requests_total.with_label_values(&labels).inc();
        self.request_duration
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
    }

    /// Encode every registered family in the text exposition format.
    pub fn scrape(&self) -> prometheus::Result<Scrape> {
        self.uptime.set(self.started.elapsed().as_secs_f64());

        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        let body = String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics output was not valid UTF-8: {}", e)))?;

        Ok(Scrape {
            content_type: encoder.format_type().to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_content_type() {
        let metrics = MetricsRegistry::new("user-service").unwrap();
        let scrape = metrics.scrape().unwrap();
        assert_eq!(scrape.content_type, "text/plain; version=0.0.4");
    }

    /// Value of the sample `name` carrying every label in `labels`.
    fn sample(body: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        body.lines()
            .filter(|line| !line.starts_with('#'))
            .find_map(|line| {
                let (series, value) = line.rsplit_once(' ')?;
                let (metric, rest) = series.split_once('{')?;
                if metric != name {
                    return None;
                }
                let pairs: Vec<&str> = rest.trim_end_matches('}').split(',').collect();
                let matches = labels
                    .iter()
                    .all(|(key, val)| pairs.contains(&format!("{}=\"{}\"", key, val).as_str()));
                if matches {
                    value.parse().ok()
                } else {
                    None
                }
            })
    }

    #[test]
    fn test_default_collectors_present_without_traffic() {
        let metrics = MetricsRegistry::new("user-service").unwrap();
        metrics.register_default_collectors("1.2.3").unwrap();

        let body = metrics.scrape().unwrap().body;
        assert!(sample(&body, "process_uptime_seconds", &[("service", "user-service")]).is_some());
        assert_eq!(
            sample(
                &body,
                "service_info",
                &[("service", "user-service"), ("version", "1.2.3")]
            ),
            Some(1.0)
        );
        #[cfg(target_os = "linux")]
        assert!(body.contains("process_resident_memory_bytes"));
    }

    #[test]
    fn test_registering_defaults_twice_fails() {
        let metrics = MetricsRegistry::new("order-service").unwrap();
        metrics.register_default_collectors("0.1.0").unwrap();
        assert!(metrics.register_default_collectors("0.1.0").is_err());
    }

    #[test]
    fn test_observe_request() {
        let metrics = MetricsRegistry::new("order-service").unwrap();
        metrics.observe_request("GET", "/orders/:id", 404, Duration::from_millis(3));
        metrics.observe_request("GET", "/orders/:id", 404, Duration::from_millis(5));

        let body = metrics.scrape().unwrap().body;
        let labels = [
            ("method", "GET"),
            ("route", "/orders/:id"),
            ("status", "404"),
            ("service", "order-service"),
        ];
        assert_eq!(sample(&body, "http_requests_total", &labels), Some(2.0));
        assert_eq!(
            sample(&body, "http_request_duration_seconds_count", &labels),
            Some(2.0)
        );
        assert_eq!(
            sample(&body, "http_requests_total", &[("status", "200")]),
            None
        );
    }
}
