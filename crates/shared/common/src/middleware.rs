//! Request instrumentation and panic handling.
//!
//! [`instrument`] wraps a router so that every request, matched or not,
//! produces exactly one `request completed` record and one metrics sample.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info};

use crate::context::ServiceContext;
use crate::error::{translate, AppError};

/// Route label for requests no route matched
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Status recorded when the client goes away before a response exists
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Method label for anything outside the standard verbs
pub const OTHER_METHOD: &str = "other";

type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Wrap `router` with the panic guard and, outermost, request tracking.
pub fn instrument<S>(router: Router<S>, ctx: Arc<ServiceContext>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(catch_panic_layer())
        .layer(middleware::from_fn_with_state(ctx, track_requests))
}

/// Panic guard converting a handler panic into a 500 JSON response.
pub fn catch_panic_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    error!(error = message.as_str(), "handler panicked");
    translate(&AppError::internal(message), "Request").into_response()
}

/// Metrics label for `method`; nonstandard methods collapse into one series.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::PATCH => "PATCH",
        Method::DELETE => "DELETE",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => OTHER_METHOD,
    }
}

/// Middleware timing each request.
pub async fn track_requests(
    State(ctx): State<Arc<ServiceContext>>,
    request: Request,
    next: Next,
) -> Response {
    let timer = RequestTimer::start(ctx, &request);
    let response = next.run(request).await;
    timer.finish(response.status());
    response
}

/// Emits the completion record exactly once: on `finish`, or from `Drop`
/// with status 499 if the request future is abandoned.
struct RequestTimer {
    ctx: Arc<ServiceContext>,
    method: String,
    method_label: &'static str,
    path: String,
    route: String,
    start: Instant,
    finished: bool,
}

impl RequestTimer {
    fn start(ctx: Arc<ServiceContext>, request: &Request) -> Self {
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(|path| path.as_str().to_string())
            .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

        Self {
            ctx,
            method: request.method().to_string(),
            method_label: method_label(request.method()),
            path: request.uri().path().to_string(),
            route,
            start: Instant::now(),
            finished: false,
        }
    }

    fn finish(mut self, status: StatusCode) {
        self.record(status.as_u16());
        self.finished = true;
    }

    fn record(&self, status: u16) {
        let elapsed = self.start.elapsed();
        let duration_ms = elapsed.as_secs_f64() * 1000.0;

        info!(
            method = self.method.as_str(),
            path = self.path.as_str(),
            status,
            duration_ms,
            "request completed"
        );
        self.ctx
            .metrics
            .observe_request(self.method_label, &self.route, status, elapsed);
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        if !self.finished {
            self.record(CLIENT_CLOSED_REQUEST);
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, routing::get};
    use tower::ServiceExt;

    use super::*;
    use crate::testing::LogCapture;

    async fn explode() -> &'static str {
        panic!("kaboom")
    }

    fn app(ctx: Arc<ServiceContext>) -> Router {
        let router = Router::new()
            .route("/items/:id", get(|| async { "ok" }))
            .route("/boom", get(explode));
        instrument(router, ctx)
    }

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_one_completion_record_per_request() {
        let capture = LogCapture::new();
        let _guard = capture.install("test-service");
        let ctx = ServiceContext::init("test-service", "0.1.0").unwrap();

        let response = app(ctx.clone()).oneshot(get_request("/items/5")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let records = capture.with_message("request completed");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level, "info");
        assert_eq!(record.metadata["method"], "GET");
        assert_eq!(record.metadata["path"], "/items/5");
        assert_eq!(record.metadata["status"], 200);
        assert!(record.field("duration_ms").unwrap().as_f64().unwrap() >= 0.0);

        let body = ctx.metrics.scrape().unwrap().body;
        assert!(body.contains("route=\"/items/:id\""));
    }

    #[tokio::test]
    async fn test_unmatched_route_is_instrumented() {
        let capture = LogCapture::new();
        let _guard = capture.install("test-service");
        let ctx = ServiceContext::init("test-service", "0.1.0").unwrap();

        let response = app(ctx.clone()).oneshot(get_request("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let records = capture.with_message("request completed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metadata["status"], 404);

        let body = ctx.metrics.scrape().unwrap().body;
        assert!(body.contains("route=\"unmatched\""));
    }

    #[tokio::test]
    async fn test_panic_becomes_500_and_is_still_recorded() {
        let capture = LogCapture::new();
        let _guard = capture.install("test-service");
        let ctx = ServiceContext::init("test-service", "0.1.0").unwrap();

        let response = app(ctx).oneshot(get_request("/boom")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "kaboom");

        let panics = capture.with_message("handler panicked");
        assert_eq!(panics.len(), 1);
        assert_eq!(panics[0].level, "error");

        let completed = capture.with_message("request completed");
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].metadata["status"], 500);
    }

    #[tokio::test]
    async fn test_nonstandard_methods_share_one_series() {
        let ctx = ServiceContext::init("test-service", "0.1.0").unwrap();
        let router = app(ctx.clone());

        for i in 0..20 {
            let request = Request::builder()
                .method(format!("JUNK{}", i).as_str())
                .uri("/items/1")
                .body(Body::empty())
                .unwrap();
            router.clone().oneshot(request).await.unwrap();
        }
        router.oneshot(get_request("/items/1")).await.unwrap();

        let body = ctx.metrics.scrape().unwrap().body;
        let series: Vec<&str> = body
            .lines()
            .filter(|line| line.starts_with("http_requests_total{"))
            .collect();
        assert_eq!(series.len(), 2);
        assert!(series.iter().any(|line| line.contains("method=\"other\"") && line.ends_with(" 20")));
        assert!(series.iter().any(|line| line.contains("method=\"GET\"")));
        assert!(!body.contains("JUNK"));
    }

    #[test]
    fn test_method_label() {
        assert_eq!(method_label(&Method::DELETE), "DELETE");
        assert_eq!(method_label(&Method::TRACE), OTHER_METHOD);
        assert_eq!(method_label(&Method::from_bytes(b"PURGE").unwrap()), OTHER_METHOD);
    }

    #[tokio::test]
    async fn test_abandoned_request_records_499() {
        let capture = LogCapture::new();
        let _guard = capture.install("test-service");
        let ctx = ServiceContext::init("test-service", "0.1.0").unwrap();

        let timer = RequestTimer::start(ctx, &get_request("/items/1"));
        drop(timer);

        let records = capture.with_message("request completed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metadata["status"], 499);
    }
}
