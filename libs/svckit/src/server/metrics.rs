//! Prometheus scrape endpoint backed by an isolated registry.
//!
//! The endpoint registers one collector of its own in the registry it
//! serves: `metrics_handler_requests_total{code}`, counting completed scrapes.
//! Counters for both codes start at zero, so even a registry without any
//! application metrics produces a valid exposition with `# HELP` and `# TYPE`
//! lines.

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub const METRICS_PATH: &str = "/metrics";

const REQUESTS_METRIC: &str = "metrics_handler_requests_total";

#[derive(Clone)]
struct MetricsState {
    registry: Registry,
    requests: IntCounterVec,
}

/// Build a router serving `registry` at [`METRICS_PATH`].
///
/// # Errors
/// Returns an error if the endpoint's own counter cannot be registered, which
/// happens when a router was already built for the same registry.
pub fn metrics_router(registry: Registry) -> Result<Router, prometheus::Error> {
    let requests = IntCounterVec::new(
        Opts::new(
            REQUESTS_METRIC,
            "Total number of scrapes by HTTP status code.",
        ),
        &["code"],
    )?;
    registry.register(Box::new(requests.clone()))?;

    for code in ["200", "500"] {
        requests.with_label_values(&[code]);
    }

    Ok(Router::new()
        .route(METRICS_PATH, get(metrics_handler))
        .with_state(MetricsState { registry, requests }))
}

async fn metrics_handler(State(state): State<MetricsState>) -> Response {
    let encoder = TextEncoder::new();
    let families = state.registry.gather();
    let mut buffer = Vec::new();

    match encoder.encode(&families, &mut buffer) {
        Ok(()) => {
            state.requests.with_label_values(&["200"]).inc();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
                buffer,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            state.requests.with_label_values(&["500"]).inc();
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use prometheus::IntCounter;
    use tower::ServiceExt;

    async fn scrape(router: Router) -> (StatusCode, String, String) {
        let request = Request::builder()
            .method("GET")
            .uri(METRICS_PATH)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn fresh_registry_exposes_preamble() {
        let router = metrics_router(Registry::new()).unwrap();

        let (status, content_type, body) = scrape(router).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, prometheus::TEXT_FORMAT);
        assert!(body.contains("# HELP metrics_handler_requests_total"));
        assert!(body.contains("# TYPE metrics_handler_requests_total counter"));
        assert!(body.contains(r#"metrics_handler_requests_total{code="200"} 0"#));
    }

    #[tokio::test]
    async fn scrapes_are_counted() {
        let router = metrics_router(Registry::new()).unwrap();

        scrape(router.clone()).await;
        let (_, _, body) = scrape(router).await;
        assert!(body.contains(r#"metrics_handler_requests_total{code="200"} 1"#));
    }

    #[tokio::test]
    async fn exposes_application_metrics() {
        let registry = Registry::new();
        let router = metrics_router(registry.clone()).unwrap();

        let orders = IntCounter::new("orders_created_total", "Orders created").unwrap();
        registry.register(Box::new(orders.clone())).unwrap();
        orders.inc_by(3);

        let (_, _, body) = scrape(router).await;
        assert!(body.contains("orders_created_total 3"));
    }

    #[test]
    fn second_router_on_same_registry_is_rejected() {
        let registry = Registry::new();
        assert!(metrics_router(registry.clone()).is_ok());
        assert!(matches!(
            metrics_router(registry),
            Err(prometheus::Error::AlreadyReg)
        ));
    }

    #[test]
    fn does_not_touch_the_default_registry() {
        assert!(metrics_router(Registry::new()).is_ok());
        let exposed = TextEncoder::new()
            .encode_to_string(&prometheus::default_registry().gather())
            .unwrap();
        assert!(!exposed.contains(REQUESTS_METRIC));
    }
}
