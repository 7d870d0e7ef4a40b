//! HTTP middleware

pub mod auth;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use tenantgrid_common::metrics::RequestMetrics;

/// Record request count and latency per method, route template and status.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().to_string();

    let recorder = RequestMetrics::start(&method, &endpoint);
    let response = next.run(request).await;
    recorder.finish(response.status().as_u16());

    response
}
