//! HTTP-level middleware around the gateway.
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Access logging / request tracing (TraceLayer)
//! - Body size limit (the dispatcher reads the whole body as JSON)
//! - Global timeout
//!
//! Limits come from [`HttpSettings`] (`HTTP_BODY_LIMIT_BYTES`,
//! `HTTP_REQUEST_TIMEOUT_SECS`).

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header::HeaderName};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::HttpSettings;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

async fn handle_layer_error(err: BoxError) -> StatusCode {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("request timed out");
        StatusCode::REQUEST_TIMEOUT
    } else {
        warn!(error = %err, "middleware error");
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Wrap the gateway router with request-id, limit, timeout and trace layers.
pub fn apply(router: Router, settings: &HttpSettings) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_layer_error))
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(RequestBodyLimitLayer::new(settings.body_limit_bytes))
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(TraceLayer::new_for_http());

    router.layer(layers)
}
