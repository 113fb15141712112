/*
 * Responsibility
 * - axum の request を RawRequest に詰め替えて Dispatcher に渡す
 * - Dispatched.response を HTTP response に戻す (status 未設定なら 200)
 * - DispatchError は AppError 経由で JSON error body に変換
 */
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::error::AppError;
use crate::routing::{self, RawRequest};
use crate::state::AppState;

/// `/health` is answered by axum; every other path goes through the
/// dispatcher.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(gateway)
        .with_state(state)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

pub async fn gateway(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let uri = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let request = RawRequest::new(method.as_str(), uri)
        .headers(headers)
        .json_bytes(&body);

    let dispatched = state.dispatcher.dispatch(request)?;

    Ok(into_http(dispatched.response))
}

fn into_http(response: routing::Response) -> Response {
    let (status, headers, body) = response.into_parts();

    let mut out = Response::new(Body::from(body));
    *out.status_mut() = status.unwrap_or(StatusCode::OK);
    *out.headers_mut() = headers;
    out
}
