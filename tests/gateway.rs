use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use route_gate::app::{build_router, build_state};
use route_gate::config::{Config, HttpSettings};
use route_gate::routing::{AUTH_REASON_HEADER, REASON_HEADER};
use route_gate::state::AppState;
use route_gate::{
    AuthSettings, Dispatcher, HandlerRegistry, RequestContext, Response, RouterSettings,
    TokenAuthenticator,
};

const KEY: &str = "mBC5v1sOKVvbdEitdSBenu59nfNfhwkedkJVNabosTw";
const ISSUER: &str = "http://www.example.com";
const AUDIENCE: &str = "http://www.example.com";

fn auth_settings() -> AuthSettings {
    AuthSettings {
        hmac_key: KEY.to_string(),
        issuer: ISSUER.to_string(),
        audience: AUDIENCE.to_string(),
    }
}

fn demo_app(base_uri: &str) -> (Router, Arc<TokenAuthenticator>) {
    let base_uri = base_uri.to_string();
    let config = Config::from_lookup(move |key| match key {
        "HMAC_KEY" => Some(KEY.to_string()),
        "ISSUER" => Some(ISSUER.to_string()),
        "AUDIENCE" => Some(AUDIENCE.to_string()),
        "ROUTER_HANDLER_PREFIX" => Some("route_".to_string()),
        "ROUTER_DEFAULT_HANDLER" => Some("default".to_string()),
        "ROUTER_BASE_URI" => Some(base_uri.clone()),
        _ => None,
    })
    .unwrap();

    let state = build_state(&config).unwrap();
    let auth = Arc::clone(state.dispatcher.authenticator().unwrap());
    (build_router(state, &config.http), auth)
}

fn test_app(default: &str, authenticator: Option<Arc<TokenAuthenticator>>) -> Router {
    let handlers = HandlerRegistry::new()
        .with("route_test", |_: &RequestContext, res: &mut Response| {
            res.write("TEST")
        })
        .with("route_default", |_: &RequestContext, res: &mut Response| {
            res.write("DEFAULT")
        });

    let mut dispatcher = Dispatcher::new(
        RouterSettings::new("route_", default, "Authorization", "api"),
        handlers,
        authenticator,
    )
    .unwrap();
    assert!(dispatcher.register("/test", "GET", "test", false, false));
    assert!(dispatcher.register("/secret", "GET", "test", true, false));

    build_router(AppState::new(Arc::new(dispatcher)), &HttpSettings::default())
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec();
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn routes_through_base_uri() {
    let app = test_app("default", None);

    let (status, headers, body) = send(&app, get("/api/test?x=1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"TEST");
    assert!(headers.get(REASON_HEADER).is_none());
    assert!(headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn miss_runs_default_handler() {
    let app = test_app("default", None);

    let (status, _, body) = send(&app, get("/api/nothing")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"DEFAULT");
}

#[tokio::test]
async fn miss_without_default_is_404_error_body() {
    let app = test_app("", None);

    let (status, _, body) = send(&app, get("/api/nothing")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn protected_route_without_authenticator_is_500() {
    let app = test_app("default", None);

    let (status, headers, _) = send(
        &app,
        Request::builder()
            .uri("/api/secret")
            .header("Authorization", "anything")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(headers.get(REASON_HEADER).is_none());
}

#[tokio::test]
async fn protected_route_gates_on_token() {
    let auth = Arc::new(TokenAuthenticator::new(&auth_settings()));
    let app = test_app("default", Some(Arc::clone(&auth)));

    let (status, headers, body) = send(&app, get("/api/secret")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers[REASON_HEADER], "token not present");
    assert!(body.is_empty());

    let token = auth.issue_token(None).unwrap();
    let (status, headers, body) = send(
        &app,
        Request::builder()
            .uri("/api/secret")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[REASON_HEADER], "verified successfully");
    assert_eq!(body, b"TEST");
}

#[tokio::test]
async fn health_bypasses_dispatcher() {
    let app = test_app("", None);

    let (status, _, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn demo_server_end_to_end() {
    let (app, auth) = demo_app("api");

    let (status, headers, body) = send(&app, get("/api/auth")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/json");
    let body: Value = serde_json::from_slice(&body).unwrap();
    let user_token = body["token"].as_str().unwrap().to_string();
    assert!(auth.authenticate(&user_token, false));
    assert!(!auth.authenticate(&user_token, true));

    let post = |uri: &str, token: &str| {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Authorization", token)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"entity"}"#))
            .unwrap()
    };

    let (status, _, body) = send(&app, post("/api/entity", &user_token)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["user"], json!({"admin": false}));
    assert_eq!(body["received"], json!({"name": "entity"}));

    let (status, headers, _) = send(&app, post("/api/admin", &user_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers[REASON_HEADER], "failed verification");
    assert_eq!(headers[AUTH_REASON_HEADER], "needed admin - not admin");

    let admin_token = auth
        .issue_token(json!({"user": {"admin": true}}).as_object().cloned())
        .unwrap();
    let (status, _, body) = send(&app, post("/api/admin", &admin_token)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["admin"], true);

    let (status, _, body) = send(&app, get("/api/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8(body).unwrap().contains("does not exist"));
}

#[tokio::test]
async fn demo_server_root_page_is_raw_uri_match() {
    let (app, _) = demo_app("api");

    let (status, headers, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "text/html; charset=utf-8");
    assert!(String::from_utf8(body).unwrap().contains("<h1>Page</h1>"));
}

#[tokio::test]
async fn body_limit_comes_from_http_settings() {
    let handlers = HandlerRegistry::new().with("echo", |ctx: &RequestContext, res: &mut Response| {
        res.json(&json!({"received": ctx.body()}))
    });
    let mut dispatcher = Dispatcher::new(RouterSettings::default(), handlers, None).unwrap();
    assert!(dispatcher.register("/echo", "POST", "echo", false, false));

    let http = HttpSettings {
        body_limit_bytes: 16,
        ..HttpSettings::default()
    };
    let app = build_router(AppState::new(Arc::new(dispatcher)), &http);

    let small = json!({"a": 1}).to_string();
    let (status, _, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .header("content-length", small.len())
            .body(Body::from(small))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let large = json!({"name": "a body well past sixteen bytes"}).to_string();
    let (status, _, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .header("content-length", large.len())
            .body(Body::from(large))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn lowercase_bearer_scheme_is_accepted() {
    let auth = Arc::new(TokenAuthenticator::new(&auth_settings()));
    let app = test_app("default", Some(Arc::clone(&auth)));
    let token = auth.issue_token(None).unwrap();

    let (status, headers, _) = send(
        &app,
        Request::builder()
            .uri("/api/secret")
            .header("Authorization", format!("bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[REASON_HEADER], "verified successfully");
}
