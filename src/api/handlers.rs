/*
 * Responsibility
 * - demo server の handler 群 (page / auth / api / admin / default)
 * - handler は RequestContext を読み、Response に書くだけ
 * - 名前は Dispatcher の handler prefix 付きで登録する
 */
use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode, header};
use serde_json::{Value, json};

use crate::routing::{HandlerRegistry, RequestContext, Response};
use crate::services::auth::TokenAuthenticator;

/// Demo handlers, stored as `prefix + name`.
pub fn registry(prefix: &str, auth: Arc<TokenAuthenticator>) -> HandlerRegistry {
    let name = |n: &str| format!("{prefix}{n}");

    HandlerRegistry::new()
        .with(name("page"), page)
        .with(name("auth"), move |ctx: &RequestContext, res: &mut Response| {
            issue(&auth, ctx, res)
        })
        .with(name("api"), api)
        .with(name("admin"), admin)
        .with(name("default"), not_found)
}

fn html(res: &mut Response, body: &str) {
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    res.write(body);
}

pub fn page(_: &RequestContext, res: &mut Response) {
    html(res, "<html><body><h1>Page</h1></body></html>");
}

/// Hands out a non-admin token. Admin tokens are only minted out of band.
pub fn issue(auth: &TokenAuthenticator, _: &RequestContext, res: &mut Response) {
    let claims = json!({"user": {"admin": false}}).as_object().cloned();

    match auth.issue_token(claims) {
        Ok(token) => res.json(&json!({"token": token, "token_type": "Bearer"})),
        Err(e) => {
            tracing::error!(error = %e, "token issue failed");
            res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

pub fn api(ctx: &RequestContext, res: &mut Response) {
    let subject = ctx
        .auth()
        .and_then(|a| a.claim("user"))
        .cloned()
        .unwrap_or(Value::Null);

    res.json(&json!({
        "data": ["somedata"],
        "user": subject,
        "received": ctx.body(),
    }));
}

pub fn admin(ctx: &RequestContext, res: &mut Response) {
    res.json(&json!({
        "admin": ctx.auth().map(|a| a.is_admin()).unwrap_or(false),
        "received": ctx.body(),
    }));
}

pub fn not_found(_: &RequestContext, res: &mut Response) {
    res.set_status(StatusCode::NOT_FOUND);
    html(
        res,
        "<html><body><h1>Error</h1><p>The page you requested does not exist.</p></body></html>",
    );
}
