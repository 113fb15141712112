/*
 * Responsibility
 * - Config 読み込み → TokenAuthenticator / Dispatcher 生成 → route 登録
 * - Middleware の適用 (request-id / trace / limit / timeout)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{Config, HttpSettings};
use crate::middleware;
use crate::routing::Dispatcher;
use crate::services::auth::TokenAuthenticator;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,route_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so it gets noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config.http);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Registration happens here, before the dispatcher is shared.
pub fn build_state(config: &Config) -> Result<AppState> {
    let auth = Arc::new(TokenAuthenticator::new(&config.auth));
    let handlers = api::handlers::registry(&config.router.handler_prefix, Arc::clone(&auth));

    tracing::debug!(handlers = handlers.len(), "handler registry built");

    let mut dispatcher = Dispatcher::new(config.router.clone(), handlers, Some(auth))?;
    let added = api::routes::register(&mut dispatcher);
    tracing::info!(added, total = api::routes::ROUTES.len(), "routes registered");
    for route in dispatcher.routes().iter() {
        tracing::debug!(
            key = %route.key(),
            handler = %route.handler_name(),
            auth = route.requires_auth(),
            admin = route.requires_admin(),
            "route"
        );
    }

    Ok(AppState::new(Arc::new(dispatcher)))
}

pub fn build_router(state: AppState, http: &HttpSettings) -> Router {
    middleware::http::apply(api::router(state), http)
}
