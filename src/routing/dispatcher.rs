//! Route registration and request dispatch.
//!
//! # Responsibilities
//! - Validate and store routes (first registration of a key wins)
//! - Resolve a request to a route, or to the default handler
//! - Run the token gate before protected handlers
//!
//! # Design Decisions
//! - Per-request state lives in [`RequestContext`] / [`Response`], never on
//!   the dispatcher, so one dispatcher can serve concurrent requests
//! - A miss with no default handler is an error, not a silent 404
//! - Authentication failures are an [`Outcome`], not an error

use std::sync::Arc;

use axum::http::{HeaderName, StatusCode};
use tracing::{error, info, warn};

use crate::config::{ConfigError, RouterSettings};
use crate::routing::context::{
    AUTH_REASON_HEADER, RawRequest, REASON_HEADER, RequestContext, Response,
};
use crate::routing::error::{DispatchError, RegistrationError};
use crate::routing::handler::HandlerRegistry;
use crate::routing::path::PathParser;
use crate::routing::route::{Method, Route, RouteTable};
use crate::services::auth::TokenAuthenticator;

/// How a successfully dispatched request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The matched route's handler ran.
    Handled,
    /// No route matched; the default handler ran.
    Fallback,
    /// The route needed a token that was absent or rejected. Status is 401
    /// and the handler did not run.
    Unauthorized,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Unauthorized)
    }
}

/// Result of one dispatch: the outcome plus the request/response it produced.
#[derive(Debug)]
pub struct Dispatched {
    pub outcome: Outcome,
    pub context: RequestContext,
    pub response: Response,
}

pub struct Dispatcher {
    settings: RouterSettings,
    handlers: HandlerRegistry,
    routes: RouteTable,
    parser: PathParser,
    auth_header: HeaderName,
    authenticator: Option<Arc<TokenAuthenticator>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("settings", &self.settings)
            .field("routes", &self.routes.len())
            .field("authenticator", &self.authenticator.is_some())
            .finish()
    }
}

impl Dispatcher {
    /// Fails if the base URI or the auth header name is unusable.
    ///
    /// `authenticator` may be `None`; protected routes then fail with
    /// [`DispatchError::AuthenticatorUnavailable`].
    pub fn new(
        settings: RouterSettings,
        handlers: HandlerRegistry,
        authenticator: Option<Arc<TokenAuthenticator>>,
    ) -> Result<Self, ConfigError> {
        let parser = PathParser::new(&settings.base_uri).map_err(|e| {
            error!(error = %e, base_uri = %settings.base_uri, "invalid base uri");
            ConfigError::Invalid("ROUTER_BASE_URI")
        })?;

        let auth_header = settings.auth_header_name().inspect_err(|_| {
            error!(auth_header = %settings.auth_header, "invalid auth header name");
        })?;

        info!(
            handler_prefix = %settings.handler_prefix,
            base_uri = %parser.base(),
            auth = authenticator.is_some(),
            "dispatcher started"
        );

        Ok(Self {
            settings,
            handlers,
            routes: RouteTable::new(),
            parser,
            auth_header,
            authenticator,
        })
    }

    /// Read-only view for introspection.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn authenticator(&self) -> Option<&Arc<TokenAuthenticator>> {
        self.authenticator.as_ref()
    }

    /// [`try_register`](Self::try_register) reduced to a flag. Rejections are
    /// logged.
    pub fn register(
        &mut self,
        path: &str,
        method: &str,
        handler: &str,
        requires_auth: bool,
        requires_admin: bool,
    ) -> bool {
        self.try_register(path, method, handler, requires_auth, requires_admin)
            .is_ok()
    }

    /// Bind `method path` to the handler registered as `prefix + handler`.
    pub fn try_register(
        &mut self,
        path: &str,
        method: &str,
        handler: &str,
        requires_auth: bool,
        requires_admin: bool,
    ) -> Result<(), RegistrationError> {
        let result = self.build_route(path, method, handler, requires_auth, requires_admin);

        let result = result.and_then(|route| self.routes.insert(route));

        match &result {
            Ok(()) => info!(%method, %path, %handler, requires_auth, requires_admin, "route added"),
            Err(e) => error!(%method, %path, %handler, error = %e, "route rejected"),
        }

        result
    }

    fn build_route(
        &self,
        path: &str,
        method: &str,
        handler: &str,
        requires_auth: bool,
        requires_admin: bool,
    ) -> Result<Route, RegistrationError> {
        if path.is_empty() {
            return Err(RegistrationError::EmptyPath);
        }

        let method: Method = method.parse()?;

        let name = self.qualified(handler);
        let resolved = self
            .handlers
            .resolve(&name)
            .ok_or_else(|| RegistrationError::UnknownHandler(name.clone()))?;

        if requires_admin && !requires_auth {
            warn!(%method, %path, "admin check without auth is never applied");
        }

        Ok(Route::new(
            method,
            path,
            name,
            resolved,
            requires_auth,
            requires_admin,
        ))
    }

    fn qualified(&self, handler: &str) -> String {
        format!("{}{}", self.settings.handler_prefix, handler)
    }

    /// Route one request.
    ///
    /// Returns `Err` only for fatal conditions: missing method/URI, a miss
    /// with no default handler, or a protected route with no authenticator.
    pub fn dispatch(&self, request: RawRequest) -> Result<Dispatched, DispatchError> {
        let RawRequest {
            method,
            uri,
            headers,
            body,
        } = request;

        let Some(method) = method else {
            error!("request method not set");
            return Err(DispatchError::MissingMethod);
        };

        let Some(uri) = uri else {
            error!(%method, "request uri not set");
            return Err(DispatchError::MissingUri);
        };

        info!(%method, %uri, "request");

        let parsed = self.parser.parse(&uri);
        let mut context = RequestContext::new(method, uri, parsed.path, parsed.query, headers, body);
        let mut response = Response::new();

        let Some(route) = self.routes.get(context.method(), context.path()) else {
            return self.fallback(context, response);
        };

        if !route.requires_auth() {
            route.call(&context, &mut response);
            return Ok(Dispatched {
                outcome: Outcome::Handled,
                context,
                response,
            });
        }

        let Some(authenticator) = &self.authenticator else {
            error!(route = %route.key(), "route requires auth but no authenticator is configured");
            return Err(DispatchError::AuthenticatorUnavailable { key: route.key() });
        };

        let token = context
            .header(self.auth_header.as_str())
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string);

        let Some(token) = token else {
            response.set_status(StatusCode::UNAUTHORIZED);
            response.set_reason(REASON_HEADER, "token not present");
            warn!(method = %context.method(), uri = %context.raw_path(), route = %route.key(), "token not present");
            return Ok(Dispatched {
                outcome: Outcome::Unauthorized,
                context,
                response,
            });
        };

        match authenticator.verify(&token, route.requires_admin()) {
            Ok(auth) => {
                response.set_reason(REASON_HEADER, "verified successfully");
                context.auth = Some(auth);
                route.call(&context, &mut response);
                Ok(Dispatched {
                    outcome: Outcome::Handled,
                    context,
                    response,
                })
            }
            Err(failure) => {
                response.set_status(StatusCode::UNAUTHORIZED);
                response.set_reason(REASON_HEADER, "failed verification");
                response.set_reason(AUTH_REASON_HEADER, &failure.to_string());
                warn!(method = %context.method(), uri = %context.raw_path(), route = %route.key(), "failed token verification");
                Ok(Dispatched {
                    outcome: Outcome::Unauthorized,
                    context,
                    response,
                })
            }
        }
    }

    fn fallback(
        &self,
        context: RequestContext,
        mut response: Response,
    ) -> Result<Dispatched, DispatchError> {
        let default = if self.settings.default_handler.is_empty() {
            None
        } else {
            self.handlers
                .resolve(&self.qualified(&self.settings.default_handler))
        };

        let Some(handler) = default else {
            error!(method = %context.method(), path = %context.path(), "no route and no default handler");
            return Err(DispatchError::NoRoute {
                method: context.method().to_string(),
                path: context.path().to_string(),
            });
        };

        handler(&context, &mut response);

        Ok(Dispatched {
            outcome: Outcome::Fallback,
            context,
            response,
        })
    }
}
