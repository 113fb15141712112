//! HTTP request dispatcher with a bearer-token gate.
//!
//! Routes map `(method, path)` to named handlers. A route can require a valid
//! HS256 token in a configurable header, and additionally a `user.admin`
//! claim. See [`routing::Dispatcher`] and [`services::auth::TokenAuthenticator`].

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routing;
pub mod services;
pub mod state;

pub use config::{AuthSettings, Config, ConfigError, HttpSettings, RouterSettings};
pub use routing::{
    Dispatched, DispatchError, Dispatcher, HandlerRegistry, Outcome, RawRequest,
    RegistrationError, RequestContext, Response,
};
pub use services::auth::{AuthContext, AuthFailure, TokenAuthenticator};
