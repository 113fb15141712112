use thiserror::Error;

/// Why a route was not added. Registration errors are local: the route is
/// dropped and the dispatcher keeps working.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("endpoint was empty, route not added")]
    EmptyPath,

    #[error("invalid method {0:?}, route not added")]
    InvalidMethod(String),

    #[error("handler {0:?} does not exist, route not added")]
    UnknownHandler(String),

    #[error("route collision on {0:?}, route not added")]
    Collision(String),
}

/// Fatal dispatch failures. An authentication failure is not one of these:
/// it is reported as [`Outcome::Unauthorized`](super::Outcome::Unauthorized).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request method not set")]
    MissingMethod,

    #[error("request uri not set")]
    MissingUri,

    #[error("no route for {method} {path} and no default handler")]
    NoRoute { method: String, path: String },

    #[error("route {key} requires authentication but no token authenticator is configured")]
    AuthenticatorUnavailable { key: String },
}
