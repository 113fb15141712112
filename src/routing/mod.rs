//! Request dispatch with an authentication gate.
//!
//! # Data Flow
//! ```text
//! RawRequest (method, uri, headers, body)
//!     → path.rs (strip base prefix, split query)
//!     → route.rs (lookup by method + path)
//!     → dispatcher.rs (auth gate via TokenAuthenticator, then handler)
//!     → Dispatched { outcome, context, response } or DispatchError
//! ```
//!
//! Routes are registered through `&mut Dispatcher` and dispatched through
//! `&Dispatcher`, so the table never changes while requests are served.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod path;
pub mod route;

pub use context::{AUTH_REASON_HEADER, RawRequest, REASON_HEADER, RequestContext, Response};
pub use dispatcher::{Dispatched, Dispatcher, Outcome};
pub use error::{DispatchError, RegistrationError};
pub use handler::{Handler, HandlerRegistry};
pub use route::{Method, Route, RouteTable};
