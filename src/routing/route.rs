use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::routing::context::{RequestContext, Response};
use crate::routing::error::RegistrationError;
use crate::routing::handler::Handler;

/// Methods a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive: `"get"` is rejected.
impl FromStr for Method {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(RegistrationError::InvalidMethod(other.to_string())),
        }
    }
}

/// Route identity: plain `method + path` concatenation.
///
/// `("GET", "A/b")` and `("GETA", "/b")` produce the same key.
pub fn route_key(method: &str, path: &str) -> String {
    format!("{method}{path}")
}

/// A registered binding. Never mutated after registration.
#[derive(Clone)]
pub struct Route {
    method: Method,
    path: String,
    handler_name: String,
    handler: Handler,
    requires_auth: bool,
    requires_admin: bool,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handler_name", &self.handler_name)
            .field("requires_auth", &self.requires_auth)
            .field("requires_admin", &self.requires_admin)
            .finish()
    }
}

impl Route {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        handler_name: impl Into<String>,
        handler: Handler,
        requires_auth: bool,
        requires_admin: bool,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            handler_name: handler_name.into(),
            handler,
            requires_auth,
            requires_admin,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Prefixed name the handler was resolved under.
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn requires_admin(&self) -> bool {
        self.requires_admin
    }

    pub fn key(&self) -> String {
        route_key(self.method.as_str(), &self.path)
    }

    pub(crate) fn call(&self, ctx: &RequestContext, res: &mut Response) {
        (self.handler)(ctx, res)
    }
}

/// Routes by identity key. Keys are unique and the first insert wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, route: Route) -> Result<(), RegistrationError> {
        let key = route.key();
        if self.routes.contains_key(&key) {
            return Err(RegistrationError::Collision(key));
        }
        self.routes.insert(key, route);
        Ok(())
    }

    /// `method` is the raw request method, so unknown methods simply miss.
    pub fn get(&self, method: &str, path: &str) -> Option<&Route> {
        self.routes.get(&route_key(method, path))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }
}
