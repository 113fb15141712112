use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::routing::context::{RequestContext, Response};

/// Caller-supplied request logic.
pub type Handler = Arc<dyn Fn(&RequestContext, &mut Response) + Send + Sync>;

/// Named handlers the dispatcher resolves route targets against.
///
/// Names are looked up exactly as stored; the dispatcher adds its configured
/// prefix before asking.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&RequestContext, &mut Response) + Send + Sync + 'static,
    {
        self.insert(name, handler);
        self
    }

    /// Replaces any handler already stored under `name`.
    pub fn insert<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&RequestContext, &mut Response) + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn resolve(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
