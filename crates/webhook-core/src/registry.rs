//! Route registry: path → handler type.
//!
//! Assembled once at startup through [`RouteRegistryBuilder`], then frozen.
//! The frozen [`RouteRegistry`] has no mutation path and is shared by
//! reference with the dispatcher.

use std::collections::HashMap;

use crate::error::RouteError;
use crate::handler::HandlerType;

/// A bound path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub handler: HandlerType,
}

/// Accumulates routes in registration order.
#[derive(Debug, Default)]
pub struct RouteRegistryBuilder {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `path` to `handler`. A path can be bound only once.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        handler: HandlerType,
    ) -> Result<&mut Self, RouteError> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath(path));
        }
        if self.index.contains_key(&path) {
            return Err(RouteError::DuplicatePath(path));
        }
        self.index.insert(path.clone(), self.routes.len());
        self.routes.push(Route { path, handler });
        Ok(self)
    }

    pub fn build(self) -> RouteRegistry {
        RouteRegistry {
            routes: self.routes,
            index: self.index,
        }
    }
}

/// Immutable path → handler type table.
#[derive(Debug)]
pub struct RouteRegistry {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteRegistry {
    pub fn builder() -> RouteRegistryBuilder {
        RouteRegistryBuilder::new()
    }

    /// Builds a registry from a fixed `(path, handler)` table.
    pub fn from_table<'a, I>(table: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = (&'a str, HandlerType)>,
    {
        let mut builder = RouteRegistryBuilder::new();
        for (path, handler) in table {
            builder.register(path, handler)?;
        }
        Ok(builder.build())
    }

    pub fn resolve(&self, path: &str) -> Result<HandlerType, RouteError> {
        self.index
            .get(path)
            .map(|&idx| self.routes[idx].handler)
            .ok_or_else(|| RouteError::UnknownRoute(path.to_string()))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
