//! Route lookup.
//!
//! # Responsibilities
//! - Own one compiled trie per method
//! - Resolve method + path to an endpoint, or an explicit 404/405
//! - Carry router-level context values handed to every handler
//!
//! # Design Decisions
//! - Immutable after construction (shared via `Arc`, no locks)
//! - O(1) method lookup via HashMap, then a trie walk
//! - 405 when the method is unknown, has no routes, or the path only
//!   resolves under other methods; 404 otherwise

use axum::http::Extensions;
use std::collections::HashMap;
use std::fmt;

use super::matcher::{find, Match};
use super::method::Method;
use super::route::RouteTable;
use super::trie::{compile, Node};
use crate::error::{BuildError, RouteError};

/// Compiled, immutable route table.
pub struct Router {
    tries: HashMap<Method, Node>,
    context: Extensions,
}

impl Router {
    /// Compile `table` into one trie per method that has routes.
    pub fn new(table: RouteTable) -> Result<Self, BuildError> {
        let mut tries = HashMap::new();
        for method in Method::ALL {
            if let Some(root) = compile(&table, method)? {
                tries.insert(method, root);
            }
        }

        tracing::info!(
            routes = table.len(),
            methods = tries.len(),
            "Route table compiled"
        );

        Ok(Self {
            tries,
            context: Extensions::new(),
        })
    }

    /// Make `value` available to every handler through [`Context::get`](crate::Context::get).
    pub fn with_context<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.context.insert(value);
        self
    }

    pub fn context(&self) -> &Extensions {
        &self.context
    }

    /// Resolve a request. `method` is matched case-insensitively; `path` excludes the query.
    pub fn lookup(&self, method: &str, path: &str) -> Result<Match<'_>, RouteError> {
        let parsed = method.parse::<Method>().ok();
        let root = parsed.and_then(|m| self.tries.get(&m));

        if let Some(found) = root.and_then(|root| find(root, path)) {
            return Ok(found);
        }

        let allowed = self.allowed_for(path);
        if root.is_none() || !allowed.is_empty() {
            return Err(RouteError::MethodNotSupported {
                method: method.to_string(),
                allowed,
            });
        }

        Err(RouteError::RouteNotFound {
            path: path.to_string(),
        })
    }

    /// Methods under which `path` resolves.
    pub fn allowed_for(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .tries
            .iter()
            .filter(|(_, root)| find(root, path).is_some())
            .map(|(method, _)| *method)
            .collect();
        methods.sort();
        methods
    }

    /// Methods that have at least one route.
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.tries.keys().copied().collect();
        methods.sort();
        methods
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("methods", &self.methods())
            .finish_non_exhaustive()
    }
}
