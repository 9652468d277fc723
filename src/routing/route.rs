//! Route definitions and the flat route table.
//!
//! # Responsibilities
//! - Tag a handler with its method (or `any`)
//! - Attach optional body/params/search schemas and guards
//! - Collect definitions per path template, preserving registration order

use std::fmt;

use super::method::Method;
use crate::handler::{self, BoxHandler, Guard, Handler};
use crate::schema::{BoxSchema, Fields, Schema, SchemaExt};

/// Which methods a definition answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSpec {
    Only(Method),
    Any,
}

impl MethodSpec {
    pub fn includes(&self, method: Method) -> bool {
        match self {
            MethodSpec::Only(m) => *m == method,
            MethodSpec::Any => true,
        }
    }
}

/// A handler plus everything declared about it.
#[derive(Clone)]
pub struct RouteDef {
    pub(crate) method: MethodSpec,
    pub(crate) handler: BoxHandler,
    pub(crate) body: Option<BoxSchema>,
    pub(crate) params: Option<Fields>,
    pub(crate) search: Option<Fields>,
    pub(crate) guards: Vec<Guard>,
}

impl RouteDef {
    pub fn new<H: Handler>(method: MethodSpec, handler: H) -> Self {
        Self {
            method,
            handler: handler::boxed(handler),
            body: None,
            params: None,
            search: None,
            guards: Vec::new(),
        }
    }

    /// Validate captured path segments.
    pub fn params(mut self, fields: Fields) -> Self {
        self.params = Some(fields);
        self
    }

    /// Validate the query string. Undeclared keys are stripped.
    pub fn search(mut self, fields: Fields) -> Self {
        self.search = Some(fields);
        self
    }

    /// Require and validate a JSON body.
    pub fn body(mut self, schema: impl Schema) -> Self {
        self.body = Some(schema.boxed());
        self
    }

    /// Append a guard. Guards run in the order they were added.
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn method(&self) -> MethodSpec {
        self.method
    }
}

impl fmt::Debug for RouteDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDef")
            .field("method", &self.method)
            .field("body", &self.body.is_some())
            .field("params", &self.params)
            .field("search", &self.search)
            .field("guards", &self.guards.len())
            .finish()
    }
}

macro_rules! method_fns {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Route answering `", stringify!($method), "` requests.")]
            pub fn $name<H: Handler>(handler: H) -> RouteDef {
                RouteDef::new(MethodSpec::Only(Method::$method), handler)
            }
        )*
    };
}

method_fns! {
    get => Get,
    post => Post,
    put => Put,
    delete => Delete,
    patch => Patch,
    options => Options,
    head => Head,
}

/// Route answering every method.
pub fn any<H: Handler>(handler: H) -> RouteDef {
    RouteDef::new(MethodSpec::Any, handler)
}

/// Path templates mapped to their definitions, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<(String, Vec<RouteDef>)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one definition under `template`.
    pub fn route(mut self, template: impl Into<String>, def: RouteDef) -> Self {
        self.push(template.into(), def);
        self
    }

    /// Register several definitions (typically one per method) under `template`.
    pub fn routes(mut self, template: impl Into<String>, defs: impl IntoIterator<Item = RouteDef>) -> Self {
        let template = template.into();
        for def in defs {
            self.push(template.clone(), def);
        }
        self
    }

    fn push(&mut self, template: String, def: RouteDef) {
        match self.entries.iter_mut().find(|(t, _)| *t == template) {
            Some((_, defs)) => defs.push(def),
            None => self.entries.push((template, vec![def])),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteDef)> {
        self.entries
            .iter()
            .flat_map(|(template, defs)| defs.iter().map(move |def| (template.as_str(), def)))
    }

    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, defs)| defs.len()).sum()
    }
}
