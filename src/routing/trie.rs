//! Route compilation into per-method segment tries.
//!
//! # Responsibilities
//! - Split templates into static, `:param` and `...catchall` segments
//! - Build one trie per method from the route table
//! - Attach the guarded handler and declared schemas at the leaf
//!
//! # Design Decisions
//! - At most one parameter name and one catch-all name per depth
//! - A catch-all must be the final segment
//! - Duplicate templates on one method: last registration wins (logged)

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::method::Method;
use super::route::{RouteDef, RouteTable};
use crate::error::BuildError;
use crate::handler::{guard, BoxHandler};
use crate::schema::{BoxSchema, Fields};

/// Schemas declared for a route.
#[derive(Clone, Default)]
pub struct Parsers {
    pub body: Option<BoxSchema>,
    pub params: Option<Fields>,
    pub search: Option<Fields>,
}

/// What a leaf resolves to.
pub struct Endpoint {
    /// The template this endpoint was registered under.
    pub template: Arc<str>,
    /// Handler with its guards already applied.
    pub handler: BoxHandler,
    pub parsers: Parsers,
}

impl Endpoint {
    fn from_def(template: &str, def: &RouteDef) -> Self {
        Self {
            template: Arc::from(template),
            handler: guard::chain(def.guards.clone(), Arc::clone(&def.handler)),
            parsers: Parsers {
                body: def.body.clone(),
                params: def.params.clone(),
                search: def.search.clone(),
            },
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("template", &self.template)
            .field("body", &self.parsers.body.is_some())
            .field("params", &self.parsers.params)
            .field("search", &self.parsers.search)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub(crate) struct CatchAll {
    pub(crate) name: String,
    pub(crate) endpoint: Endpoint,
}

/// One level of the trie.
#[derive(Debug, Default)]
pub struct Node {
    pub(crate) endpoint: Option<Endpoint>,
    pub(crate) statics: HashMap<String, Node>,
    pub(crate) param: Option<(String, Box<Node>)>,
    pub(crate) catch_all: Option<CatchAll>,
}

/// A classified template segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
    CatchAll(&'a str),
}

pub fn parse_segment(segment: &str) -> Segment<'_> {
    if let Some(name) = segment.strip_prefix("...") {
        Segment::CatchAll(name)
    } else if let Some(name) = segment.strip_prefix(':') {
        Segment::Param(name)
    } else {
        Segment::Static(segment)
    }
}

/// Split a path or template on `/`, dropping the leading empty segment.
///
/// `""` and `"/"` both yield no segments.
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').collect()
    }
}

impl Node {
    /// Whether anything at all is routed through this node.
    pub fn is_empty(&self) -> bool {
        self.endpoint.is_none()
            && self.statics.is_empty()
            && self.param.is_none()
            && self.catch_all.is_none()
    }

    fn insert(&mut self, template: &str, endpoint: Endpoint) -> Result<(), BuildError> {
        let segments = split_path(template);
        let mut node = self;

        for (depth, raw) in segments.iter().enumerate() {
            match parse_segment(raw) {
                Segment::Static(literal) => {
                    node = node.statics.entry(literal.to_string()).or_default();
                }
                Segment::Param(name) => {
                    if name.is_empty() {
                        return Err(BuildError::EmptyParamName { template: template.to_string() });
                    }
                    let (existing, child) = node
                        .param
                        .get_or_insert_with(|| (name.to_string(), Box::default()));
                    if existing.as_str() != name {
                        return Err(BuildError::ConflictingParams {
                            template: template.to_string(),
                            existing: existing.clone(),
                            found: name.to_string(),
                        });
                    }
                    node = child.as_mut();
                }
                Segment::CatchAll(name) => {
                    if name.is_empty() {
                        return Err(BuildError::EmptyParamName { template: template.to_string() });
                    }
                    if depth + 1 != segments.len() {
                        return Err(BuildError::CatchAllNotLast { template: template.to_string() });
                    }
                    if let Some(existing) = &node.catch_all {
                        if existing.name != name {
                            return Err(BuildError::ConflictingParams {
                                template: template.to_string(),
                                existing: existing.name.clone(),
                                found: name.to_string(),
                            });
                        }
                        tracing::warn!(template = %template, "Duplicate route, last registration wins");
                    }
                    node.catch_all = Some(CatchAll { name: name.to_string(), endpoint });
                    return Ok(());
                }
            }
        }

        if node.endpoint.is_some() {
            tracing::warn!(template = %template, "Duplicate route, last registration wins");
        }
        node.endpoint = Some(endpoint);
        Ok(())
    }
}

/// Build the trie for `method`. `None` when the table has no route for it.
pub fn compile(table: &RouteTable, method: Method) -> Result<Option<Node>, BuildError> {
    let mut root = Node::default();
    let mut count = 0usize;

    for (template, def) in table.iter().filter(|(_, def)| def.method.includes(method)) {
        root.insert(template, Endpoint::from_def(template, def))?;
        count += 1;
    }

    if count == 0 {
        return Ok(None);
    }
    tracing::debug!(method = %method, routes = count, "Compiled route trie");
    Ok(Some(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouteError;
    use crate::handler::Context;
    use crate::routing::{any, get, post};

    async fn ok(_ctx: Context) -> Result<(), RouteError> {
        Ok(())
    }

    #[test]
    fn test_split_path() {
        assert!(split_path("").is_empty());
        assert!(split_path("/").is_empty());
        assert_eq!(split_path("/a/b"), vec!["a", "b"]);
        assert_eq!(split_path("a/b"), vec!["a", "b"]);
        assert_eq!(split_path("/a/"), vec!["a", ""]);
    }

    #[test]
    fn test_parse_segment() {
        assert_eq!(parse_segment("users"), Segment::Static("users"));
        assert_eq!(parse_segment(":id"), Segment::Param("id"));
        assert_eq!(parse_segment("...rest"), Segment::CatchAll("rest"));
    }

    #[test]
    fn test_compile_shapes_trie() {
        let table = RouteTable::new()
            .route("/", get(ok))
            .route("/users/all", get(ok))
            .route("/users/:id", get(ok))
            .route("/files/...path", get(ok))
            .route("/users", post(ok));

        let root = compile(&table, Method::Get).unwrap().unwrap();
        assert_eq!(root.endpoint.as_ref().map(|e| &*e.template), Some("/"));

        let users = &root.statics["users"];
        assert!(users.endpoint.is_none());
        assert!(users.statics.contains_key("all"));
        assert_eq!(users.param.as_ref().map(|(n, _)| n.as_str()), Some("id"));

        let files = &root.statics["files"];
        assert_eq!(files.catch_all.as_ref().map(|c| c.name.as_str()), Some("path"));

        let post_root = compile(&table, Method::Post).unwrap().unwrap();
        assert!(post_root.statics["users"].endpoint.is_some());
        assert!(compile(&table, Method::Delete).unwrap().is_none());
    }

    #[test]
    fn test_any_expands_to_every_method() {
        let table = RouteTable::new().route("/ping", any(ok));
        for method in Method::ALL {
            assert!(compile(&table, method).unwrap().is_some());
        }
    }

    #[test]
    fn test_build_errors() {
        let table = RouteTable::new().route("/a/...rest/b", get(ok));
        assert!(matches!(compile(&table, Method::Get), Err(BuildError::CatchAllNotLast { .. })));

        let table = RouteTable::new()
            .route("/u/:id", get(ok))
            .route("/u/:name/x", get(ok));
        assert_eq!(
            compile(&table, Method::Get).unwrap_err(),
            BuildError::ConflictingParams {
                template: "/u/:name/x".into(),
                existing: "id".into(),
                found: "name".into(),
            }
        );

        let table = RouteTable::new().route("/u/:", get(ok));
        assert!(matches!(compile(&table, Method::Get), Err(BuildError::EmptyParamName { .. })));

        // Same name on different methods is independent.
        let table = RouteTable::new()
            .route("/u/:id", get(ok))
            .route("/u/:name", post(ok));
        assert!(compile(&table, Method::Get).is_ok());
        assert!(compile(&table, Method::Post).is_ok());
    }

    #[test]
    fn test_duplicate_last_wins() {
        let table = RouteTable::new()
            .route("/x", get(ok).search(crate::schema::fields()))
            .route("/x", get(ok));
        let root = compile(&table, Method::Get).unwrap().unwrap();
        let endpoint = root.statics["x"].endpoint.as_ref().unwrap();
        assert!(endpoint.parsers.search.is_none());
    }
}
