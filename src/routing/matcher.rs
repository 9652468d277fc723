//! Path matching against a compiled trie.
//!
//! # Responsibilities
//! - Walk the trie segment by segment
//! - Capture raw values for `:param` and `...catchall` segments
//! - Backtrack when a branch dead-ends
//!
//! # Design Decisions
//! - Precedence per depth: static, then parameter, then catch-all
//! - A failed branch returns `None` and the caller tries the next sibling
//! - Captures are raw segments, not percent-decoded
//! - Pure: same trie and path always give the same result

use std::collections::BTreeMap;

use super::trie::{split_path, Endpoint, Node};

/// A resolved route.
#[derive(Debug)]
pub struct Match<'a> {
    pub endpoint: &'a Endpoint,
    /// Captured path values by parameter name.
    pub params: BTreeMap<String, String>,
}

impl Match<'_> {
    /// The template that matched, e.g. `/items/:id`.
    pub fn matched_path(&self) -> &str {
        &self.endpoint.template
    }
}

/// Find the endpoint for `path` (no query string) in `root`.
pub fn find<'a>(root: &'a Node, path: &str) -> Option<Match<'a>> {
    let segments = split_path(path);
    let mut params = BTreeMap::new();
    let endpoint = walk(root, &segments, 0, &mut params)?;
    Some(Match { endpoint, params })
}

fn walk<'a>(
    node: &'a Node,
    segments: &[&str],
    depth: usize,
    params: &mut BTreeMap<String, String>,
) -> Option<&'a Endpoint> {
    let Some(&segment) = segments.get(depth) else {
        return node.endpoint.as_ref();
    };

    if let Some(child) = node.statics.get(segment) {
        if let Some(found) = walk(child, segments, depth + 1, params) {
            return Some(found);
        }
    }

    if let Some((name, child)) = &node.param {
        let previous = params.insert(name.clone(), segment.to_string());
        if let Some(found) = walk(child, segments, depth + 1, params) {
            return Some(found);
        }
        match previous {
            Some(value) => params.insert(name.clone(), value),
            None => params.remove(name),
        };
    }

    let catch_all = node.catch_all.as_ref()?;
    params.insert(catch_all.name.clone(), segments[depth..].join("/"));
    Some(&catch_all.endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouteError;
    use crate::handler::Context;
    use crate::routing::trie::compile;
    use crate::routing::{get, Method, RouteTable};

    async fn ok(_ctx: Context) -> Result<(), RouteError> {
        Ok(())
    }

    fn trie(templates: &[&str]) -> Node {
        let table = templates
            .iter()
            .fold(RouteTable::new(), |table, t| table.route(*t, get(ok)));
        compile(&table, Method::Get).unwrap().unwrap()
    }

    fn matched(root: &Node, path: &str) -> Option<(String, Vec<(String, String)>)> {
        find(root, path).map(|m| {
            (
                m.matched_path().to_string(),
                m.params.into_iter().collect(),
            )
        })
    }

    fn kv(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_root() {
        let root = trie(&["/"]);
        assert_eq!(matched(&root, "/").unwrap().0, "/");
        assert_eq!(matched(&root, "").unwrap().0, "/");
        assert!(matched(&root, "/x").is_none());

        let root = trie(&["/x"]);
        assert!(matched(&root, "/").is_none());
    }

    #[test]
    fn test_static_beats_param() {
        let root = trie(&["/users/all", "/users/:id"]);
        assert_eq!(matched(&root, "/users/all"), Some(("/users/all".into(), vec![])));
        assert_eq!(
            matched(&root, "/users/42"),
            Some(("/users/:id".into(), vec![kv("id", "42")]))
        );
    }

    #[test]
    fn test_backtracks_from_static_dead_end() {
        // `/users/all` has no child `posts`, so the param branch must be tried.
        let root = trie(&["/users/all", "/users/:id/posts"]);
        assert_eq!(
            matched(&root, "/users/all/posts"),
            Some(("/users/:id/posts".into(), vec![kv("id", "all")]))
        );
        assert!(matched(&root, "/users/all/comments").is_none());
    }

    #[test]
    fn test_backtracks_to_catch_all() {
        let root = trie(&["/a/:x/c", "/a/...rest"]);
        assert_eq!(
            matched(&root, "/a/b/c"),
            Some(("/a/:x/c".into(), vec![kv("x", "b")]))
        );
        // The failed param branch leaves no stale capture behind.
        assert_eq!(
            matched(&root, "/a/b/d"),
            Some(("/a/...rest".into(), vec![kv("rest", "b/d")]))
        );
    }

    #[test]
    fn test_catch_all_depths() {
        let root = trie(&["/...rest"]);
        assert_eq!(matched(&root, "/a/b/c").unwrap().1, vec![kv("rest", "a/b/c")]);
        assert_eq!(matched(&root, "/a/b/c/d/e").unwrap().1, vec![kv("rest", "a/b/c/d/e")]);
        assert!(matched(&root, "/").is_none());

        let root = trie(&["/files/...path"]);
        assert_eq!(matched(&root, "/files/x.txt").unwrap().1, vec![kv("path", "x.txt")]);
        assert!(matched(&root, "/files").is_none());
        assert!(matched(&root, "/other/x").is_none());
    }

    #[test]
    fn test_intermediate_node_without_endpoint() {
        let root = trie(&["/a/b/c"]);
        assert!(matched(&root, "/a/b").is_none());
        assert!(matched(&root, "/a/b/c/d").is_none());
        assert!(matched(&root, "/a/b/c").is_some());
    }

    #[test]
    fn test_captures_are_raw() {
        let root = trie(&["/items/:id"]);
        assert_eq!(matched(&root, "/items/a%20b").unwrap().1, vec![kv("id", "a%20b")]);
    }

    #[test]
    fn test_multiple_params() {
        let root = trie(&["/orgs/:org/repos/:repo"]);
        assert_eq!(
            matched(&root, "/orgs/rust/repos/cargo").unwrap().1,
            vec![kv("org", "rust"), kv("repo", "cargo")]
        );
    }
}
