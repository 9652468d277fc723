//! Template expansion: the client-side mirror of route compilation.

use std::collections::BTreeMap;
use url::Url;

use super::error::ClientError;
use crate::routing::trie::{parse_segment, split_path, Segment};

/// Percent-encodes single path segments with the `url` path-segment set.
struct SegmentEncoder(Url);

impl SegmentEncoder {
    fn new() -> Result<Self, ClientError> {
        Url::parse("http://localhost/")
            .map(Self)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    fn encode(&mut self, value: &str) -> String {
        if let Ok(mut segments) = self.0.path_segments_mut() {
            segments.clear().push(value);
        }
        let path = self.0.path();
        path.strip_prefix('/').unwrap_or(path).to_string()
    }
}

/// Percent-encode `value` as a single path segment.
pub fn encode_segment(value: &str) -> Result<String, ClientError> {
    Ok(SegmentEncoder::new()?.encode(value))
}

/// Substitute `params` into `template`.
///
/// Named values become one encoded segment; catch-all values may span
/// several segments. Static segments are kept verbatim.
pub fn expand(template: &str, params: &BTreeMap<String, String>) -> Result<String, ClientError> {
    let mut encoder = SegmentEncoder::new()?;
    let mut path = String::new();
    for raw in split_path(template) {
        path.push('/');
        match parse_segment(raw) {
            Segment::Static(literal) => path.push_str(literal),
            Segment::Param(name) => {
                let value = params
                    .get(name)
                    .ok_or_else(|| ClientError::MissingParam(name.to_string()))?;
                path.push_str(&encoder.encode(value));
            }
            Segment::CatchAll(name) => {
                let value = params
                    .get(name)
                    .ok_or_else(|| ClientError::MissingParam(name.to_string()))?;
                let encoded: Vec<String> = value.split('/').map(|part| encoder.encode(part)).collect();
                path.push_str(&encoded.join("/"));
            }
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    Ok(path)
}

/// Build the full request URL under `base`.
///
/// A `?query` in the template is kept; `query` pairs are appended after it.
pub fn build_url(
    base: &Url,
    template: &str,
    params: &BTreeMap<String, String>,
    query: &[(String, String)],
) -> Result<Url, ClientError> {
    let (template_path, template_query) = match template.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (template, None),
    };

    let expanded = expand(template_path, params)?;
    let prefix = base.path().trim_end_matches('/');
    let full_path = if expanded == "/" && !prefix.is_empty() {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, expanded)
    };

    let mut url = base.clone();
    url.set_path(&full_path);
    url.set_query(template_query.filter(|q| !q.is_empty()));
    url.set_fragment(None);
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouteError;
    use crate::handler::Context;
    use crate::routing::{get, RouteTable, Router};

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("abc-1.2_~").unwrap(), "abc-1.2_~");
        assert_eq!(encode_segment("a b/c?d#e%").unwrap(), "a%20b%2Fc%3Fd%23e%25");
        assert_eq!(encode_segment("é").unwrap(), "%C3%A9");
        assert_eq!(encode_segment("user@host:1").unwrap(), "user@host:1");
        assert_eq!(encode_segment("").unwrap(), "");
    }

    #[test]
    fn test_expand() {
        assert_eq!(expand("/", &params(&[])).unwrap(), "/");
        assert_eq!(expand("", &params(&[])).unwrap(), "/");
        assert_eq!(expand("/items/:id", &params(&[("id", "42")])).unwrap(), "/items/42");
        assert_eq!(
            expand("/files/...path", &params(&[("path", "a b/c")])).unwrap(),
            "/files/a%20b/c"
        );
        assert!(matches!(
            expand("/items/:id", &params(&[])),
            Err(ClientError::MissingParam(name)) if name == "id"
        ));
    }

    #[test]
    fn test_build_url() {
        let base = Url::parse("http://localhost:8080/api/").unwrap();
        let url = build_url(
            &base,
            "/items/:id?x=1",
            &params(&[("id", "7")]),
            &[("q".into(), "a b".into())],
        )
        .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/items/7?x=1&q=a+b");

        let base = Url::parse("http://localhost:8080").unwrap();
        let url = build_url(&base, "/", &params(&[]), &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_expanded_path_matches_its_template() {
        async fn ok(_ctx: Context) -> Result<(), RouteError> {
            Ok(())
        }
        let templates = ["/users/all", "/users/:id", "/users/:id/posts/:post", "/files/...rest"];
        let router = Router::new(
            templates
                .iter()
                .fold(RouteTable::new(), |t, template| t.route(*template, get(ok))),
        )
        .unwrap();

        let values = params(&[("id", "42"), ("post", "x"), ("rest", "a/b/c")]);
        for template in templates {
            let path = expand(template, &values).unwrap();
            let found = router.lookup("GET", &path).unwrap();
            assert_eq!(found.matched_path(), template);
        }
    }
}
