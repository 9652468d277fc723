//! Content-type classification for request and response bodies.

use axum::body::Bytes;
use axum::http::HeaderMap;
use serde_json::Value;

use crate::schema::ValidationError;

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Marker header selecting the enriched JSON codec.
pub const ENRICHED_HEADER: &str = "x-superjson";

/// Lowercased media type without parameters (`Application/JSON; charset=utf-8` → `application/json`).
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether the peer opted in to the enriched codec.
pub fn is_enriched(headers: &HeaderMap) -> bool {
    headers
        .get(ENRICHED_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// A decoded request body, before validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawBody {
    /// No body was sent.
    #[default]
    Empty,
    /// `application/json`, parsed.
    Json(Value),
    /// `text/plain`, decoded as UTF-8 (lossy).
    Text(String),
    /// Any other content type, untouched.
    Binary(Bytes),
}

impl RawBody {
    /// Decode `bytes` according to `content_type`.
    ///
    /// A JSON body that fails to parse is a validation failure.
    pub fn decode(content_type: Option<&str>, bytes: Bytes) -> Result<Self, ValidationError> {
        if bytes.is_empty() {
            return Ok(Self::Empty);
        }
        match content_type.map(essence).as_deref() {
            Some(APPLICATION_JSON) => serde_json::from_slice(&bytes)
                .map(Self::Json)
                .map_err(|e| ValidationError::message(format!("Invalid JSON body: {}", e))),
            Some(TEXT_PLAIN) => Ok(Self::Text(String::from_utf8_lossy(&bytes).into_owned())),
            _ => Ok(Self::Binary(bytes)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<Value> for RawBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Bytes> for RawBody {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Vec<u8>> for RawBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(bytes))
    }
}

/// A body about to be sent, with the content type it is sent under.
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingBody {
    Json(Value),
    Text(String),
    Binary(Bytes),
    /// Already url-encoded form pairs.
    Form(String),
}

impl OutgoingBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json(_) => APPLICATION_JSON,
            Self::Text(_) => TEXT_PLAIN,
            Self::Binary(_) => OCTET_STREAM,
            Self::Form(_) => FORM_URLENCODED,
        }
    }

    pub fn into_bytes(self) -> Result<Bytes, serde_json::Error> {
        match self {
            Self::Json(value) => serde_json::to_vec(&value).map(Bytes::from),
            Self::Text(text) | Self::Form(text) => Ok(Bytes::from(text)),
            Self::Binary(bytes) => Ok(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_essence() {
        assert_eq!(essence("Application/JSON; charset=utf-8"), "application/json");
        assert_eq!(essence("text/plain"), "text/plain");
    }

    #[test]
    fn test_decode_by_content_type() {
        let json = RawBody::decode(Some("application/json"), Bytes::from_static(b"{\"a\":1}"));
        assert_eq!(json.unwrap(), RawBody::Json(json!({"a": 1})));

        let text = RawBody::decode(Some("text/plain; charset=utf-8"), Bytes::from_static(b"hi"));
        assert_eq!(text.unwrap(), RawBody::Text("hi".into()));

        let binary = RawBody::decode(Some("image/png"), Bytes::from_static(&[1, 2]));
        assert_eq!(binary.unwrap(), RawBody::Binary(Bytes::from_static(&[1, 2])));

        let none = RawBody::decode(None, Bytes::from_static(&[1]));
        assert!(matches!(none.unwrap(), RawBody::Binary(_)));

        assert!(RawBody::decode(Some("application/json"), Bytes::new()).unwrap().is_empty());
        assert!(RawBody::decode(Some("application/json"), Bytes::from_static(b"{")).is_err());
    }

    #[test]
    fn test_enriched_header() {
        let mut headers = HeaderMap::new();
        assert!(!is_enriched(&headers));
        headers.insert(ENRICHED_HEADER, HeaderValue::from_static("true"));
        assert!(is_enriched(&headers));
        headers.insert(ENRICHED_HEADER, HeaderValue::from_static("false"));
        assert!(!is_enriched(&headers));
    }

    #[test]
    fn test_outgoing_content_types() {
        assert_eq!(OutgoingBody::Json(json!(1)).content_type(), APPLICATION_JSON);
        assert_eq!(OutgoingBody::Binary(Bytes::new()).content_type(), OCTET_STREAM);
        assert_eq!(OutgoingBody::Form("a=1".into()).content_type(), FORM_URLENCODED);
        assert_eq!(
            OutgoingBody::Json(json!({"name": "ok"})).into_bytes().unwrap(),
            Bytes::from_static(b"{\"name\":\"ok\"}")
        );
    }
}
