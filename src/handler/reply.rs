//! Handler results and their wire serialization.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::codec::{RichValue, APPLICATION_JSON, ENRICHED_HEADER, OCTET_STREAM};

/// What a handler produced.
#[derive(Debug)]
pub enum Reply {
    /// A value, serialized as JSON (or enriched JSON when requested).
    Value(RichValue),
    /// Binary payload, sent as `application/octet-stream`.
    Binary(Bytes),
    /// A ready-made response, passed through unchanged.
    Response(Response),
}

impl Reply {
    pub fn as_value(&self) -> Option<&RichValue> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<RichValue> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Serialize for the wire. `enriched` selects the tagged codec for values.
    pub fn into_response(self, enriched: bool) -> Response {
        match self {
            Self::Response(response) => response,
            Self::Binary(bytes) => {
                ([(header::CONTENT_TYPE, OCTET_STREAM)], Body::from(bytes)).into_response()
            }
            Self::Value(value) => {
                let encoded = if enriched {
                    value.to_enriched_string()
                } else {
                    serde_json::to_string(&value.to_plain())
                };
                let text = match encoded {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode reply");
                        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                            .into_response();
                    }
                };
                let mut response =
                    ([(header::CONTENT_TYPE, APPLICATION_JSON)], text).into_response();
                if enriched {
                    response
                        .headers_mut()
                        .insert(ENRICHED_HEADER, HeaderValue::from_static("true"));
                }
                response
            }
        }
    }
}

/// Conversion from a handler's return type into a [`Reply`].
pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for RichValue {
    fn into_reply(self) -> Reply {
        Reply::Value(self)
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> Reply {
        Reply::Value(self.into())
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> Reply {
        Reply::Response(self)
    }
}

impl IntoReply for Bytes {
    fn into_reply(self) -> Reply {
        Reply::Binary(self)
    }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Reply {
        Reply::Binary(Bytes::from(self))
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Reply {
        Reply::Value(RichValue::Undefined)
    }
}

macro_rules! value_reply {
    ($($ty:ty),*) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> Reply {
                    Reply::Value(RichValue::from(self))
                }
            }
        )*
    };
}

value_reply!(String, &'static str, bool, i32, i64, u64, f64, DateTime<Utc>);

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Reply {
        match self {
            Some(inner) => inner.into_reply(),
            None => Reply::Value(RichValue::Undefined),
        }
    }
}

/// Reply with any serializable type.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Reply {
        match serde_json::to_value(&self.0) {
            Ok(value) => Reply::Value(value.into()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize reply");
                Reply::Response(
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response(),
                )
            }
        }
    }
}
