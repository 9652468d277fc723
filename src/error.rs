//! Error taxonomy for route construction and request dispatch.
//!
//! # Design Decisions
//! - Every dispatch failure maps to exactly one status code
//! - Handler faults are collapsed to a generic 500 so internals never leak
//! - Validation failures carry structured issues in a JSON body

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::routing::Method;
use crate::schema::ValidationError;

/// Errors raised while dispatching a request.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No trie path reaches a handler for the given path and method.
    #[error("Not found")]
    RouteNotFound { path: String },

    /// The method is unknown, has no routes, or the path only matches under other methods.
    #[error("Method not allowed")]
    MethodNotSupported { method: String, allowed: Vec<Method> },

    /// A schema rejected the body, params or search params.
    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),

    /// A guard or handler raised an explicit status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Application code failed in an unexpected way.
    #[error("Handler fault: {0}")]
    HandlerFault(String),
}

impl RouteError {
    /// Wrap an arbitrary failure from handler code.
    pub fn fault(err: impl std::fmt::Display) -> Self {
        Self::HandlerFault(err.to_string())
    }

    /// Status code this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotSupported { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::HandlerFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Create a status error that guards and handlers can return.
///
/// Codes outside the valid HTTP range are reported as 500.
pub fn status(code: u16, message: impl Into<String>) -> RouteError {
    RouteError::Rejected {
        status: StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        message: message.into(),
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::ValidationFailed(err) => {
                let body = serde_json::json!({
                    "error": err.to_string(),
                    "issues": err.issues(),
                });
                (status, axum::Json(body)).into_response()
            }
            Self::MethodNotSupported { ref allowed, .. } => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut response = (status, self.to_string()).into_response();
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                response
            }
            Self::HandlerFault(_) => (status, "Internal server error").into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}

/// Errors detected while compiling a route table.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    /// A catch-all segment was followed by more segments.
    #[error("catch-all segment must be last in `{template}`")]
    CatchAllNotLast { template: String },

    /// Two different parameter names compete for the same trie depth.
    #[error("conflicting parameter `{found}` in `{template}`, `{existing}` already registered at this depth")]
    ConflictingParams {
        template: String,
        existing: String,
        found: String,
    },

    /// A `:` or `...` segment without a name.
    #[error("empty parameter name in `{template}`")]
    EmptyParamName { template: String },
}
