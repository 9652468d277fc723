//! Schema adapter subsystem.
//!
//! # Data Flow
//! ```text
//! raw value (JSON body, captured path segment, query value)
//!     → Schema::parse (coerce, check bounds, apply defaults)
//!     → validated serde_json::Value
//!     → Context::{body, params, search}
//! ```
//!
//! # Design Decisions
//! - The dispatcher only ever calls `parse`; any type can be a schema
//! - Missing values are distinct from `null` so `optional` and `default` work
//! - Issues are collected, not short-circuited, within one object

pub mod object;
pub mod primitives;
pub mod typed;

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use object::{fields, Fields};
pub use primitives::{any, boolean, number, string, Optional, WithDefault};
pub use typed::{typed, Typed};

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// Dotted path to the offending value, empty for the value itself.
    pub path: String,
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Raised when a schema rejects a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// An error with one issue at the root of the value.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(vec![Issue::new("", message)])
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Re-root every issue under `prefix` (e.g. `body`, `params.id`).
    pub fn prefixed(self, prefix: &str) -> Self {
        let issues = self
            .issues
            .into_iter()
            .map(|issue| Issue {
                path: join_path(prefix, &issue.path),
                message: issue.message,
            })
            .collect();
        Self { issues }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (i, issue) in self.issues.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{}{}", sep, issue)?;
        }
        Ok(())
    }
}

pub(crate) fn join_path(prefix: &str, path: &str) -> String {
    match (prefix.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{}.{}", prefix, path),
    }
}

/// Validates and coerces a value.
pub trait Schema: Send + Sync + 'static {
    /// Parse a present value.
    fn parse(&self, value: &Value) -> Result<Value, ValidationError>;

    /// Parse an absent value. `Ok(None)` leaves it absent.
    fn parse_missing(&self) -> Result<Option<Value>, ValidationError> {
        Err(ValidationError::message("Required"))
    }
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        (**self).parse(value)
    }

    fn parse_missing(&self) -> Result<Option<Value>, ValidationError> {
        (**self).parse_missing()
    }
}

impl<S: Schema + ?Sized> Schema for Box<S> {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        (**self).parse(value)
    }

    fn parse_missing(&self) -> Result<Option<Value>, ValidationError> {
        (**self).parse_missing()
    }
}

/// Shared, type-erased schema.
pub type BoxSchema = Arc<dyn Schema>;

/// Combinators available on every schema.
pub trait SchemaExt: Schema + Sized {
    /// Accept a missing value or `null`.
    fn optional(self) -> Optional<Self> {
        Optional::new(self)
    }

    /// Substitute `value` when missing.
    fn default(self, value: impl Into<Value>) -> WithDefault<Self> {
        WithDefault::new(self, value.into())
    }

    fn boxed(self) -> BoxSchema {
        Arc::new(self)
    }
}

impl<S: Schema> SchemaExt for S {}

/// Human name of a JSON value's type, used in messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
