//! Scalar schemas and the `optional` / `default` wrappers.

use serde_json::{Number, Value};

use super::{kind_of, Schema, ValidationError};

fn expected(what: &str, value: &Value) -> ValidationError {
    ValidationError::message(format!("Expected {}, received {}", what, kind_of(value)))
}

/// Accepts strings, optionally bounded by length in characters.
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    min: Option<usize>,
    max: Option<usize>,
}

pub fn string() -> StringSchema {
    StringSchema::default()
}

impl StringSchema {
    pub fn min(mut self, len: usize) -> Self {
        self.min = Some(len);
        self
    }

    pub fn max(mut self, len: usize) -> Self {
        self.max = Some(len);
        self
    }
}

impl Schema for StringSchema {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        let s = value.as_str().ok_or_else(|| expected("string", value))?;
        let len = s.chars().count();
        if let Some(min) = self.min {
            if len < min {
                return Err(ValidationError::message(format!(
                    "String must contain at least {} character(s)",
                    min
                )));
            }
        }
        if let Some(max) = self.max {
            if len > max {
                return Err(ValidationError::message(format!(
                    "String must contain at most {} character(s)",
                    max
                )));
            }
        }
        Ok(value.clone())
    }
}

/// Accepts numbers. With `coerce`, numeric strings are converted first.
#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    min: Option<f64>,
    max: Option<f64>,
    integer: bool,
    coerce: bool,
}

pub fn number() -> NumberSchema {
    NumberSchema::default()
}

impl NumberSchema {
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    fn read(&self, value: &Value) -> Result<f64, ValidationError> {
        match value {
            Value::Number(n) => n.as_f64().ok_or_else(|| expected("number", value)),
            Value::String(s) if self.coerce => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| ValidationError::message("Expected number, received nan")),
            Value::Bool(b) if self.coerce => Ok(if *b { 1.0 } else { 0.0 }),
            _ => Err(expected("number", value)),
        }
    }
}

/// Integral values come back as JSON integers so `"20"` coerces to `20`, not `20.0`.
fn to_number(n: f64) -> Option<Number> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(Number::from(n as i64))
    } else {
        Number::from_f64(n)
    }
}

impl Schema for NumberSchema {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        let n = self.read(value)?;
        if self.integer && n.fract() != 0.0 {
            return Err(ValidationError::message("Expected integer, received float"));
        }
        if let Some(min) = self.min {
            if n < min {
                return Err(ValidationError::message(format!(
                    "Number must be greater than or equal to {}",
                    min
                )));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(ValidationError::message(format!(
                    "Number must be less than or equal to {}",
                    max
                )));
            }
        }
        if !self.coerce {
            return Ok(value.clone());
        }
        to_number(n)
            .map(Value::Number)
            .ok_or_else(|| ValidationError::message("Expected number, received nan"))
    }
}

/// Accepts booleans. With `coerce`, `"true"`/`"1"` and `"false"`/`"0"`/`""` are converted.
#[derive(Debug, Clone, Default)]
pub struct BooleanSchema {
    coerce: bool,
}

pub fn boolean() -> BooleanSchema {
    BooleanSchema::default()
}

impl BooleanSchema {
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }
}

impl Schema for BooleanSchema {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) if self.coerce => match s.as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" | "" => Ok(Value::Bool(false)),
                _ => Err(expected("boolean", value)),
            },
            _ => Err(expected("boolean", value)),
        }
    }
}

/// Accepts anything that is present.
#[derive(Debug, Clone, Default)]
pub struct AnySchema;

pub fn any() -> AnySchema {
    AnySchema
}

impl Schema for AnySchema {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        Ok(value.clone())
    }
}

/// Missing values and `null` pass through untouched.
#[derive(Debug, Clone)]
pub struct Optional<S> {
    inner: S,
}

impl<S> Optional<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: Schema> Schema for Optional<S> {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        self.inner.parse(value)
    }

    fn parse_missing(&self) -> Result<Option<Value>, ValidationError> {
        Ok(None)
    }
}

/// Missing values are replaced by a default before anything else runs.
#[derive(Debug, Clone)]
pub struct WithDefault<S> {
    inner: S,
    default: Value,
}

impl<S> WithDefault<S> {
    pub(crate) fn new(inner: S, default: Value) -> Self {
        Self { inner, default }
    }
}

impl<S: Schema> Schema for WithDefault<S> {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        self.inner.parse(value)
    }

    fn parse_missing(&self) -> Result<Option<Value>, ValidationError> {
        Ok(Some(self.default.clone()))
    }
}
