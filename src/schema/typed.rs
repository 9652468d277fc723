//! Serde-backed schemas: any `Deserialize + Serialize` type validates itself.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;

use super::{Schema, ValidationError};

/// Validates by deserializing into `T` and serializing it back.
///
/// Defaults declared with `#[serde(default)]` are therefore applied and
/// unknown fields dropped, unless `T` says otherwise.
pub struct Typed<T> {
    _marker: PhantomData<fn() -> T>,
}

pub fn typed<T>() -> Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    Typed {
        _marker: PhantomData,
    }
}

impl<T> Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn round_trip(value: Value) -> Result<Value, ValidationError> {
        let parsed: T =
            serde_json::from_value(value).map_err(|e| ValidationError::message(e.to_string()))?;
        serde_json::to_value(parsed).map_err(|e| ValidationError::message(e.to_string()))
    }
}

impl<T> Schema for Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        Self::round_trip(value.clone())
    }

    fn parse_missing(&self) -> Result<Option<Value>, ValidationError> {
        // Lets `Option<_>` and unit-like types accept an absent value.
        Self::round_trip(Value::Null)
            .map(Some)
            .map_err(|_| ValidationError::message("Required"))
    }
}
