//! Enriched JSON: a tagged envelope that preserves types plain JSON cannot.
//!
//! ```text
//! {"json": {"at": "2024-01-01T00:00:00.000Z"},
//!  "meta": {"values": {"at": ["Date"], "gone": ["undefined"]}}}
//! ```
//!
//! Annotation keys are dotted paths into `json`; a literal `.` or `\` inside an
//! object key is escaped with `\`. An annotation on the root value itself is
//! written as `[tag]`, or `[tag, {children}]` when nested values are tagged too.
//! As with `JSON.stringify`, `undefined` object members are left out of `json`
//! and only appear as annotations; an `undefined` root has no `json` at all.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;

const DATE: &str = "Date";
const UNDEFINED: &str = "undefined";
const BIGINT: &str = "bigint";
const SET: &str = "set";
const MAP: &str = "map";

/// A value that can carry dates, `undefined`, big integers, sets and maps.
#[derive(Debug, Clone, PartialEq)]
pub enum RichValue {
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    BigInt(i128),
    Array(Vec<RichValue>),
    Object(BTreeMap<String, RichValue>),
    Set(Vec<RichValue>),
    Map(Vec<(RichValue, RichValue)>),
}

/// Errors decoding an enriched envelope.
#[derive(Debug, Error)]
pub enum EnrichedError {
    #[error("enriched payload has no `json` field")]
    MissingJson,

    #[error("malformed annotation: {0}")]
    Annotation(String),

    #[error("unknown type tag `{0}`")]
    UnknownTag(String),

    #[error("annotation path `{0}` does not exist in payload")]
    BadPath(String),

    #[error("cannot apply `{tag}` to value at `{path}`")]
    Mismatch { tag: String, path: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn escape_key(key: &str) -> String {
    key.replace('\\', "\\\\").replace('.', "\\.")
}

fn join_path(path: &[String]) -> String {
    path.iter().map(|s| escape_key(s)).collect::<Vec<_>>().join(".")
}

fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

impl RichValue {
    /// Build an object from key/value pairs.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RichValue>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Field lookup on objects.
    pub fn get(&self, key: &str) -> Option<&RichValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Plain JSON rendering: dates as RFC 3339, `undefined` dropped from
    /// objects (`null` elsewhere), sets as arrays, maps as `[key, value]` pairs,
    /// big integers as strings.
    pub fn to_plain(&self) -> Value {
        match self {
            Self::Undefined | Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Date(d) => Value::String(format_date(d)),
            Self::BigInt(i) => Value::String(i.to_string()),
            Self::Array(items) | Self::Set(items) => {
                Value::Array(items.iter().map(Self::to_plain).collect())
            }
            Self::Object(map) => Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_plain()))
                    .collect(),
            ),
            Self::Map(entries) => Value::Array(
                entries
                    .iter()
                    .map(|(k, v)| Value::Array(vec![k.to_plain(), v.to_plain()]))
                    .collect(),
            ),
        }
    }

    /// Deserialize the plain rendering into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_plain())
    }

    /// Encode into the enriched envelope.
    pub fn encode(&self) -> Value {
        let mut tags = Vec::new();
        let json = self.walk(&mut Vec::new(), &mut tags);

        let mut root = None;
        let mut children = Map::new();
        for (path, tag) in tags {
            if path.is_empty() {
                root = Some(tag);
            } else {
                children.insert(join_path(&path), json!([tag]));
            }
        }

        let values = match root {
            Some(tag) if children.is_empty() => json!([tag]),
            Some(tag) => json!([tag, children]),
            None if children.is_empty() => return json!({ "json": json }),
            None => Value::Object(children),
        };
        if self.is_undefined() {
            return json!({ "meta": { "values": values } });
        }
        json!({ "json": json, "meta": { "values": values } })
    }

    pub fn to_enriched_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.encode())
    }

    fn walk(&self, path: &mut Vec<String>, tags: &mut Vec<(Vec<String>, &'static str)>) -> Value {
        match self {
            Self::Undefined => {
                tags.push((path.clone(), UNDEFINED));
                Value::Null
            }
            Self::Date(d) => {
                tags.push((path.clone(), DATE));
                Value::String(format_date(d))
            }
            Self::BigInt(i) => {
                tags.push((path.clone(), BIGINT));
                Value::String(i.to_string())
            }
            Self::Array(items) => Value::Array(walk_items(items, path, tags)),
            Self::Set(items) => {
                tags.push((path.clone(), SET));
                Value::Array(walk_items(items, path, tags))
            }
            Self::Object(map) => {
                let mut out = Map::new();
                for (key, value) in map {
                    path.push(key.clone());
                    let encoded = value.walk(path, tags);
                    if !value.is_undefined() {
                        out.insert(key.clone(), encoded);
                    }
                    path.pop();
                }
                Value::Object(out)
            }
            Self::Map(entries) => {
                tags.push((path.clone(), MAP));
                let mut out = Vec::with_capacity(entries.len());
                for (i, (key, value)) in entries.iter().enumerate() {
                    path.push(i.to_string());
                    path.push("0".to_string());
                    let k = key.walk(path, tags);
                    path.pop();
                    path.push("1".to_string());
                    let v = value.walk(path, tags);
                    path.pop();
                    path.pop();
                    out.push(Value::Array(vec![k, v]));
                }
                Value::Array(out)
            }
            Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_) => self.to_plain(),
        }
    }

    /// Decode an enriched envelope.
    pub fn decode(envelope: Value) -> Result<Self, EnrichedError> {
        let Value::Object(mut envelope) = envelope else {
            return Err(EnrichedError::MissingJson);
        };
        let json = envelope.remove("json");
        let values = envelope
            .remove("meta")
            .and_then(|mut meta| meta.get_mut("values").map(Value::take));

        let Some(json) = json else {
            return match values {
                Some(Value::Array(root)) if root.len() == 1 && root[0] == UNDEFINED => {
                    Ok(Self::Undefined)
                }
                _ => Err(EnrichedError::MissingJson),
            };
        };
        let mut value = Self::from(json);
        let Some(values) = values else {
            return Ok(value);
        };

        let mut annotations = Vec::new();
        collect_annotations(&mut Vec::new(), &values, &mut annotations)?;
        // Innermost first, so containers are still plain arrays while their children are rewritten.
        annotations.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        for (path, tag) in annotations {
            if tag == UNDEFINED && value.insert_missing(&path) {
                continue;
            }
            let node = value
                .at_mut(&path)
                .ok_or_else(|| EnrichedError::BadPath(join_path(&path)))?;
            node.apply(&tag, &path)?;
        }
        Ok(value)
    }

    pub fn from_enriched_str(s: &str) -> Result<Self, EnrichedError> {
        Self::decode(serde_json::from_str(s)?)
    }

    /// Put `Undefined` at an object member that `json` left out.
    fn insert_missing(&mut self, path: &[String]) -> bool {
        let Some((key, parent)) = path.split_last() else {
            return false;
        };
        match self.at_mut(parent) {
            Some(Self::Object(map)) if !map.contains_key(key) => {
                map.insert(key.clone(), Self::Undefined);
                true
            }
            _ => false,
        }
    }

    fn at_mut(&mut self, path: &[String]) -> Option<&mut RichValue> {
        let mut node = self;
        for segment in path {
            node = match node {
                Self::Array(items) | Self::Set(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
                Self::Object(map) => map.get_mut(segment)?,
                _ => return None,
            };
        }
        Some(node)
    }

    fn apply(&mut self, tag: &str, path: &[String]) -> Result<(), EnrichedError> {
        let mismatch = || EnrichedError::Mismatch {
            tag: tag.to_string(),
            path: join_path(path),
        };
        let current = std::mem::replace(self, Self::Null);
        *self = match (tag, current) {
            (DATE, Self::String(s)) => DateTime::parse_from_rfc3339(&s)
                .map(|d| Self::Date(d.with_timezone(&Utc)))
                .map_err(|_| mismatch())?,
            (UNDEFINED, _) => Self::Undefined,
            (BIGINT, Self::String(s)) => Self::BigInt(s.parse().map_err(|_| mismatch())?),
            (SET, Self::Array(items)) => Self::Set(items),
            (MAP, Self::Array(items)) => Self::Map(
                items
                    .into_iter()
                    .map(|entry| match entry {
                        Self::Array(mut pair) if pair.len() == 2 => {
                            let value = pair.pop().unwrap_or(Self::Null);
                            let key = pair.pop().unwrap_or(Self::Null);
                            Ok((key, value))
                        }
                        _ => Err(mismatch()),
                    })
                    .collect::<Result<_, _>>()?,
            ),
            (DATE | BIGINT | SET | MAP, _) => return Err(mismatch()),
            (other, _) => return Err(EnrichedError::UnknownTag(other.to_string())),
        };
        Ok(())
    }
}

fn walk_items(
    items: &[RichValue],
    path: &mut Vec<String>,
    tags: &mut Vec<(Vec<String>, &'static str)>,
) -> Vec<Value> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            path.push(i.to_string());
            let value = item.walk(path, tags);
            path.pop();
            value
        })
        .collect()
}

fn collect_annotations(
    prefix: &mut Vec<String>,
    node: &Value,
    out: &mut Vec<(Vec<String>, String)>,
) -> Result<(), EnrichedError> {
    match node {
        Value::Array(items) => {
            let tag = items
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| EnrichedError::Annotation(node.to_string()))?;
            out.push((prefix.clone(), tag.to_string()));
            match items.get(1) {
                None => Ok(()),
                Some(Value::Object(children)) => collect_children(prefix, children, out),
                Some(other) => Err(EnrichedError::Annotation(other.to_string())),
            }
        }
        Value::Object(children) => collect_children(prefix, children, out),
        other => Err(EnrichedError::Annotation(other.to_string())),
    }
}

fn collect_children(
    prefix: &mut Vec<String>,
    children: &Map<String, Value>,
    out: &mut Vec<(Vec<String>, String)>,
) -> Result<(), EnrichedError> {
    for (key, child) in children {
        let depth = prefix.len();
        prefix.extend(split_path(key));
        collect_annotations(prefix, child, out)?;
        prefix.truncate(depth);
    }
    Ok(())
}

impl From<Value> for RichValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<bool> for RichValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for RichValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for RichValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i32> for RichValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for RichValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for RichValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

/// Non-finite floats become `null`, as in JSON.
impl From<f64> for RichValue {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Self::Number).unwrap_or(Self::Null)
    }
}

impl From<DateTime<Utc>> for RichValue {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Vec<RichValue>> for RichValue {
    fn from(items: Vec<RichValue>) -> Self {
        Self::Array(items)
    }
}

impl<T: Into<RichValue>> From<Option<T>> for RichValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Undefined)
    }
}
