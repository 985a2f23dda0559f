//! Typed record attributes and the rules for comparing a written record with
//! what the service returns.
//!
//! The service normalizes some values on the way in:
//! - strings spelling `true`/`false` (any case) come back as booleans,
//!   but inside a list only when every element does;
//! - dates and date-times come back as ISO-8601 strings;
//! - a list mixing scalar kinds comes back with every element as a string;
//! - numbers may change representation (`1` vs `1.0`).
//!
//! [`AttributeValue::expected`] applies those rules so the comparison in
//! [`compare_record`] is a plain structural equality.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeMap;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A typed attribute value as written by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Number(Number),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    List(Vec<AttributeValue>),
    /// Arbitrary nested JSON, stored verbatim.
    Json(Value),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarKind {
    String,
    Number,
    Boolean,
    Date,
    DateTime,
}

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn number(value: impl Into<Number>) -> Self {
        Self::Number(value.into())
    }

    /// Floating-point number; non-finite values become `Null`.
    pub fn float(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }

    /// JSON sent to the service.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            Self::DateTime(dt) => Value::String(dt.format(DATE_TIME_FORMAT).to_string()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_wire).collect()),
            Self::Json(v) => v.clone(),
            Self::Null => Value::Null,
        }
    }

    /// JSON the service is expected to return for this value.
    pub fn expected(&self) -> Value {
        match self {
            Self::String(s) => match parse_bool(s) {
                Some(b) => Value::Bool(b),
                None => Value::String(s.clone()),
            },
            Self::List(items) if is_mixed(items) || !all_booleans_or_none(items) => {
                Value::Array(items.iter().map(Self::stringified).collect())
            }
            Self::List(items) => Value::Array(items.iter().map(Self::expected).collect()),
            other => other.to_wire(),
        }
    }

    fn stringified(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::String(s) => Value::String(s.clone()),
            other => match other.to_wire() {
                Value::String(s) => Value::String(s),
                wire => Value::String(wire.to_string()),
            },
        }
    }

    fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::String(_) => Some(ScalarKind::String),
            Self::Number(_) => Some(ScalarKind::Number),
            Self::Boolean(_) => Some(ScalarKind::Boolean),
            Self::Date(_) => Some(ScalarKind::Date),
            Self::DateTime(_) => Some(ScalarKind::DateTime),
            Self::List(_) | Self::Json(_) | Self::Null => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<NaiveDate> for AttributeValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for AttributeValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// String lists coerce to booleans only when every string spells one.
/// Lists that hold no strings pass.
fn all_booleans_or_none(items: &[AttributeValue]) -> bool {
    let mut strings = items
        .iter()
        .filter_map(|item| match item {
            AttributeValue::String(s) => Some(s),
            _ => None,
        })
        .peekable();
    strings.peek().is_none() || strings.all(|s| parse_bool(s).is_some())
}

/// A list is mixed when its non-null elements are not all one scalar kind.
fn is_mixed(items: &[AttributeValue]) -> bool {
    let mut kinds = items
        .iter()
        .filter(|item| !matches!(item, AttributeValue::Null))
        .map(AttributeValue::scalar_kind);
    match kinds.next() {
        None => false,
        Some(None) => true,
        Some(Some(first)) => kinds.any(|kind| kind != Some(first)),
    }
}

/// A record written to the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Record id (primary key value).
    pub id: String,
    /// Record type (table name).
    pub record_type: String,
    /// Attributes by name.
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Record {
    pub fn new(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            record_type: record_type.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds or replaces an attribute.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Body for a record PUT: `{"attributes": {...}}`.
    pub fn request_body(&self) -> Value {
        let attributes: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.to_wire()))
            .collect();
        json!({ "attributes": attributes })
    }

    /// Probe record covering every normalization rule.
    pub fn probe(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        let date = NaiveDate::from_ymd_opt(2023, 8, 3).unwrap_or_default();
        let date_time = date.and_hms_opt(20, 10, 59).unwrap_or_default();
        Self::new(record_type, id)
            .with("text", "hello world")
            .with("count", 42i64)
            .with("ratio", AttributeValue::float(0.25))
            .with("flag", true)
            .with("flag_as_text", "False")
            .with(
                "numbers",
                AttributeValue::List(vec![1i64.into(), 2i64.into(), 3i64.into()]),
            )
            .with(
                "mixed",
                AttributeValue::List(vec!["a".into(), 1i64.into(), true.into()]),
            )
            .with(
                "nested",
                AttributeValue::Json(json!({ "key": ["value", { "deep": 1 }] })),
            )
            .with("day", date)
            .with("moment", date_time)
    }
}

/// One attribute that did not come back as expected.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMismatch {
    /// Attribute name.
    pub attribute: String,
    /// Normalized expectation.
    pub expected: Value,
    /// What came back, or None if the attribute was missing.
    pub actual: Option<Value>,
}

impl std::fmt::Display for AttributeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.actual {
            Some(actual) => write!(
                f,
                "{}: expected {} got {}",
                self.attribute, self.expected, actual
            ),
            None => write!(f, "{}: expected {} but it is missing", self.attribute, self.expected),
        }
    }
}

/// Compares the `attributes` of a retrieved record with what was written.
///
/// Attributes present only on the retrieved side are ignored.
pub fn compare_record(written: &Record, retrieved: &Value) -> Vec<AttributeMismatch> {
    let empty = Map::new();
    let actual = retrieved
        .get("attributes")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    written
        .attributes
        .iter()
        .filter_map(|(name, value)| {
            let expected = value.expected();
            match actual.get(name) {
                Some(got) if values_match(&expected, got) => None,
                got => Some(AttributeMismatch {
                    attribute: name.clone(),
                    expected,
                    actual: got.cloned(),
                }),
            }
        })
        .collect()
}

/// Structural equality where numbers compare by value.
pub fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => a == b || a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_match(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_match(x, y)))
        }
        (a, b) => a == b,
    }
}
