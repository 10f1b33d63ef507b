//! Typed field values
//!
//! Entities expose their fields as `FieldValue`s. Ordering and identity
//! rules are explicit per kind rather than inferred at runtime.
//!
//! # Ordering
//!
//! - `compare` only orders values of the same kind (filters use it)
//! - `total_cmp` ranks kinds first: null < bool < number < text < date < list < object

mod entity;

pub use entity::{Entity, Record};

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single typed field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(DateTime<Utc>),
    List(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
}

/// Kind tag of a `FieldValue`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    Text,
    Date,
    List,
    Object,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Text => "text",
            ValueKind::Date => "date",
            ValueKind::List => "list",
            ValueKind::Object => "object",
        }
    }
}

impl FieldValue {
    /// Returns the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Null => ValueKind::Null,
            FieldValue::Bool(_) => ValueKind::Bool,
            FieldValue::Number(_) => ValueKind::Number,
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Date(_) => ValueKind::Date,
            FieldValue::List(_) => ValueKind::List,
            FieldValue::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for kinds that have a natural ordering
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            FieldValue::Number(_) | FieldValue::Text(_) | FieldValue::Date(_) | FieldValue::Bool(_)
        )
    }

    /// Orders two values of the same orderable kind.
    ///
    /// Returns `None` across kinds, for lists/objects, and for NaN.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.partial_cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total ordering across all kinds.
    ///
    /// Kinds are ranked first; within a kind the natural order applies.
    /// NaN sorts after every other number.
    pub fn total_cmp(&self, other: &FieldValue) -> Ordering {
        let kind_order = self.kind().cmp(&other.kind());
        if kind_order != Ordering::Equal {
            return kind_order;
        }

        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            },
            (FieldValue::List(a), FieldValue::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.total_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (FieldValue::Object(a), FieldValue::Object(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = ka.cmp(kb).then_with(|| va.total_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }

    /// Identity comparison used by set membership and equality filters.
    ///
    /// Unlike `PartialEq`, NaN equals NaN and `-0.0` equals `0.0`.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        ValueKey::new(self.clone()) == ValueKey::new(other.clone())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "\"{}\"", s),
            FieldValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            FieldValue::Object(_) => write!(f, "{}", Value::from(self.clone())),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => FieldValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        FieldValue::from(value.clone())
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Number(n) => {
                // Integral values render without a fraction
                if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
                    Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
            }
            FieldValue::Text(s) => Value::String(s),
            FieldValue::Date(d) => Value::String(d.to_rfc3339()),
            FieldValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            FieldValue::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<usize> for FieldValue {
    fn from(n: usize) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(d: DateTime<Utc>) -> Self {
        FieldValue::Date(d)
    }
}

impl<V: Into<FieldValue>> From<Option<V>> for FieldValue {
    fn from(v: Option<V>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Hashable identity wrapper around a `FieldValue`
#[derive(Debug, Clone)]
pub struct ValueKey(FieldValue);

impl ValueKey {
    pub fn new(value: FieldValue) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &FieldValue {
        &self.0
    }

    pub fn into_value(self) -> FieldValue {
        self.0
    }

    fn number_bits(n: f64) -> u64 {
        if n == 0.0 {
            0.0f64.to_bits()
        } else if n.is_nan() {
            f64::NAN.to_bits()
        } else {
            n.to_bits()
        }
    }

    fn hash_value<H: Hasher>(value: &FieldValue, state: &mut H) {
        value.kind().hash(state);
        match value {
            FieldValue::Null => {}
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Number(n) => Self::number_bits(*n).hash(state),
            FieldValue::Text(s) => s.hash(state),
            FieldValue::Date(d) => d.hash(state),
            FieldValue::List(items) => {
                items.len().hash(state);
                for item in items {
                    Self::hash_value(item, state);
                }
            }
            FieldValue::Object(map) => {
                map.len().hash(state);
                for (k, v) in map {
                    k.hash(state);
                    Self::hash_value(v, state);
                }
            }
        }
    }

    fn eq_value(a: &FieldValue, b: &FieldValue) -> bool {
        match (a, b) {
            (FieldValue::Number(x), FieldValue::Number(y)) => {
                Self::number_bits(*x) == Self::number_bits(*y)
            }
            (FieldValue::List(x), FieldValue::List(y)) => {
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| Self::eq_value(p, q))
            }
            (FieldValue::Object(x), FieldValue::Object(y)) => {
                x.len() == y.len()
                    && x.iter()
                        .zip(y.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && Self::eq_value(va, vb))
            }
            _ => a == b,
        }
    }
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        Self::eq_value(&self.0, &other.0)
    }
}

impl Eq for ValueKey {}

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Self::hash_value(&self.0, state);
    }
}
