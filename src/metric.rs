//! Metric representation consumed by the syslog mapper.
//!
//! A `Metric` captures a measurement name, its string tags, a set of typed
//! fields and the instant the measurement was taken. Mapping only ever borrows
//! a metric; it is never mutated after construction.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Typed value carried by a metric field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Unsigned(u64),
    Integer(i64),
    Float(f64),
    String(String),
}

impl FieldValue {
    /// Interpret the value as a non-negative integer.
    ///
    /// Strings are accepted when they hold a base-10 integer. Floats are
    /// accepted only when they carry no fractional part.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Unsigned(v) => Some(*v),
            FieldValue::Integer(v) => u64::try_from(*v).ok(),
            FieldValue::Float(v) if v.fract() == 0.0 && *v >= 0.0 && *v <= u64::MAX as f64 => {
                Some(*v as u64)
            }
            FieldValue::Float(_) => None,
            FieldValue::String(s) => s.trim().parse().ok(),
        }
    }
}

/// Renders integers in base 10, floats with the shortest text that round
/// trips, and strings verbatim.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(v) => write!(f, "{v}"),
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::String(s) => f.write_str(s),
        }
    }
}

macro_rules! field_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::$variant(value.into())
                }
            }
        )*
    };
}

field_value_from!(
    u8 => Unsigned,
    u16 => Unsigned,
    u32 => Unsigned,
    u64 => Unsigned,
    i8 => Integer,
    i16 => Integer,
    i32 => Integer,
    i64 => Integer,
    f64 => Float,
    String => String,
    &str => String,
);

/// Goes through the `f32` shortest representation so `1.2_f32` renders as
/// `1.2` rather than its widened binary value.
impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value.to_string().parse().unwrap_or(f64::from(value)))
    }
}

/// A single telemetry measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    name: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: DateTime<Utc>,
}

impl Metric {
    /// Construct a metric with no tags or fields.
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    /// Attach a tag, replacing any previous value for `key`.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Attach a field, replacing any previous value for `key`.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
