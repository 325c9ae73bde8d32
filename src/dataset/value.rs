//! Scalar values flowing through query execution
//!
//! Records expose borrowed [`FieldValue`]s; rows produced by the engine
//! own their [`Scalar`]s.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

use super::kind::ValueType;

/// Largest magnitude at which every integer is exactly representable as f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A field value borrowed from a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl<'a> FieldValue<'a> {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    pub fn to_scalar(&self) -> Scalar {
        match self {
            FieldValue::Number(n) => Scalar::Number(*n),
            FieldValue::Text(s) => Scalar::Text((*s).to_string()),
        }
    }
}

/// An owned row value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn value_type(&self) -> ValueType {
        match self {
            Scalar::Number(_) => ValueType::Number,
            Scalar::Text(_) => ValueType::Text,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            Scalar::Number(_) => None,
        }
    }

    /// Natural ordering: numbers numerically, strings lexically.
    ///
    /// Strings compare by UTF-8 bytes, which is Unicode code point order.
    /// This differs from UTF-16 code unit order only for characters outside
    /// the Basic Multilingual Plane.
    ///
    /// Mixed types never occur within one column of a validated query;
    /// numbers sort before strings if they do.
    pub fn compare(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::Number(a), Scalar::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            (Scalar::Number(_), Scalar::Text(_)) => Ordering::Less,
            (Scalar::Text(_), Scalar::Number(_)) => Ordering::Greater,
        }
    }

}

impl From<FieldValue<'_>> for Scalar {
    fn from(value: FieldValue<'_>) -> Self {
        value.to_scalar()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Whole numbers serialize as JSON integers (`85`, not `85.0`)
impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Scalar::Number(n) => serializer.serialize_f64(*n),
            Scalar::Text(s) => serializer.serialize_str(s),
        }
    }
}
