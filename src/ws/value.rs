//! Raw decoded wire values
//!
//! Both codec backends decode a frame into a [`WireValue`] before any
//! message-level interpretation happens. The shape mirrors what MessagePack
//! can carry on this protocol: scalars, arrays and string-keyed maps.

use std::collections::BTreeMap;

/// A decoded MessagePack value
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<WireValue>),
    Map(BTreeMap<String, WireValue>),
}

impl WireValue {
    /// A float value; NaN and infinities carry no position and decode as nil
    pub fn float(f: f64) -> Self {
        if f.is_finite() {
            Self::Float(f)
        } else {
            Self::Nil
        }
    }

    /// The value as a finite number, only if it was encoded as one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    /// Container nesting below this value; scalars and empty containers are 0
    pub fn depth(&self) -> usize {
        match self {
            Self::Array(items) => items.iter().map(|v| v.depth() + 1).max().unwrap_or(0),
            Self::Map(map) => map.values().map(|v| v.depth() + 1).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Loose numeric coercion used for identifiers.
    ///
    /// Numbers pass through and strings are parsed after trimming. Anything
    /// else, an empty string, or a NaN result yields `None`.
    pub fn coerce_number(&self) -> Option<f64> {
        let n = match self {
            Self::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
            other => other.as_number()?,
        };

        (!n.is_nan()).then_some(n)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Short description of the value's shape, for log messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }
}

impl From<serde_json::Value> for WireValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Nil,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    // Above i64::MAX; keep the magnitude as a float
                    Self::Float(u as f64)
                } else {
                    n.as_f64().map_or(Self::Nil, Self::float)
                }
            }
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_accepts_numeric_strings() {
        assert_eq!(WireValue::Str(" 42 ".into()).coerce_number(), Some(42.0));
        assert_eq!(WireValue::Int(7).coerce_number(), Some(7.0));
        assert_eq!(WireValue::Float(1.5).coerce_number(), Some(1.5));
    }

    #[test]
    fn coercion_rejects_garbage_and_nan() {
        assert_eq!(WireValue::Str("abc".into()).coerce_number(), None);
        assert_eq!(WireValue::Str("".into()).coerce_number(), None);
        assert_eq!(WireValue::Str("NaN".into()).coerce_number(), None);
        assert_eq!(WireValue::Float(f64::NAN).coerce_number(), None);
        assert_eq!(WireValue::Bool(true).coerce_number(), None);
        assert_eq!(WireValue::Nil.coerce_number(), None);
    }

    #[test]
    fn as_number_is_strict() {
        assert_eq!(WireValue::Str("5".into()).as_number(), None);
        assert_eq!(WireValue::Int(-3).as_number(), Some(-3.0));
    }

    #[test]
    fn non_finite_floats_are_not_numbers() {
        assert_eq!(WireValue::float(f64::NAN), WireValue::Nil);
        assert_eq!(WireValue::float(f64::NEG_INFINITY), WireValue::Nil);
        assert_eq!(WireValue::float(2.5), WireValue::Float(2.5));
        assert_eq!(WireValue::Float(f64::INFINITY).as_number(), None);
        assert_eq!(WireValue::Float(f64::NAN).as_number(), None);
    }

    #[test]
    fn depth_counts_nested_containers() {
        assert_eq!(WireValue::Int(1).depth(), 0);
        assert_eq!(WireValue::Array(vec![]).depth(), 0);
        let nested = WireValue::Array(vec![WireValue::Int(1), WireValue::Array(vec![WireValue::Nil])]);
        assert_eq!(nested.depth(), 2);
        let mut map = BTreeMap::new();
        map.insert("pad".to_string(), nested);
        assert_eq!(WireValue::Map(map).depth(), 3);
    }

    #[test]
    fn converts_from_json() {
        let json = serde_json::json!(["Init", 3, 1.25, null, {"k": "v"}]);
        let value = WireValue::from(json);
        let mut map = BTreeMap::new();
        map.insert("k".to_string(), WireValue::Str("v".into()));
        assert_eq!(
            value,
            WireValue::Array(vec![
                WireValue::Str("Init".into()),
                WireValue::Int(3),
                WireValue::Float(1.25),
                WireValue::Nil,
                WireValue::Map(map),
            ])
        );
    }
}
