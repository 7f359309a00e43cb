//! Untyped values flowing through the engine.
//!
//! One value tree serves raw request arguments, declared defaults, parent
//! values, and resolver results. The `Display` impl renders the
//! schema-language literal form, which is what default values look like in
//! an exported schema document.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// The atomic value kinds a schema can declare.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum ScalarKind {
    /// 32-bit signed integer.
    Int,
    /// Double-precision float.
    Float,
    /// UTF-8 string.
    String,
    /// Boolean.
    Boolean,
    /// Opaque identifier, serialized as a string.
    Id,
}

impl ScalarKind {
    /// All built-in scalar kinds, in registration order.
    pub const ALL: [ScalarKind; 5] = [
        ScalarKind::Int,
        ScalarKind::Float,
        ScalarKind::String,
        ScalarKind::Boolean,
        ScalarKind::Id,
    ];

    /// The public type name of this scalar.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Int => "Int",
            ScalarKind::Float => "Float",
            ScalarKind::String => "String",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Id => "ID",
        }
    }

    /// Looks a built-in scalar up by its public type name.
    pub fn by_name(name: &str) -> Option<ScalarKind> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// A JSON-like value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent or explicit null.
    Null,
    /// Integer scalar.
    Int(i32),
    /// Float scalar.
    Float(f64),
    /// String or ID scalar.
    String(String),
    /// Boolean scalar.
    Boolean(bool),
    /// Homogeneous-by-declaration list of values.
    List(Vec<Value>),
    /// Keyed object value, iteration order is insertion order.
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Constructs a `null` value.
    pub fn null() -> Self {
        Self::Null
    }

    /// Constructs an object value from an iterator of entries.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Constructs a list value.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Does the value represent a `null`?
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Views the underlying int value, if present.
    pub fn as_int_value(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Views the underlying float value, if present.
    pub fn as_float_value(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Views the underlying string value, if present.
    pub fn as_string_value(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Views the underlying boolean value, if present.
    pub fn as_boolean_value(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Views the underlying list, if present.
    pub fn as_list_value(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Views the underlying object map, if present.
    pub fn as_object_value(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// A short human label for the shape of this value, used in errors.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt(f)?;
                }
                write!(f, "]")
            }
            Self::Object(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<T> From<Option<T>> for Value
where
    Value: From<T>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ScalarKind, Value};

    #[test]
    fn scalar_kinds_round_trip_by_name() {
        for kind in ScalarKind::ALL {
            assert_eq!(ScalarKind::by_name(kind.name()), Some(kind));
        }
        assert_eq!(ScalarKind::by_name("Number"), None);
    }

    #[test]
    fn renders_literal_form() {
        assert_eq!(Value::null().to_string(), "null");
        assert_eq!(Value::from(123).to_string(), "123");
        assert_eq!(Value::from(12.5).to_string(), "12.5");
        assert_eq!(Value::from("fo\"o").to_string(), "\"fo\\\"o\"");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(
            Value::list([1.into(), Value::Null]).to_string(),
            "[1, null]"
        );
        assert_eq!(
            Value::object([("a", Value::from(1)), ("b", Value::from("x"))]).to_string(),
            "{a: 1, b: \"x\"}"
        );
    }

    #[test]
    fn serializes_untagged() {
        let v = Value::object([("id", Value::from(7)), ("tags", Value::list(["a".into()]))]);
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"id":7,"tags":["a"]}"#
        );
    }
}
