//! Runtime values.
//!
//! Input values (literals and variables) are decoded into [`ConstValue`] by
//! the scalar codecs before they reach a resolver; resolvers return
//! `ConstValue`s that the executor encodes back to JSON.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use indexmap::IndexMap;
use std::fmt;
use timeql_core::Interner;
use timeql_syntax::Value;

/// An absolute point in time with its original UTC offset.
pub type Timestamp = DateTime<FixedOffset>;

/// A fully resolved value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConstValue {
    #[default]
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    Time(Timestamp),
    List(Vec<ConstValue>),
    Object(IndexMap<String, ConstValue>),
}

impl ConstValue {
    /// Converts an untyped JSON value, as found in request variables.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts a literal, substituting variables.
    ///
    /// A variable missing from `variables` reads as `null`, except as an
    /// object field, where the field is left out.
    pub fn from_ast(
        value: &Value<'_>,
        interner: &Interner,
        variables: &IndexMap<String, ConstValue>,
    ) -> Self {
        match value {
            Value::Variable(name) => variables
                .get(&interner.get(name.value))
                .cloned()
                .unwrap_or_default(),
            Value::Int(i, _) => Self::Int(*i),
            Value::Float(f, _) => Self::Float(*f),
            Value::String(s, _) => Self::String(s.to_string()),
            Value::Boolean(b, _) => Self::Boolean(*b),
            Value::Null(_) => Self::Null,
            Value::Enum(name) => Self::Enum(interner.get(name.value)),
            Value::List(items, _) => Self::List(
                items
                    .iter()
                    .map(|item| Self::from_ast(item, interner, variables))
                    .collect(),
            ),
            Value::Object(fields, _) => Self::Object(
                fields
                    .iter()
                    .filter(|(_, value)| match value {
                        Value::Variable(name) => {
                            variables.contains_key(&interner.get(name.value))
                        }
                        _ => true,
                    })
                    .map(|(name, value)| {
                        (
                            interner.get(name.value),
                            Self::from_ast(value, interner, variables),
                        )
                    })
                    .collect(),
            ),
        }
    }

    /// Creates an object value from key/value pairs.
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ConstValue)>,
    {
        Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string contents of a `String` or `Enum` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up a property of an object value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConstValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Returns a short description of the value's kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Enum(_) => "enum",
            Self::Time(_) => "time",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }
}

/// Formats the value as a GraphQL literal.
impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{}", serde_json::Value::String(s.clone())),
            Self::Enum(s) => f.write_str(s),
            Self::Time(t) => write!(
                f,
                "\"{}\"",
                t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for ConstValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for ConstValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for ConstValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ConstValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for ConstValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for ConstValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Timestamp> for ConstValue {
    fn from(value: Timestamp) -> Self {
        Self::Time(value)
    }
}

impl<T: Into<ConstValue>> From<Option<T>> for ConstValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<ConstValue>> From<Vec<T>> for ConstValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = ConstValue::from_json(json!({
            "from": "2019-01-01T00:00:00Z",
            "n": 3,
            "x": 1.5,
            "tags": [true, null]
        }));
        assert_eq!(
            value.get("from"),
            Some(&ConstValue::String("2019-01-01T00:00:00Z".into()))
        );
        assert_eq!(value.get("n"), Some(&ConstValue::Int(3)));
        assert_eq!(value.get("x"), Some(&ConstValue::Float(1.5)));
        assert_eq!(
            value.get("tags"),
            Some(&ConstValue::List(vec![
                ConstValue::Boolean(true),
                ConstValue::Null
            ]))
        );
    }

    #[test]
    fn test_display_as_literal() {
        let value = ConstValue::object([
            ("s", ConstValue::from("a\"b")),
            ("e", ConstValue::Enum("RED".into())),
            ("l", ConstValue::from(vec![1i64, 2])),
        ]);
        assert_eq!(value.to_string(), r#"{s: "a\"b", e: RED, l: [1, 2]}"#);
    }

    #[test]
    fn test_display_time() {
        let time = DateTime::parse_from_rfc3339("2019-01-01T09:00:00+09:00").unwrap();
        assert_eq!(
            ConstValue::Time(time).to_string(),
            "\"2019-01-01T09:00:00+09:00\""
        );
    }

    #[test]
    fn test_from_ast_substitutes_variables() {
        let interner = Interner::new();
        let result = timeql_syntax::parse(
            r#"query($a: Int, $b: Int) { f(x: [$a, $b], y: {p: $a, q: $b, r: ON}) }"#,
            &interner,
        );
        assert!(!result.diagnostics.has_errors());
        let op = result.document.operations().next().unwrap();
        let timeql_syntax::Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        let variables = IndexMap::from([("a".to_string(), ConstValue::Int(1))]);

        let x = ConstValue::from_ast(&field.arguments[0].value, &interner, &variables);
        assert_eq!(x, ConstValue::from(vec![ConstValue::Int(1), ConstValue::Null]));

        let y = ConstValue::from_ast(&field.arguments[1].value, &interner, &variables);
        assert_eq!(
            y,
            ConstValue::object([
                ("p", ConstValue::Int(1)),
                ("r", ConstValue::Enum("ON".into()))
            ])
        );
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(ConstValue::from(None::<String>), ConstValue::Null);
        assert_eq!(ConstValue::from(Some(7i32)), ConstValue::Int(7));
    }
}
