//! Scalar codecs.
//!
//! A codec decodes input values (literals or variables) into the internal
//! representation and encodes resolver output for the response. The built-in
//! GraphQL scalars are always registered; custom scalars such as `Time` are
//! registered by the application.

use crate::value::{ConstValue, Timestamp};
use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// A value could not be decoded or encoded by a scalar codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScalarError {
    pub message: String,
}

impl ScalarError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The standard "cannot represent" error.
    pub fn cannot_represent(scalar: &str, value: &ConstValue) -> Self {
        Self::new(format!("{scalar} cannot represent value: {value}"))
    }
}

/// Converts between wire values and internal values for one scalar type.
pub trait ScalarCodec: Send + Sync {
    /// The scalar's name as declared in the schema.
    fn name(&self) -> &str;

    /// A description exposed through introspection.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Decodes an input value.
    fn decode(&self, value: &ConstValue) -> Result<ConstValue, ScalarError>;

    /// Encodes an output value for the response.
    fn encode(&self, value: &ConstValue) -> Result<serde_json::Value, ScalarError>;
}

/// The custom `Time` scalar: RFC 3339 strings on the wire.
///
/// Decoding also accepts Unix seconds as an integer or a float (truncated).
/// The original offset is kept; UTC is written with a `Z` suffix and
/// fractional seconds only appear when non-zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeScalar;

impl TimeScalar {
    pub const NAME: &'static str = "Time";

    /// Parses an RFC 3339 timestamp.
    pub fn parse(input: &str) -> Result<Timestamp, ScalarError> {
        DateTime::parse_from_rfc3339(input).map_err(|err| {
            ScalarError::new(format!(
                "Time cannot represent value: {}: {err}",
                serde_json::Value::String(input.to_string())
            ))
        })
    }

    /// Formats a timestamp as RFC 3339.
    #[must_use]
    pub fn format(time: &Timestamp) -> String {
        time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Reads Unix seconds as a UTC instant. Only years RFC 3339 can
    /// write (0000 to 9999) are accepted.
    fn from_unix_seconds(seconds: i64, original: &ConstValue) -> Result<Timestamp, ScalarError> {
        Utc.timestamp_opt(seconds, 0)
            .single()
            .filter(|t| (0..=9999).contains(&t.year()))
            .map(|t| t.fixed_offset())
            .ok_or_else(|| ScalarError::cannot_represent(Self::NAME, original))
    }
}

impl ScalarCodec for TimeScalar {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> Option<&str> {
        Some("An RFC 3339 timestamp with its original UTC offset.")
    }

    fn decode(&self, value: &ConstValue) -> Result<ConstValue, ScalarError> {
        let time = match value {
            ConstValue::Time(time) => *time,
            ConstValue::String(s) => Self::parse(s)?,
            ConstValue::Int(seconds) => Self::from_unix_seconds(*seconds, value)?,
            ConstValue::Float(seconds) if seconds.is_finite() => {
                Self::from_unix_seconds(seconds.trunc() as i64, value)?
            }
            other => return Err(ScalarError::cannot_represent(Self::NAME, other)),
        };
        Ok(ConstValue::Time(time))
    }

    fn encode(&self, value: &ConstValue) -> Result<serde_json::Value, ScalarError> {
        let time = match value {
            ConstValue::Time(time) => *time,
            ConstValue::String(s) => Self::parse(s)?,
            other => return Err(ScalarError::cannot_represent(Self::NAME, other)),
        };
        Ok(serde_json::Value::String(Self::format(&time)))
    }
}

/// `Int`: signed 32-bit integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntScalar;

impl IntScalar {
    fn coerce(value: &ConstValue) -> Result<i64, ScalarError> {
        let int = match value {
            ConstValue::Int(i) => Some(*i),
            ConstValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        };
        int.filter(|i| i32::try_from(*i).is_ok()).ok_or_else(|| {
            ScalarError::new(format!(
                "Int cannot represent non 32-bit signed integer value: {value}"
            ))
        })
    }
}

impl ScalarCodec for IntScalar {
    fn name(&self) -> &str {
        "Int"
    }

    fn description(&self) -> Option<&str> {
        Some("The `Int` scalar type represents non-fractional signed whole numeric values.")
    }

    fn decode(&self, value: &ConstValue) -> Result<ConstValue, ScalarError> {
        Self::coerce(value).map(ConstValue::Int)
    }

    fn encode(&self, value: &ConstValue) -> Result<serde_json::Value, ScalarError> {
        Self::coerce(value).map(serde_json::Value::from)
    }
}

/// `Float`: double-precision numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatScalar;

impl FloatScalar {
    fn coerce(value: &ConstValue) -> Result<f64, ScalarError> {
        match value {
            ConstValue::Int(i) => Ok(*i as f64),
            ConstValue::Float(f) if f.is_finite() => Ok(*f),
            other => Err(ScalarError::new(format!(
                "Float cannot represent non numeric value: {other}"
            ))),
        }
    }
}

impl ScalarCodec for FloatScalar {
    fn name(&self) -> &str {
        "Float"
    }

    fn description(&self) -> Option<&str> {
        Some("The `Float` scalar type represents signed double-precision fractional values.")
    }

    fn decode(&self, value: &ConstValue) -> Result<ConstValue, ScalarError> {
        Self::coerce(value).map(ConstValue::Float)
    }

    fn encode(&self, value: &ConstValue) -> Result<serde_json::Value, ScalarError> {
        let float = Self::coerce(value)?;
        serde_json::Number::from_f64(float)
            .map(serde_json::Value::Number)
            .ok_or_else(|| ScalarError::cannot_represent("Float", value))
    }
}

/// `String`: UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringScalar;

impl ScalarCodec for StringScalar {
    fn name(&self) -> &str {
        "String"
    }

    fn description(&self) -> Option<&str> {
        Some("The `String` scalar type represents textual data.")
    }

    fn decode(&self, value: &ConstValue) -> Result<ConstValue, ScalarError> {
        match value {
            ConstValue::String(s) => Ok(ConstValue::String(s.clone())),
            other => Err(ScalarError::new(format!(
                "String cannot represent a non string value: {other}"
            ))),
        }
    }

    fn encode(&self, value: &ConstValue) -> Result<serde_json::Value, ScalarError> {
        match value {
            ConstValue::String(s) | ConstValue::Enum(s) => Ok(serde_json::Value::String(s.clone())),
            ConstValue::Int(i) => Ok(serde_json::Value::String(i.to_string())),
            ConstValue::Float(f) => Ok(serde_json::Value::String(f.to_string())),
            ConstValue::Boolean(b) => Ok(serde_json::Value::String(b.to_string())),
            ConstValue::Time(t) => Ok(serde_json::Value::String(TimeScalar::format(t))),
            other => Err(ScalarError::cannot_represent("String", other)),
        }
    }
}

/// `Boolean`: `true` or `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanScalar;

impl ScalarCodec for BooleanScalar {
    fn name(&self) -> &str {
        "Boolean"
    }

    fn description(&self) -> Option<&str> {
        Some("The `Boolean` scalar type represents `true` or `false`.")
    }

    fn decode(&self, value: &ConstValue) -> Result<ConstValue, ScalarError> {
        match value {
            ConstValue::Boolean(b) => Ok(ConstValue::Boolean(*b)),
            other => Err(ScalarError::new(format!(
                "Boolean cannot represent a non boolean value: {other}"
            ))),
        }
    }

    fn encode(&self, value: &ConstValue) -> Result<serde_json::Value, ScalarError> {
        match value {
            ConstValue::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
            other => Err(ScalarError::cannot_represent("Boolean", other)),
        }
    }
}

/// `ID`: opaque identifiers, accepted as strings or integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdScalar;

impl IdScalar {
    fn coerce(value: &ConstValue) -> Result<String, ScalarError> {
        match value {
            ConstValue::String(s) => Ok(s.clone()),
            ConstValue::Int(i) => Ok(i.to_string()),
            other => Err(ScalarError::cannot_represent("ID", other)),
        }
    }
}

impl ScalarCodec for IdScalar {
    fn name(&self) -> &str {
        "ID"
    }

    fn description(&self) -> Option<&str> {
        Some("The `ID` scalar type represents a unique identifier.")
    }

    fn decode(&self, value: &ConstValue) -> Result<ConstValue, ScalarError> {
        Self::coerce(value).map(ConstValue::String)
    }

    fn encode(&self, value: &ConstValue) -> Result<serde_json::Value, ScalarError> {
        Self::coerce(value).map(serde_json::Value::String)
    }
}

/// Names of the scalars every schema has.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Scalar codecs indexed by scalar name.
#[derive(Clone)]
pub struct ScalarRegistry {
    codecs: IndexMap<String, Arc<dyn ScalarCodec>>,
}

impl Default for ScalarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarRegistry {
    /// Creates a registry holding the built-in scalars.
    pub fn new() -> Self {
        let mut registry = Self {
            codecs: IndexMap::new(),
        };
        registry.register(IntScalar);
        registry.register(FloatScalar);
        registry.register(StringScalar);
        registry.register(BooleanScalar);
        registry.register(IdScalar);
        registry
    }

    /// Registers a codec under its own name, replacing any previous one.
    pub fn register<C: ScalarCodec + 'static>(&mut self, codec: C) {
        self.codecs.insert(codec.name().to_string(), Arc::new(codec));
    }

    /// Gets the codec for a scalar.
    pub fn get(&self, name: &str) -> Option<&dyn ScalarCodec> {
        self.codecs.get(name).map(AsRef::as_ref)
    }

    /// Returns true if a codec is registered for the scalar.
    pub fn contains(&self, name: &str) -> bool {
        self.codecs.contains_key(name)
    }

    /// Returns the registered scalar names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }
}

impl Debug for ScalarRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalarRegistry")
            .field("scalars", &self.codecs.keys().collect::<Vec<_>>())
            .finish()
    }
}
