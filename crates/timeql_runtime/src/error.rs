//! Error types and the mapping from failures to response errors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use timeql_core::LineCol;

/// A failure with a machine-readable code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DomainError {
    pub code: String,
    pub message: String,
}

impl DomainError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Error returned by a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// Reported with `extensions: { code, message }`.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Reported with the message only.
    #[error("{0}")]
    Generic(String),
}

impl ResolverError {
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }

    /// Maps the failure to a response error. The caller adds the path and
    /// location of the field.
    pub fn into_graphql_error(self) -> GraphQLError {
        match self {
            Self::Domain(DomainError { code, message }) => {
                let mut extensions = IndexMap::new();
                extensions.insert("code".to_string(), serde_json::Value::String(code));
                extensions.insert(
                    "message".to_string(),
                    serde_json::Value::String(message.clone()),
                );
                GraphQLError {
                    message,
                    locations: Vec::new(),
                    path: Vec::new(),
                    extensions: Some(extensions),
                }
            }
            Self::Generic(message) => GraphQLError::new(message),
        }
    }
}

/// A segment of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Field(value.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// An entry of the response `errors` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<LineCol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<IndexMap<String, serde_json::Value>>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: LineCol) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = LineCol>) -> Self {
        self.locations.extend(locations);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Sets the `code` extension.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.extensions
            .get_or_insert_with(IndexMap::new)
            .insert("code".to_string(), serde_json::Value::String(code.into()));
        self
    }
}

/// A failure that prevents execution from starting.
///
/// These produce a response without `data`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Request body exceeds {0} bytes.")]
    BodyTooLarge(usize),

    #[error("Syntax Error: {message}")]
    Syntax {
        message: String,
        location: Option<LineCol>,
    },

    #[error("The {kind} definition is not executable.")]
    NonExecutableDefinition { kind: String, location: LineCol },

    #[error("Must provide an operation.")]
    NoOperation,

    #[error("Unknown operation named \"{0}\".")]
    UnknownOperation(String),

    #[error("Must provide operation name if query contains multiple operations.")]
    AmbiguousOperation,

    #[error("Schema is not configured for {operation}s.")]
    UnsupportedOperation { operation: String, location: LineCol },

    #[error("{message}")]
    Validation {
        message: String,
        locations: Vec<LineCol>,
    },

    #[error("Variable \"${name}\" {message}")]
    Variable {
        name: String,
        message: String,
        location: LineCol,
    },
}

impl RequestError {
    /// Source locations the error points at.
    pub fn locations(&self) -> Vec<LineCol> {
        match self {
            Self::Syntax { location, .. } => location.iter().copied().collect(),
            Self::NonExecutableDefinition { location, .. }
            | Self::UnsupportedOperation { location, .. }
            | Self::Variable { location, .. } => vec![*location],
            Self::Validation { locations, .. } => locations.clone(),
            Self::InvalidBody(_)
            | Self::BodyTooLarge(_)
            | Self::NoOperation
            | Self::UnknownOperation(_)
            | Self::AmbiguousOperation => Vec::new(),
        }
    }

    pub fn to_graphql_error(&self) -> GraphQLError {
        let error = GraphQLError::new(self.to_string()).with_locations(self.locations());
        match self {
            Self::InvalidBody(_) => error.with_code("BAD_REQUEST"),
            Self::BodyTooLarge(_) => error.with_code("PAYLOAD_TOO_LARGE"),
            _ => error,
        }
    }
}

impl From<RequestError> for GraphQLError {
    fn from(error: RequestError) -> Self {
        error.to_graphql_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_error_mapping() {
        let error = ResolverError::from(DomainError::new("NotFound", "gone"))
            .into_graphql_error()
            .with_path(vec!["testError".into()])
            .with_location(LineCol { line: 1, column: 3 });

        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "message": "gone",
                "locations": [{"line": 1, "column": 3}],
                "path": ["testError"],
                "extensions": {"code": "NotFound", "message": "gone"}
            })
        );
    }

    #[test]
    fn test_generic_error_has_no_extensions() {
        let error = ResolverError::generic("boom").into_graphql_error();
        assert_eq!(serde_json::to_value(&error).unwrap(), json!({"message": "boom"}));
    }

    #[test]
    fn test_path_segments_serialize_untagged() {
        let path: Vec<PathSegment> = vec!["items".into(), 2usize.into(), "name".into()];
        assert_eq!(serde_json::to_value(&path).unwrap(), json!(["items", 2, "name"]));
    }

    #[test]
    fn test_request_error_messages() {
        assert_eq!(
            RequestError::UnknownOperation("Foo".into()).to_string(),
            "Unknown operation named \"Foo\"."
        );
        let error = RequestError::Variable {
            name: "from".into(),
            message: "got invalid value \"x\".".into(),
            location: LineCol { line: 1, column: 9 },
        }
        .to_graphql_error();
        assert_eq!(error.message, "Variable \"$from\" got invalid value \"x\".");
        assert_eq!(error.locations, vec![LineCol { line: 1, column: 9 }]);

        let error = RequestError::UnsupportedOperation {
            operation: "mutation".into(),
            location: LineCol { line: 1, column: 1 },
        };
        assert_eq!(error.to_string(), "Schema is not configured for mutations.");
    }

    #[test]
    fn test_invalid_body_code() {
        let error = RequestError::InvalidBody("expected value".into()).to_graphql_error();
        assert_eq!(error.message, "Invalid request body: expected value");
        assert_eq!(
            error.extensions.unwrap().get("code"),
            Some(&json!("BAD_REQUEST"))
        );

        let error = RequestError::BodyTooLarge(1024).to_graphql_error();
        assert_eq!(error.message, "Request body exceeds 1024 bytes.");
        assert_eq!(
            error.extensions.unwrap().get("code"),
            Some(&json!("PAYLOAD_TOO_LARGE"))
        );
    }
}
