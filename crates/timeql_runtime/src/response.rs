//! Request and response envelopes.

use crate::error::{GraphQLError, RequestError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A GraphQL request as sent over HTTP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub query: String,
    #[serde(rename = "operationName", default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<IndexMap<String, serde_json::Value>>,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets one variable.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.variables
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value);
        self
    }

    /// Parses a JSON request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        serde_json::from_slice(body).map_err(|err| RequestError::InvalidBody(err.to_string()))
    }
}

/// The response envelope.
///
/// `data` is absent when execution never started (request errors) and
/// `null` when a non-null root field failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl Response {
    /// Creates a response with data and no errors.
    pub fn data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Creates a response without data.
    pub fn errors(errors: Vec<GraphQLError>) -> Self {
        Self { data: None, errors }
    }

    /// Creates a response for a request-level failure.
    pub fn from_request_errors(errors: impl IntoIterator<Item = RequestError>) -> Self {
        Self::errors(errors.into_iter().map(GraphQLError::from).collect())
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Serializes the envelope.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<RequestError> for Response {
    fn from(error: RequestError) -> Self {
        Self::from_request_errors([error])
    }
}
