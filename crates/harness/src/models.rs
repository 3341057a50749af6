//! Wire types for the API under test

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Server-assigned subject identifier.
///
/// Opaque to the harness: it may come back as a JSON number or a string, and
/// is only ever compared with other ids or rendered into a URL path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(Value);

impl SubjectId {
    /// Wrap an `id` value taken from a response; `null` is not an id
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            other => Some(Self(other)),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Path segment form, without JSON quoting
    pub fn path_segment(&self) -> String {
        match &self.0 {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Whether a record's `id` field refers to this subject
    pub fn matches(&self, candidate: &Value) -> bool {
        &self.0 == candidate
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path_segment())
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        Self(Value::from(id))
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(Value::from(id))
    }
}

/// Body of create and update calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubject {
    pub nome: String,
    pub email: String,
}

impl NewSubject {
    pub fn new(nome: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            nome: nome.into(),
            email: email.into(),
        }
    }
}

/// A subject record as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: SubjectId,
    pub nome: String,
    pub email: String,
    /// Anything else the server returns; kept but not asserted on
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub entrada: Vec<Number>,
}

impl PredictionRequest {
    /// Integer inputs are sent as JSON integers (`[5]`, not `[5.0]`)
    pub fn from_integers(values: &[i64]) -> Self {
        Self {
            entrada: values.iter().map(|v| Number::from(*v)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicao: Vec<Number>,
}
