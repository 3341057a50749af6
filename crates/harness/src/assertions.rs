//! Response assertions
//!
//! Each check returns a `HarnessError` carrying the response body instead of
//! panicking, so the scenario decides when a failure stops the run.

use reqwest::StatusCode;
use serde_json::Value;

use crate::client::ApiResponse;
use crate::error::{HarnessError, Result};

impl ApiResponse {
    /// Fail unless the response carries exactly `expected`
    pub fn expect_status(&self, expected: StatusCode) -> Result<&Self> {
        if self.status != expected {
            tracing::warn!(
                operation = self.operation,
                expected = %expected,
                actual = %self.status,
                "Unexpected status"
            );
            return Err(HarnessError::UnexpectedStatus {
                operation: self.operation,
                expected,
                actual: self.status,
                body: self.body.clone(),
            });
        }
        Ok(self)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body)
            .map_err(|e| self.shape(format!("response body is not valid JSON: {}", e)))
    }

    /// No-content responses must not carry a body
    pub fn expect_empty_body(&self) -> Result<()> {
        if self.body.trim().is_empty() {
            Ok(())
        } else {
            Err(self.shape("expected an empty body"))
        }
    }

    /// Build a shape violation for this response
    pub fn shape(&self, message: impl Into<String>) -> HarnessError {
        HarnessError::Shape {
            operation: self.operation,
            message: message.into(),
            body: self.body.clone(),
        }
    }

    /// `key` must be present in the JSON object `value`
    pub fn require_field<'a>(&self, value: &'a Value, key: &str) -> Result<&'a Value> {
        match value {
            Value::Object(map) => map
                .get(key)
                .ok_or_else(|| self.shape(format!("response has no '{}' key", key))),
            other => Err(self.shape(format!(
                "expected a JSON object holding '{}', got {}",
                key,
                type_name(other)
            ))),
        }
    }

    /// `key` must be present and hold a string
    pub fn require_str<'a>(&self, value: &'a Value, key: &str) -> Result<&'a str> {
        let field = self.require_field(value, key)?;
        field.as_str().ok_or_else(|| {
            self.shape(format!(
                "'{}' should be a string, got {}",
                key,
                type_name(field)
            ))
        })
    }

    /// `key` must hold exactly the string `expected`
    pub fn expect_str_eq(&self, value: &Value, key: &str, expected: &str) -> Result<()> {
        let actual = self.require_str(value, key)?;
        if actual != expected {
            return Err(self.shape(format!(
                "'{}' should be '{}', got '{}'",
                key, expected, actual
            )));
        }
        Ok(())
    }

    /// `key` must hold a list whose every element is a JSON number
    pub fn require_numeric_list<'a>(&self, value: &'a Value, key: &str) -> Result<&'a [Value]> {
        let field = self.require_field(value, key)?;
        let items = field.as_array().ok_or_else(|| {
            self.shape(format!(
                "'{}' should be a list, got {}",
                key,
                type_name(field)
            ))
        })?;

        if let Some((index, bad)) = items.iter().enumerate().find(|(_, v)| !v.is_number()) {
            return Err(self.shape(format!(
                "'{}' holds a non-numeric value at index {}: {} ({})",
                key,
                index,
                bad,
                type_name(bad)
            )));
        }
        Ok(items.as_slice())
    }

    /// The body must be a JSON array
    pub fn require_array<'a>(&self, value: &'a Value) -> Result<&'a [Value]> {
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.shape(format!("expected a JSON list, got {}", type_name(value))))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
