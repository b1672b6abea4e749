//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::{http::StatusCode, response::Response};
use serde_json::Value;

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Captured response with chained checks
pub struct ResponseAssertion {
    pub status: StatusCode,
    pub body: Value,
}

impl ResponseAssertion {
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Self { status, body }
    }

    /// Assert the status code, printing the body on mismatch
    pub fn has_status(self, expected: u16) -> Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "unexpected status, body: {}",
            self.body
        );
        self
    }

    /// Assert a validation failure carrying `message` for `field`
    pub fn has_field_error(self, field: &str, message: &str) -> Self {
        let checked = self.has_status(400);
        assert_eq!(checked.body["error"], "Validation failed");
        let messages = checked.body["fields"][field]
            .as_array()
            .unwrap_or_else(|| panic!("no errors for {}: {}", field, checked.body));
        assert!(
            messages.iter().any(|m| m == message),
            "{} errors {:?} do not include {:?}",
            field,
            messages,
            message
        );
        checked
    }

    pub fn has_error_message(self, message: &str) -> Self {
        assert_eq!(self.body["error"], message, "body: {}", self.body);
        self
    }

    pub fn json(self) -> Value {
        self.body
    }

    /// Assert the body is a list and return its length
    pub fn list_len(self) -> usize {
        self.body
            .as_array()
            .unwrap_or_else(|| panic!("expected a list, got {}", self.body))
            .len()
    }
}
