//! Uniform response envelope returned by every backend endpoint.
//!
//! The backend wraps payloads as
//! `{ success, message, data, timestamp, errors: [{ field, message }] | null }`.

use serde::{Deserialize, Serialize};

use super::error::messages;

/// One field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending field name.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

/// Backend response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Whether the operation succeeded.
    #[serde(default)]
    pub success: bool,
    /// Human-readable outcome message.
    #[serde(default)]
    pub message: String,
    /// Payload; absent on most failures.
    #[serde(default = "none")]
    pub data: Option<T>,
    /// Server timestamp (ISO 8601), kept verbatim.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Field-level validation errors.
    #[serde(default)]
    pub errors: Option<Vec<FieldError>>,
}

const fn none<T>() -> Option<T> {
    None
}

/// Why an envelope did not yield a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeFailure {
    /// `success` was false; carries the display message with field errors.
    Rejected {
        /// Display message.
        message: String,
        /// Whether field-level errors were present.
        has_field_errors: bool,
    },
    /// `success` was true but `data` was missing.
    MissingData,
}

impl<T> Envelope<T> {
    /// Display message summarising a failure.
    ///
    /// Falls back to the generic server error text when the backend sent no
    /// message, and appends `(field: message, ...)` when field errors exist.
    ///
    /// # Examples
    /// ```
    /// use dashboard::domain::{Envelope, FieldError};
    ///
    /// let envelope: Envelope<()> = Envelope {
    ///     success: false,
    ///     message: "Validation failed".to_owned(),
    ///     data: None,
    ///     timestamp: None,
    ///     errors: Some(vec![FieldError {
    ///         field: "email".to_owned(),
    ///         message: "must be unique".to_owned(),
    ///     }]),
    /// };
    /// assert_eq!(envelope.failure_message(), "Validation failed (email: must be unique)");
    /// ```
    pub fn failure_message(&self) -> String {
        let base = if self.message.trim().is_empty() {
            messages::SERVER_ERROR
        } else {
            self.message.as_str()
        };
        match self.errors.as_deref() {
            Some(errors) if !errors.is_empty() => {
                let details = errors
                    .iter()
                    .map(|error| format!("{}: {}", error.field, error.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{base} ({details})")
            }
            _ => base.to_owned(),
        }
    }

    /// Unwrap the payload of a successful envelope.
    pub fn into_data(self) -> Result<T, EnvelopeFailure> {
        if !self.success {
            let message = self.failure_message();
            let has_field_errors = self.errors.as_ref().is_some_and(|errors| !errors.is_empty());
            return Err(EnvelopeFailure::Rejected {
                message,
                has_field_errors,
            });
        }
        self.data.ok_or(EnvelopeFailure::MissingData)
    }
}
