//! Error types for the form engine

use std::time::Duration;
use thiserror::Error;

/// Local, pre-submission validation failures. These never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Schema title is blank
    #[error("Form title is required")]
    MissingTitle,

    /// Schema has no fields
    #[error("Add at least one field to your form")]
    NoFields,

    /// A field label is blank
    #[error("All fields must have a label")]
    MissingLabel { index: usize },

    /// A required field has no value or file
    #[error("{label} is required")]
    RequiredField { field_id: String, label: String },

    /// A file was refused by the upload policy
    #[error("Please upload a PDF file ({file_name} is {media_type})")]
    RejectedFile {
        file_name: String,
        media_type: String,
    },

    /// Field references a type missing from the registry
    #[error("Invalid field_type_id: {field_type_id}")]
    UnknownFieldType { field_id: String, field_type_id: i64 },

    /// Field type has options but the field defines none
    #[error("Field '{label}' requires options for field type '{type_name}'")]
    OptionsRequired { label: String, type_name: String },

    /// Field type takes no options but the field defines some
    #[error("Field '{label}' does not accept options for field type '{type_name}'")]
    OptionsNotAccepted { label: String, type_name: String },

    /// Two fields share a field_id
    #[error("Duplicate field id: {0}")]
    DuplicateFieldId(String),

    /// Value given for a field the form does not declare
    #[error("Unknown field: {0}")]
    UnknownField(String),
}

/// Errors produced by engine operations and backend adapters.
#[derive(Debug, Error)]
pub enum FormError {
    /// Local validation failure
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport failure, no response received
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the backend
    #[error("Server error {status}: {}", .detail.as_deref().unwrap_or("An error occurred"))]
    Server { status: u16, detail: Option<String> },

    /// Request did not finish in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Request cancelled by the caller
    #[error("Request was cancelled")]
    Cancelled,

    /// A submission is already in flight for this form
    #[error("A submission is already in progress")]
    SubmissionInProgress,

    /// Operation not allowed in the current session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Index-based edit outside the field list
    #[error("Index {index} out of range for {len} fields")]
    IndexOutOfRange { index: usize, len: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormError {
    /// Human-readable message suitable for a notification.
    pub fn detail(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Server {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for FormError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FormError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            FormError::Network(format!("Connection error: {}", err))
        } else if err.is_decode() {
            FormError::Serialization(err.to_string())
        } else {
            FormError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FormError {
    fn from(err: serde_json::Error) -> Self {
        FormError::Serialization(err.to_string())
    }
}

/// Result type alias for form engine operations
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_uses_detail() {
        let err = FormError::Server {
            status: 400,
            detail: Some("Invalid form data JSON".into()),
        };
        assert_eq!(err.detail(), "Invalid form data JSON");
        assert_eq!(err.to_string(), "Server error 400: Invalid form data JSON");
    }

    #[test]
    fn test_server_error_without_detail() {
        let err = FormError::Server {
            status: 500,
            detail: None,
        };
        assert_eq!(err.detail(), "Server error 500: An error occurred");
    }

    #[test]
    fn test_required_field_message_names_label() {
        let err: FormError = ValidationError::RequiredField {
            field_id: "resume".into(),
            label: "Resume".into(),
        }
        .into();
        assert!(err.is_validation());
        assert_eq!(err.detail(), "Resume is required");
    }

    #[test]
    fn test_timeout_keeps_sub_second_precision() {
        let err = FormError::Timeout(Duration::from_millis(200));
        assert_eq!(err.to_string(), "Request timed out after 200ms");
        assert_eq!(
            FormError::Timeout(Duration::from_secs(30)).detail(),
            "Request timed out after 30s"
        );
    }
}
