use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn required(field: &str) -> Self {
        FieldError {
            field: field.to_string(),
            title: format!("Missing {}", field),
            description: format!("{} is required", field),
        }
    }

    pub fn invalid(field: &str, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: format!("Invalid {}", field),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug, Serialize)]
pub enum BillpayError {
    /// No signed-in identity; the caller should log in and come back to `return_to`
    #[error("You must be logged in to pay")]
    Unauthenticated { return_to: String },

    /// One or more form fields failed client-side validation
    #[error("Invalid input for {}", field_names(.0))]
    Validation(Vec<FieldError>),

    /// Bill is outside the current-month payment window
    #[error("Bill {0} is not from the current month")]
    NotPayable(String),

    #[error("Bill {0} not found")]
    BillNotFound(String),

    #[error("Payment {0} not found")]
    PaymentNotFound(String),

    /// Destructive action attempted without explicit user confirmation
    #[error("Deleting payment {0} requires confirmation")]
    ConfirmationRequired(String),

    /// A submission for the same payer and bill is already in flight
    #[error("A payment for bill {0} is already being submitted")]
    SubmissionInProgress(String),

    /// Remote store rejected a write or could not be reached
    #[error("{0}")]
    Submission(String),

    /// Remote read failed (network or decode)
    #[error("Failed to load data: {0}")]
    Fetch(String),

    #[error("Invalid identity token: {0}")]
    InvalidToken(String),

    #[error("Notification error: {0}")]
    NotificationError(String),
}

impl BillpayError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        BillpayError::Validation(errors)
    }

    /// Names of the fields a validation error refers to, empty for other variants.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            BillpayError::Validation(errors) => errors.iter().map(|e| e.field.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

fn field_names(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let err = BillpayError::validation(vec![FieldError::required("address"), FieldError::required("phone")]);
        assert_eq!(err.to_string(), "Invalid input for address, phone");
        assert_eq!(err.fields(), vec!["address", "phone"]);
    }

    #[test]
    fn submission_error_surfaces_remote_reason_verbatim() {
        let err = BillpayError::Submission("Payment failed".to_string());
        assert_eq!(err.to_string(), "Payment failed");
        assert!(err.fields().is_empty());
    }
}
