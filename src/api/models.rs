use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::constants::LOGIN_PATH;
use crate::core::errors::{BillpayError, FieldError};
use crate::core::models::{Bill, Payment, Statement};
use crate::core::statement::{StatementBook, StatementView};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BillsQuery {
    /// Exact category to show; omit or pass `all` for every bill
    pub category: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// Must be `true`; deletion cannot be undone
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Serialize, ToSchema)]
pub struct BillCatalogResponse {
    pub bills: Vec<Bill>,
    pub categories: Vec<String>,
    pub selected_category: String,
    pub error: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BillDetailsResponse {
    pub bill: Bill,
    /// False when the bill is outside the current month and the pay action is disabled
    pub payable: bool,
}

#[derive(Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Serialize, ToSchema)]
pub struct StatementResponse {
    pub owner: String,
    pub statement: Statement,
    pub period: String,
    pub duration: String,
    pub payments: Vec<Payment>,
    /// Set when the history could not be loaded; the statement is then empty
    pub error: Option<String>,
}

impl From<StatementBook> for StatementResponse {
    fn from(book: StatementBook) -> Self {
        StatementResponse {
            owner: book.owner().to_string(),
            period: book.statement().period_label(),
            duration: book.statement().duration_label(),
            statement: book.statement().clone(),
            payments: book.payments().to_vec(),
            error: None,
        }
    }
}

impl From<StatementView> for StatementResponse {
    fn from(view: StatementView) -> Self {
        StatementResponse {
            error: view.error,
            ..StatementResponse::from(view.book)
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UpdatedPaymentResponse {
    pub payment: Payment,
    pub statement: StatementResponse,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
}

// Newtype wrapper for BillpayError to implement IntoResponse
pub struct ApiError(pub BillpayError);

impl From<BillpayError> for ApiError {
    fn from(err: BillpayError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BillpayError::Unauthenticated { .. } | BillpayError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            BillpayError::Validation(_) => StatusCode::BAD_REQUEST,
            BillpayError::NotPayable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BillpayError::BillNotFound(_) | BillpayError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
            BillpayError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            BillpayError::SubmissionInProgress(_) => StatusCode::CONFLICT,
            BillpayError::Submission(_) | BillpayError::Fetch(_) => StatusCode::BAD_GATEWAY,
            BillpayError::NotificationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let mut body = ErrorResponse {
            error: self.0.to_string(),
            fields: Vec::new(),
            login: None,
            return_to: None,
        };
        match self.0 {
            BillpayError::Unauthenticated { return_to } => {
                body.login = Some(LOGIN_PATH.to_string());
                body.return_to = Some(return_to);
            }
            BillpayError::Validation(fields) => body.fields = fields,
            _ => {}
        }
        (status, Json(body)).into_response()
    }
}
