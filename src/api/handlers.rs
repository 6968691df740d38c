use crate::{
    api::models::*,
    auth::{jwt::IdentityVerifier, session::Session},
    constants::ALL_CATEGORIES,
    core::{
        catalog::category_filter,
        errors::BillpayError,
        models::{Bill, NewBill, Notification, PaymentForm, PaymentPatch},
        payments::SubmittedPayment,
        services::BillpayService,
        statement::Confirmation,
    },
    infrastructure::{notifications::in_memory::InMemoryNotifications, remote::http::RemoteStore},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, patch, post},
};
use http::header;
use std::sync::Arc;
use tracing::{error, warn};

pub type AppService = BillpayService<RemoteStore, InMemoryNotifications>;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AppService>,
    pub verifier: Arc<IdentityVerifier>,
}

/// Attaches a [`Session`] to every request. No token means anonymous; a bad token is rejected.
/// A verified user is saved with the bill service the first time they are seen.
async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| {
            h.strip_prefix("Bearer ")
                .ok_or_else(|| BillpayError::InvalidToken("expected a Bearer token".to_string()))
        })
        .transpose()?;

    let session = match token {
        Some(token) => Session::signed_in(state.verifier.verify(token)?),
        None => Session::anonymous(),
    };
    if let Err(e) = state.service.register_identity(&session).await {
        warn!(error = %e, "could not save user with bill service");
    }
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/bills", get(list_bills).post(create_bill))
        .route("/bills/recent", get(recent_bills))
        .route("/bills/{bill_id}", get(get_bill))
        .route("/bills/{bill_id}/pay", post(pay_bill))
        .route("/my-bills", get(my_bills))
        .route("/my-bills/{payment_id}", patch(update_payment).delete(delete_payment))
        .route("/notifications", get(notifications))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/bills",
    params(BillsQuery),
    responses(
        (status = 200, description = "Bills in the selected category; empty with `error` set when loading failed", body = BillCatalogResponse)
    )
)]
async fn list_bills(State(state): State<AppState>, Query(query): Query<BillsQuery>) -> Json<BillCatalogResponse> {
    let catalog = state.service.catalog();
    let (listing, categories) = futures::join!(
        state.service.browse_bills(query.category.as_deref()),
        catalog.categories()
    );
    let categories = categories.unwrap_or_else(|e| {
        error!(error = %e, "category fetch failed");
        vec![ALL_CATEGORIES.to_string()]
    });
    Json(BillCatalogResponse {
        bills: listing.bills,
        categories,
        selected_category: category_filter(query.category.as_deref())
            .unwrap_or(ALL_CATEGORIES)
            .to_string(),
        error: listing.error,
    })
}

#[utoipa::path(
    get,
    path = "/api/bills/recent",
    responses(
        (status = 200, description = "Most recent bills; empty when loading failed", body = Vec<Bill>)
    )
)]
async fn recent_bills(State(state): State<AppState>) -> Json<Vec<Bill>> {
    let bills = state.service.catalog().recent_bills().await.unwrap_or_else(|e| {
        error!(error = %e, "recent bills fetch failed");
        Vec::new()
    });
    Json(bills)
}

#[utoipa::path(
    post,
    path = "/api/bills",
    request_body = NewBill,
    responses(
        (status = 201, description = "Bill created", body = CreatedResponse),
        (status = 400, description = "Invalid bill", body = ErrorResponse),
        (status = 401, description = "Login required", body = ErrorResponse),
        (status = 502, description = "Bill service rejected or unreachable", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_bill(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(bill): Json<NewBill>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state.service.create_bill(&session, bill).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    get,
    path = "/api/bills/{bill_id}",
    params(
        ("bill_id" = String, Path, description = "ID of the bill")
    ),
    responses(
        (status = 200, description = "Bill details", body = BillDetailsResponse),
        (status = 404, description = "Bill not found", body = ErrorResponse),
        (status = 502, description = "Bill service unreachable", body = ErrorResponse)
    )
)]
async fn get_bill(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
) -> Result<Json<BillDetailsResponse>, ApiError> {
    let bill = state.service.get_bill(&bill_id).await?;
    let payable = state.service.payments().can_pay(&bill);
    Ok(Json(BillDetailsResponse { bill, payable }))
}

#[utoipa::path(
    post,
    path = "/api/bills/{bill_id}/pay",
    params(
        ("bill_id" = String, Path, description = "ID of the bill being paid")
    ),
    request_body = PaymentForm,
    responses(
        (status = 201, description = "Payment recorded", body = SubmittedPayment),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 401, description = "Login required; `return_to` names the bill page", body = ErrorResponse),
        (status = 404, description = "Bill not found", body = ErrorResponse),
        (status = 409, description = "Same payment already in flight", body = ErrorResponse),
        (status = 422, description = "Bill is not from the current month", body = ErrorResponse),
        (status = 502, description = "Bill service rejected or unreachable", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn pay_bill(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(form): Json<PaymentForm>,
) -> Result<(StatusCode, Json<SubmittedPayment>), ApiError> {
    let submitted = state.service.pay_bill(&session, &bill_id, &form).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

#[utoipa::path(
    get,
    path = "/api/my-bills",
    responses(
        (status = 200, description = "Payment history and statement; empty with `error` set when loading failed", body = StatementResponse),
        (status = 401, description = "Login required", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn my_bills(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<StatementResponse>, ApiError> {
    let view = state.service.my_bills(&session).await?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    patch,
    path = "/api/my-bills/{payment_id}",
    params(
        ("payment_id" = String, Path, description = "ID of the payment to edit")
    ),
    request_body = PaymentPatch,
    responses(
        (status = 200, description = "Payment updated; statement recomputed", body = UpdatedPaymentResponse),
        (status = 400, description = "Invalid amount, phone or date", body = ErrorResponse),
        (status = 401, description = "Login required", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 502, description = "Bill service rejected or unreachable", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(patch): Json<PaymentPatch>,
) -> Result<Json<UpdatedPaymentResponse>, ApiError> {
    let (payment, book) = state.service.update_payment(&session, &payment_id, &patch).await?;
    Ok(Json(UpdatedPaymentResponse {
        payment,
        statement: book.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/my-bills/{payment_id}",
    params(
        ("payment_id" = String, Path, description = "ID of the payment to delete"),
        DeleteQuery
    ),
    responses(
        (status = 200, description = "Payment deleted; statement recomputed", body = StatementResponse),
        (status = 401, description = "Login required", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 428, description = "Deletion not confirmed", body = ErrorResponse),
        (status = 502, description = "Bill service rejected or unreachable", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    Query(query): Query<DeleteQuery>,
    Extension(session): Extension<Session>,
) -> Result<Json<StatementResponse>, ApiError> {
    let book = state
        .service
        .delete_payment(&session, &payment_id, Confirmation::from(query.confirm))
        .await?;
    Ok(Json(book.into()))
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "Pending notifications, removed once read", body = Vec<Notification>)
    )
)]
async fn notifications(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.service.notifications(&session).await?))
}
