use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{
    api::models::{
        BillCatalogResponse, BillDetailsResponse, CreatedResponse, ErrorResponse, StatementResponse,
        UpdatedPaymentResponse,
    },
    core::{
        catalog::BillListing,
        errors::FieldError,
        models::{
            Bill, Identity, NewBill, NewPayment, Notification, NotificationLevel, Payment, PaymentForm, PaymentPatch,
            Statement,
        },
        payments::SubmittedPayment,
    },
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::list_bills,
        super::handlers::recent_bills,
        super::handlers::create_bill,
        super::handlers::get_bill,
        super::handlers::pay_bill,
        super::handlers::my_bills,
        super::handlers::update_payment,
        super::handlers::delete_payment,
        super::handlers::notifications
    ),
    components(schemas(
        Bill,
        NewBill,
        BillListing,
        BillCatalogResponse,
        BillDetailsResponse,
        CreatedResponse,
        Payment,
        NewPayment,
        PaymentForm,
        PaymentPatch,
        SubmittedPayment,
        Statement,
        StatementResponse,
        UpdatedPaymentResponse,
        Identity,
        Notification,
        NotificationLevel,
        FieldError,
        ErrorResponse
    )),
    modifiers(&BearerAuth),
    info(
        title = "Billpay API",
        description = "Browse utility bills, pay current-month bills and manage your payment history",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
