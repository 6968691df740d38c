use crate::core::errors::BillpayError;
use crate::core::models::{Bill, NewBill, NewPayment, Payment, PaymentChanges, UserRecord};
use async_trait::async_trait;

pub mod http;
pub mod in_memory;

/// Read side of the bill service plus bill creation and user registration.
#[async_trait]
pub trait BillStore: Send + Sync {
    /// `category` is forwarded verbatim; `None` lists everything.
    async fn list_bills(&self, category: Option<&str>) -> Result<Vec<Bill>, BillpayError>;
    async fn get_bill(&self, bill_id: &str) -> Result<Option<Bill>, BillpayError>;
    async fn recent_bills(&self) -> Result<Vec<Bill>, BillpayError>;
    async fn create_bill(&self, bill: &NewBill) -> Result<String, BillpayError>;
    /// Upserts the user by email; registering the same user twice is not an error.
    async fn register_user(&self, user: &UserRecord) -> Result<(), BillpayError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, BillpayError>;
    async fn list_payments(&self, email: &str) -> Result<Vec<Payment>, BillpayError>;
    /// `Ok(None)` when the store acknowledged without echoing the record;
    /// `PaymentNotFound` when it has no such payment.
    async fn update_payment(
        &self,
        payment_id: &str,
        changes: &PaymentChanges,
    ) -> Result<Option<Payment>, BillpayError>;
    /// `PaymentNotFound` when the store has no such payment.
    async fn delete_payment(&self, payment_id: &str) -> Result<(), BillpayError>;
}
