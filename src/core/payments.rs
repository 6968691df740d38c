use crate::auth::session::Session;
use crate::constants::{MY_BILLS_PATH, PAYMENT_RECORDED};
use crate::core::clock::Clock;
use crate::core::errors::{BillpayError, FieldError};
use crate::core::models::{Bill, NewPayment, NotificationLevel, Payment, PaymentForm};
use crate::infrastructure::notifications::Notifier;
use crate::infrastructure::remote::PaymentStore;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// Only bills issued in the same calendar month and year as `today` are payable.
pub fn is_current_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SubmittedPayment {
    pub payment: Payment,
    /// Where the user goes next.
    pub redirect: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
}

type LatchKey = (String, String);

/// Held while an append is in flight; releasing it returns the action to idle.
struct SubmissionLatch {
    in_flight: Arc<Mutex<HashSet<LatchKey>>>,
    key: LatchKey,
}

impl SubmissionLatch {
    fn acquire(in_flight: &Arc<Mutex<HashSet<LatchKey>>>, key: LatchKey) -> Option<Self> {
        let mut set = in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !set.insert(key.clone()) {
            return None;
        }
        Some(SubmissionLatch {
            in_flight: Arc::clone(in_flight),
            key,
        })
    }
}

impl Drop for SubmissionLatch {
    fn drop(&mut self) {
        let mut set = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        set.remove(&self.key);
    }
}

pub struct PaymentWorkflow<S: PaymentStore, N: Notifier> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    in_flight: Arc<Mutex<HashSet<LatchKey>>>,
}

impl<S: PaymentStore, N: Notifier> PaymentWorkflow<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        PaymentWorkflow {
            store,
            notifier,
            clock,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether the pay action should be offered at all. Unreadable dates are never payable.
    pub fn can_pay(&self, bill: &Bill) -> bool {
        bill.issued_on()
            .is_some_and(|date| is_current_month(date, self.clock.today()))
    }

    pub fn submission_state(&self, email: &str, bill_id: &str) -> SubmissionState {
        let set = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if set.contains(&(email.to_string(), bill_id.to_string())) {
            SubmissionState::Submitting
        } else {
            SubmissionState::Idle
        }
    }

    pub async fn submit_payment(
        &self,
        session: &Session,
        bill: &Bill,
        form: &PaymentForm,
    ) -> Result<SubmittedPayment, BillpayError> {
        let identity = match session.require_identity_for_bill(&bill.id) {
            Ok(identity) => identity,
            Err(e) => {
                info!(bill_id = %bill.id, "payment attempted without login");
                return Err(e);
            }
        };
        if !self.can_pay(bill) {
            return Err(BillpayError::NotPayable(bill.id.clone()));
        }
        validate_form(form)?;

        let _latch = SubmissionLatch::acquire(&self.in_flight, (identity.email.clone(), bill.id.clone()))
            .ok_or_else(|| BillpayError::SubmissionInProgress(bill.id.clone()))?;

        let new_payment = NewPayment {
            bill_id: bill.id.clone(),
            email: identity.email.clone(),
            username: form.username.trim().to_string(),
            phone: form.phone.trim().to_string(),
            address: form.address.trim().to_string(),
            amount: bill.amount,
            date: self.clock.today(),
            additional_info: form.info.as_deref().map(str::trim).unwrap_or_default().to_string(),
        };

        match self.store.create_payment(&new_payment).await {
            Ok(payment) => {
                info!(payment_id = %payment.id, bill_id = %bill.id, payer = %identity.email, "payment recorded");
                self.toast(NotificationLevel::Success, PAYMENT_RECORDED, &identity.email)
                    .await;
                Ok(SubmittedPayment {
                    payment,
                    redirect: MY_BILLS_PATH.to_string(),
                })
            }
            Err(e) => {
                error!(error = %e, bill_id = %bill.id, "payment submission failed");
                let reason = match e {
                    BillpayError::Submission(reason) => reason,
                    other => other.to_string(),
                };
                self.toast(NotificationLevel::Error, &reason, &identity.email).await;
                Err(BillpayError::Submission(reason))
            }
        }
    }

    // A lost toast never fails the payment itself.
    async fn toast(&self, level: NotificationLevel, message: &str, recipient: &str) {
        if let Err(e) = self.notifier.notify(level, message, Some(recipient)).await {
            warn!(error = %e, "failed to queue notification");
        }
    }
}

fn validate_form(form: &PaymentForm) -> Result<(), BillpayError> {
    let mut errors = Vec::new();
    for (field, value) in [
        ("username", &form.username),
        ("address", &form.address),
        ("phone", &form.phone),
    ] {
        if value.trim().is_empty() {
            errors.push(FieldError::required(field));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BillpayError::validation(errors))
    }
}
