//! Payment history and the statement derived from it.
//!
//! The statement is never patched in place. Every load, update and delete
//! replaces the payment set and then recomputes the whole statement from it.

use crate::constants::{MIN_PHONE_LEN, PAYMENT_DELETED, PAYMENT_UPDATED, PAYMENTS_LOAD_FAILED};
use crate::core::errors::{BillpayError, FieldError};
use crate::core::models::de::parse_date;
use crate::core::models::{NotificationLevel, Payment, PaymentChanges, PaymentPatch, Statement};
use crate::infrastructure::notifications::Notifier;
use crate::infrastructure::remote::PaymentStore;
use tracing::{error, info, warn};

const DAYS_PER_MONTH: f64 = 30.0;

pub fn compute_statement(payments: &[Payment]) -> Statement {
    let total_paid: f64 = payments.iter().map(|p| p.amount).filter(|a| a.is_finite()).sum();
    let total_bills = payments.len();

    // Undated payments still count towards the totals, just not the period.
    let mut dates: Vec<_> = payments.iter().filter_map(|p| p.date).collect();
    dates.sort();
    let period_start = dates.first().copied();
    let period_end = dates.last().copied();

    let months = match (period_start, period_end) {
        (Some(start), Some(end)) => {
            let days = (end - start).num_days() as f64;
            ((days / DAYS_PER_MONTH).round() as i64).max(1) as u32
        }
        _ => 1,
    };

    let avg_per_bill = if total_bills > 0 {
        total_paid / total_bills as f64
    } else {
        0.0
    };

    Statement {
        total_paid,
        total_bills,
        period_start,
        period_end,
        months,
        avg_per_bill,
        avg_monthly: total_paid / f64::from(months),
        contact_phone: payments.first().map(|p| p.phone.clone()).filter(|p| !p.is_empty()),
    }
}

/// Gate in front of deletion; the remote call only happens once granted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Granted,
    Withheld,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Granted
        } else {
            Confirmation::Withheld
        }
    }
}

/// The history view. A failed load is an empty book carrying the reason.
#[derive(Debug)]
pub struct StatementView {
    pub book: StatementBook,
    pub error: Option<String>,
}

/// Identifies one load; a response carrying an outdated ticket is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// One owner's payments as currently shown, plus their statement.
#[derive(Debug)]
pub struct StatementBook {
    owner: String,
    payments: Vec<Payment>,
    statement: Statement,
    generation: u64,
}

impl StatementBook {
    pub fn new(owner: impl Into<String>) -> Self {
        StatementBook {
            owner: owner.into(),
            payments: Vec::new(),
            statement: compute_statement(&[]),
            generation: 0,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    /// The view went away; any load still in flight must not land.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Returns false and changes nothing when `ticket` is stale.
    pub fn apply_load(&mut self, ticket: LoadTicket, payments: Vec<Payment>) -> bool {
        if ticket.0 != self.generation {
            warn!(owner = %self.owner, "discarding stale payments response");
            return false;
        }
        self.replace(payments);
        true
    }

    /// Fetches the owner's payments and replaces the book's contents.
    ///
    /// The book stays mutably borrowed across the fetch, so on this path a ticket only
    /// goes stale when the future itself is dropped, and the response goes with it.
    /// A book shared between concurrent loads is refreshed with [`begin_load`](Self::begin_load)
    /// and [`apply_load`](Self::apply_load) around each fetch instead.
    pub async fn load<S: PaymentStore, N: Notifier>(&mut self, store: &S, notifier: &N) -> Result<(), BillpayError> {
        let ticket = self.begin_load();
        match store.list_payments(&self.owner).await {
            Ok(payments) => {
                self.apply_load(ticket, payments);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, owner = %self.owner, "payments fetch failed");
                toast(notifier, NotificationLevel::Error, PAYMENTS_LOAD_FAILED, &self.owner).await;
                Err(e)
            }
        }
    }

    pub async fn update_payment<S: PaymentStore, N: Notifier>(
        &mut self,
        store: &S,
        notifier: &N,
        payment_id: &str,
        patch: &PaymentPatch,
    ) -> Result<Payment, BillpayError> {
        let changes = validate_patch(patch)?;
        let index = self.position(payment_id)?;

        match store.update_payment(payment_id, &changes).await {
            Ok(Some(updated)) => self.payments[index] = updated,
            Ok(None) => self.payments[index].apply(&changes),
            Err(e @ BillpayError::PaymentNotFound(_)) => return Err(e),
            Err(e) => return Err(self.write_failed(notifier, e).await),
        }
        self.recompute();
        info!(payment_id, owner = %self.owner, "payment updated");
        toast(notifier, NotificationLevel::Success, PAYMENT_UPDATED, &self.owner).await;
        Ok(self.payments[index].clone())
    }

    pub async fn delete_payment<S: PaymentStore, N: Notifier>(
        &mut self,
        store: &S,
        notifier: &N,
        payment_id: &str,
        confirmation: Confirmation,
    ) -> Result<(), BillpayError> {
        let index = self.position(payment_id)?;
        if confirmation != Confirmation::Granted {
            return Err(BillpayError::ConfirmationRequired(payment_id.to_string()));
        }

        match store.delete_payment(payment_id).await {
            Ok(()) => {}
            Err(e @ BillpayError::PaymentNotFound(_)) => return Err(e),
            Err(e) => return Err(self.write_failed(notifier, e).await),
        }

        self.payments.remove(index);
        self.recompute();
        info!(payment_id, owner = %self.owner, "payment deleted");
        toast(notifier, NotificationLevel::Success, PAYMENT_DELETED, &self.owner).await;
        Ok(())
    }

    fn position(&self, payment_id: &str) -> Result<usize, BillpayError> {
        self.payments
            .iter()
            .position(|p| p.id == payment_id)
            .ok_or_else(|| BillpayError::PaymentNotFound(payment_id.to_string()))
    }

    fn replace(&mut self, payments: Vec<Payment>) {
        self.payments = payments;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.statement = compute_statement(&self.payments);
    }

    async fn write_failed<N: Notifier>(&self, notifier: &N, e: BillpayError) -> BillpayError {
        error!(error = %e, owner = %self.owner, "payment write failed");
        let reason = match e {
            BillpayError::Submission(reason) => reason,
            other => other.to_string(),
        };
        toast(notifier, NotificationLevel::Error, &reason, &self.owner).await;
        BillpayError::Submission(reason)
    }
}

async fn toast<N: Notifier>(notifier: &N, level: NotificationLevel, message: &str, owner: &str) {
    if let Err(e) = notifier.notify(level, message, Some(owner)).await {
        warn!(error = %e, "failed to queue notification");
    }
}

/// Client-side guard only; the store may still reject what passes here.
pub fn validate_patch(patch: &PaymentPatch) -> Result<PaymentChanges, BillpayError> {
    let mut errors = Vec::new();
    let mut changes = PaymentChanges::default();

    if let Some(raw) = &patch.amount {
        match raw.trim().parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount >= 0.0 => changes.amount = Some(amount),
            _ => errors.push(FieldError::invalid("amount", "Amount must be a number")),
        }
    }
    if let Some(raw) = &patch.phone {
        let phone = raw.trim();
        if phone.chars().count() < MIN_PHONE_LEN {
            errors.push(FieldError::invalid(
                "phone",
                format!("Phone must be at least {} characters", MIN_PHONE_LEN),
            ));
        } else {
            changes.phone = Some(phone.to_string());
        }
    }
    if let Some(raw) = &patch.address {
        let address = raw.trim();
        if address.is_empty() {
            errors.push(FieldError::required("address"));
        } else {
            changes.address = Some(address.to_string());
        }
    }
    if let Some(raw) = &patch.date {
        match parse_date(raw) {
            Some(date) => changes.date = Some(date),
            None => errors.push(FieldError::invalid("date", "Date must be YYYY-MM-DD")),
        }
    }

    if !errors.is_empty() {
        return Err(BillpayError::validation(errors));
    }
    if changes.is_empty() {
        return Err(BillpayError::validation(vec![FieldError::invalid(
            "payment",
            "Nothing to update",
        )]));
    }
    Ok(changes)
}
