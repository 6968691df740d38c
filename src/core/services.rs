use crate::auth::session::Session;
use crate::constants::MY_BILLS_PATH;
use crate::core::catalog::{BillCatalog, BillListing};
use crate::core::clock::{Clock, SystemClock};
use crate::core::errors::BillpayError;
use crate::core::models::{Bill, NewBill, Notification, Payment, PaymentForm, PaymentPatch, UserRecord};
use crate::core::payments::{PaymentWorkflow, SubmittedPayment};
use crate::core::statement::{Confirmation, StatementBook, StatementView, validate_patch};
use crate::infrastructure::notifications::Notifier;
use crate::infrastructure::remote::{BillStore, PaymentStore};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Entry point for every view: catalog, payment and statement operations over one store.
pub struct BillpayService<S: BillStore + PaymentStore, N: Notifier> {
    store: Arc<S>,
    notifier: Arc<N>,
    catalog: BillCatalog<S>,
    payments: PaymentWorkflow<S, N>,
    registered: Mutex<HashSet<String>>,
}

impl<S: BillStore + PaymentStore, N: Notifier> BillpayService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self::with_clock(store, notifier, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, notifier: N, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(store);
        let notifier = Arc::new(notifier);
        BillpayService {
            catalog: BillCatalog::new(Arc::clone(&store)),
            payments: PaymentWorkflow::new(Arc::clone(&store), Arc::clone(&notifier), clock),
            store,
            notifier,
            registered: Mutex::new(HashSet::new()),
        }
    }

    pub fn catalog(&self) -> &BillCatalog<S> {
        &self.catalog
    }

    pub fn payments(&self) -> &PaymentWorkflow<S, N> {
        &self.payments
    }

    /// Saves the signed-in user with the bill service the first time this process sees them.
    /// A failed save is not remembered, so the next request tries again.
    pub async fn register_identity(&self, session: &Session) -> Result<(), BillpayError> {
        let Some(identity) = session.identity() else {
            return Ok(());
        };
        if self.is_registered(&identity.email) {
            return Ok(());
        }
        self.store.register_user(&UserRecord::from(identity)).await?;
        self.registered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(identity.email.clone());
        info!(email = %identity.email, "user registered with bill service");
        Ok(())
    }

    fn is_registered(&self, email: &str) -> bool {
        self.registered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(email)
    }

    pub async fn browse_bills(&self, category: Option<&str>) -> BillListing {
        self.catalog.browse(category).await
    }

    pub async fn get_bill(&self, bill_id: &str) -> Result<Bill, BillpayError> {
        self.catalog.get_bill(bill_id).await
    }

    pub async fn create_bill(&self, session: &Session, bill: NewBill) -> Result<String, BillpayError> {
        self.catalog.create_bill(session, bill).await
    }

    /// Looks the bill up first, so a stale link ends in `BillNotFound` rather than a payment.
    /// Identity is checked before anything else so an anonymous user is always sent to login.
    pub async fn pay_bill(
        &self,
        session: &Session,
        bill_id: &str,
        form: &PaymentForm,
    ) -> Result<SubmittedPayment, BillpayError> {
        session.require_identity_for_bill(bill_id)?;
        let bill = self.catalog.get_bill(bill_id).await?;
        self.payments.submit_payment(session, &bill, form).await
    }

    /// The history view. Only a missing login fails; a failed load degrades to an empty statement.
    pub async fn my_bills(&self, session: &Session) -> Result<StatementView, BillpayError> {
        let identity = session.require_identity(MY_BILLS_PATH)?;
        let mut book = StatementBook::new(identity.email.clone());
        let error = book
            .load(self.store.as_ref(), self.notifier.as_ref())
            .await
            .err()
            .map(|e| e.to_string());
        Ok(StatementView { book, error })
    }

    /// Loads the signed-in user's history into a fresh book.
    pub async fn statement_book(&self, session: &Session) -> Result<StatementBook, BillpayError> {
        let identity = session.require_identity(MY_BILLS_PATH)?;
        let mut book = StatementBook::new(identity.email.clone());
        book.load(self.store.as_ref(), self.notifier.as_ref()).await?;
        Ok(book)
    }

    pub async fn update_payment(
        &self,
        session: &Session,
        payment_id: &str,
        patch: &PaymentPatch,
    ) -> Result<(Payment, StatementBook), BillpayError> {
        session.require_identity(MY_BILLS_PATH)?;
        // Reject bad input before the history is even fetched.
        validate_patch(patch)?;
        let mut book = self.statement_book(session).await?;
        let payment = book
            .update_payment(self.store.as_ref(), self.notifier.as_ref(), payment_id, patch)
            .await?;
        Ok((payment, book))
    }

    pub async fn delete_payment(
        &self,
        session: &Session,
        payment_id: &str,
        confirmation: Confirmation,
    ) -> Result<StatementBook, BillpayError> {
        session.require_identity(MY_BILLS_PATH)?;
        if confirmation != Confirmation::Granted {
            return Err(BillpayError::ConfirmationRequired(payment_id.to_string()));
        }
        let mut book = self.statement_book(session).await?;
        book.delete_payment(self.store.as_ref(), self.notifier.as_ref(), payment_id, confirmation)
            .await?;
        Ok(book)
    }

    pub async fn notifications(&self, session: &Session) -> Result<Vec<Notification>, BillpayError> {
        self.notifier.drain(session.email()).await
    }
}
