use crate::core::errors::BillpayError;
use crate::core::models::{Bill, NewBill, NewPayment, Payment, PaymentChanges, UserRecord};
use crate::infrastructure::remote::{BillStore, PaymentStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local stand-in for the bill service. Counts every call so callers can
/// assert that validation failures never reach the store.
#[derive(Clone)]
pub struct InMemoryStore {
    bills: Arc<RwLock<Vec<Bill>>>,
    payments: Arc<RwLock<HashMap<String, Payment>>>,
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
    calls: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
    offline: Arc<AtomicBool>,
    latency: Option<Duration>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            bills: Arc::new(RwLock::new(Vec::new())),
            payments: Arc::new(RwLock::new(HashMap::new())),
            users: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            offline: Arc::new(AtomicBool::new(false)),
            latency: None,
        }
    }

    /// Every call sleeps for `latency` before touching state.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn seed_bill(&self, bill: Bill) {
        self.bills.write().await.push(bill);
    }

    pub async fn seed_payment(&self, payment: Payment) {
        self.payments.write().await.insert(payment.id.clone(), payment);
    }

    pub async fn payment(&self, payment_id: &str) -> Option<Payment> {
        self.payments.read().await.get(payment_id).cloned()
    }

    pub async fn user(&self, email: &str) -> Option<UserRecord> {
        self.users.read().await.get(email).cloned()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every subsequent write fail as if the store rejected it.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn begin_read(&self) -> Result<(), BillpayError> {
        self.enter().await;
        if self.offline.load(Ordering::SeqCst) {
            return Err(BillpayError::Fetch("bill service unreachable".to_string()));
        }
        Ok(())
    }

    async fn begin_write(&self) -> Result<(), BillpayError> {
        self.enter().await;
        if self.offline.load(Ordering::SeqCst) {
            return Err(BillpayError::Submission("bill service unreachable".to_string()));
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BillpayError::Submission("Store rejected the request".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BillStore for InMemoryStore {
    async fn list_bills(&self, category: Option<&str>) -> Result<Vec<Bill>, BillpayError> {
        self.begin_read().await?;
        let bills = self.bills.read().await;
        Ok(bills
            .iter()
            .filter(|b| category.is_none_or(|c| b.category == c))
            .cloned()
            .collect())
    }

    async fn get_bill(&self, bill_id: &str) -> Result<Option<Bill>, BillpayError> {
        self.begin_read().await?;
        let bills = self.bills.read().await;
        Ok(bills.iter().find(|b| b.id == bill_id).cloned())
    }

    async fn recent_bills(&self) -> Result<Vec<Bill>, BillpayError> {
        self.begin_read().await?;
        let bills = self.bills.read().await;
        let mut recent = bills.clone();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(6);
        Ok(recent)
    }

    async fn create_bill(&self, bill: &NewBill) -> Result<String, BillpayError> {
        self.begin_write().await?;
        let id = Uuid::new_v4().to_string();
        self.bills.write().await.push(bill.clone().into_bill(id.clone()));
        Ok(id)
    }

    async fn register_user(&self, user: &UserRecord) -> Result<(), BillpayError> {
        self.begin_write().await?;
        self.users.write().await.insert(user.email.clone(), user.clone());
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, BillpayError> {
        self.begin_write().await?;
        let stored = payment.clone().into_payment(Uuid::new_v4().to_string());
        self.payments.write().await.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn list_payments(&self, email: &str) -> Result<Vec<Payment>, BillpayError> {
        self.begin_read().await?;
        let payments = self.payments.read().await;
        let mut owned: Vec<Payment> = payments.values().filter(|p| p.email == email).cloned().collect();
        owned.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(owned)
    }

    async fn update_payment(
        &self,
        payment_id: &str,
        changes: &PaymentChanges,
    ) -> Result<Option<Payment>, BillpayError> {
        self.begin_write().await?;
        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(payment_id)
            .ok_or_else(|| BillpayError::PaymentNotFound(payment_id.to_string()))?;
        payment.apply(changes);
        Ok(Some(payment.clone()))
    }

    async fn delete_payment(&self, payment_id: &str) -> Result<(), BillpayError> {
        self.begin_write().await?;
        self.payments
            .write()
            .await
            .remove(payment_id)
            .map(|_| ())
            .ok_or_else(|| BillpayError::PaymentNotFound(payment_id.to_string()))
    }
}
