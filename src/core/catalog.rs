use crate::auth::session::Session;
use crate::constants::ALL_CATEGORIES;
use crate::core::errors::{BillpayError, FieldError};
use crate::core::models::{Bill, NewBill};
use crate::infrastructure::remote::BillStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

/// A catalog page. A failed load is an empty page carrying the reason.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct BillListing {
    pub bills: Vec<Bill>,
    pub error: Option<String>,
}

pub struct BillCatalog<S: BillStore> {
    store: Arc<S>,
}

impl<S: BillStore> Clone for BillCatalog<S> {
    fn clone(&self) -> Self {
        BillCatalog {
            store: Arc::clone(&self.store),
        }
    }
}

/// `None`, blank and the `"all"` sentinel mean no filter.
pub fn category_filter(category: Option<&str>) -> Option<&str> {
    category.filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
}

impl<S: BillStore> BillCatalog<S> {
    pub fn new(store: Arc<S>) -> Self {
        BillCatalog { store }
    }

    pub async fn list_bills(&self, category: Option<&str>) -> Result<Vec<Bill>, BillpayError> {
        let filter = category_filter(category);
        let mut bills = self.store.list_bills(filter).await?;
        if let Some(category) = filter {
            // Exact, case-sensitive match regardless of how the service filtered.
            bills.retain(|b| b.category == category);
        }
        Ok(bills)
    }

    pub async fn browse(&self, category: Option<&str>) -> BillListing {
        match self.list_bills(category).await {
            Ok(bills) => BillListing { bills, error: None },
            Err(e) => {
                error!(error = %e, ?category, "bills fetch failed");
                BillListing {
                    bills: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn get_bill(&self, bill_id: &str) -> Result<Bill, BillpayError> {
        self.store
            .get_bill(bill_id)
            .await?
            .ok_or_else(|| BillpayError::BillNotFound(bill_id.to_string()))
    }

    /// `"all"` followed by each distinct non-empty category in first-seen order.
    pub async fn categories(&self) -> Result<Vec<String>, BillpayError> {
        let bills = self.store.list_bills(None).await?;
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        for bill in bills {
            if !bill.category.is_empty() && !categories.contains(&bill.category) {
                categories.push(bill.category);
            }
        }
        Ok(categories)
    }

    pub async fn recent_bills(&self) -> Result<Vec<Bill>, BillpayError> {
        self.store.recent_bills().await
    }

    pub async fn create_bill(&self, session: &Session, bill: NewBill) -> Result<String, BillpayError> {
        let identity = session.require_identity("/bills")?;
        validate_new_bill(&bill)?;
        let bill = NewBill {
            title: bill.title.trim().to_string(),
            category: bill.category.trim().to_string(),
            location: bill.location.trim().to_string(),
            ..bill
        };
        let id = self.store.create_bill(&bill).await?;
        info!(bill_id = %id, created_by = %identity.email, category = %bill.category, "bill created");
        Ok(id)
    }
}

fn validate_new_bill(bill: &NewBill) -> Result<(), BillpayError> {
    let mut errors = Vec::new();
    for (field, value) in [
        ("title", &bill.title),
        ("category", &bill.category),
        ("location", &bill.location),
    ] {
        if value.trim().is_empty() {
            errors.push(FieldError::required(field));
        }
    }
    if !bill.amount.is_finite() || bill.amount <= 0.0 {
        errors.push(FieldError::invalid("amount", "Amount must be greater than 0"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BillpayError::validation(errors))
    }
}
