mod statement_tests;

use crate::core::clock::FixedClock;
use crate::core::models::{Bill, Identity, Payment};
use crate::core::services::BillpayService;
use crate::auth::session::Session;
use crate::infrastructure::notifications::in_memory::InMemoryNotifications;
use crate::infrastructure::remote::in_memory::InMemoryStore;
use chrono::NaiveDate;
use std::sync::Arc;

pub type TestService = BillpayService<InMemoryStore, InMemoryNotifications>;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

/// Service over a fresh store whose clock is pinned to [`today`].
pub fn create_test_service() -> TestService {
    create_test_service_with(InMemoryStore::new())
}

pub fn create_test_service_with(store: InMemoryStore) -> TestService {
    BillpayService::with_clock(store, InMemoryNotifications::new(), Arc::new(FixedClock(today())))
}

pub fn signed_in(email: &str) -> Session {
    Session::signed_in(Identity::new(email).with_display_name("Test User"))
}

pub fn bill(id: &str, category: &str, amount: f64, date: &str) -> Bill {
    Bill {
        id: id.to_string(),
        title: format!("{} bill", category),
        category: category.to_string(),
        amount,
        location: "Dhaka".to_string(),
        date: date.to_string(),
        description: String::new(),
        image: String::new(),
    }
}

pub fn payment(id: &str, email: &str, amount: f64, date: &str) -> Payment {
    Payment {
        id: id.to_string(),
        bill_id: "b1".to_string(),
        email: email.to_string(),
        username: "Test User".to_string(),
        phone: "01711000000".to_string(),
        address: "Banani".to_string(),
        amount,
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        additional_info: String::new(),
    }
}
