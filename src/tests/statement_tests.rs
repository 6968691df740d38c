use crate::auth::session::Session;
use crate::core::errors::BillpayError;
use crate::core::models::{NotificationLevel, PaymentPatch};
use crate::core::statement::{Confirmation, StatementBook, compute_statement};
use crate::infrastructure::notifications::in_memory::InMemoryNotifications;
use crate::infrastructure::remote::PaymentStore;
use crate::infrastructure::remote::in_memory::InMemoryStore;
use crate::tests::{create_test_service_with, payment, signed_in};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const OWNER: &str = "owner@example.com";

async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.seed_payment(payment("p1", OWNER, 100.0, "2024-01-10")).await;
    store.seed_payment(payment("p2", OWNER, 200.0, "2024-03-10")).await;
    store.seed_payment(payment("p3", OWNER, 300.0, "2024-02-10")).await;
    store.seed_payment(payment("px", "someone@else.com", 999.0, "2024-02-01")).await;
    store
}

async fn loaded_book(store: &InMemoryStore, notifier: &InMemoryNotifications) -> StatementBook {
    let mut book = StatementBook::new(OWNER);
    book.load(store, notifier).await.unwrap();
    book
}

#[tokio::test]
async fn test_load_only_owner_payments() {
    let store = seeded_store().await;
    let book = loaded_book(&store, &InMemoryNotifications::new()).await;
    assert_eq!(book.payments().len(), 3);
    let statement = book.statement();
    assert_eq!(statement.total_paid, 600.0);
    assert_eq!(statement.total_bills, 3);
    assert_eq!(statement.period_start, NaiveDate::from_ymd_opt(2024, 1, 10));
    assert_eq!(statement.period_end, NaiveDate::from_ymd_opt(2024, 3, 10));
    assert_eq!(statement.months, 2);
    assert_eq!(statement.avg_per_bill, 200.0);
    assert_eq!(statement.avg_monthly, 300.0);
}

#[tokio::test]
async fn test_update_payment_recomputes_statement() {
    let store = seeded_store().await;
    let notifier = InMemoryNotifications::new();
    let mut book = loaded_book(&store, &notifier).await;

    let patch = PaymentPatch {
        amount: Some("400".to_string()),
        phone: Some("01999888777".to_string()),
        ..Default::default()
    };
    let updated = book.update_payment(&store, &notifier, "p1", &patch).await.unwrap();

    assert_eq!(updated.amount, 400.0);
    assert_eq!(updated.phone, "01999888777");
    // The bill reference is untouched; amounts may drift from the bill.
    assert_eq!(updated.bill_id, "b1");
    assert_eq!(book.statement().total_paid, 900.0);
    assert_eq!(book.statement().avg_per_bill, 300.0);
    assert_eq!(store.payment("p1").await.unwrap().amount, 400.0);
}

#[tokio::test]
async fn test_update_date_moves_period() {
    let store = seeded_store().await;
    let notifier = InMemoryNotifications::new();
    let mut book = loaded_book(&store, &notifier).await;

    let patch = PaymentPatch {
        date: Some("2024-06-08".to_string()),
        ..Default::default()
    };
    book.update_payment(&store, &notifier, "p2", &patch).await.unwrap();

    assert_eq!(book.statement().period_end, NaiveDate::from_ymd_opt(2024, 6, 8));
    // 150 days / 30
    assert_eq!(book.statement().months, 5);
}

#[tokio::test]
async fn test_update_with_non_numeric_amount_makes_no_network_call() {
    let store = seeded_store().await;
    let notifier = InMemoryNotifications::new();
    let mut book = loaded_book(&store, &notifier).await;
    let calls_after_load = store.call_count();

    let patch = PaymentPatch {
        amount: Some("a lot".to_string()),
        ..Default::default()
    };
    let err = book.update_payment(&store, &notifier, "p1", &patch).await.unwrap_err();

    assert_eq!(err.fields(), vec!["amount"]);
    assert_eq!(store.call_count(), calls_after_load);
    assert_eq!(book.statement().total_paid, 600.0);
}

#[tokio::test]
async fn test_service_update_validates_before_loading_history() {
    let store = seeded_store().await;
    let service = create_test_service_with(store.clone());
    let patch = PaymentPatch {
        phone: Some("123".to_string()),
        ..Default::default()
    };
    let err = service.update_payment(&signed_in(OWNER), "p1", &patch).await.unwrap_err();
    assert_eq!(err.fields(), vec!["phone"]);
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_update_someone_elses_payment_is_not_found() {
    let store = seeded_store().await;
    let notifier = InMemoryNotifications::new();
    let mut book = loaded_book(&store, &notifier).await;
    let calls_after_load = store.call_count();

    let patch = PaymentPatch {
        amount: Some("1".to_string()),
        ..Default::default()
    };
    let err = book.update_payment(&store, &notifier, "px", &patch).await.unwrap_err();
    assert!(matches!(err, BillpayError::PaymentNotFound(id) if id == "px"));
    assert_eq!(store.call_count(), calls_after_load);
    assert_eq!(store.payment("px").await.unwrap().amount, 999.0);
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let store = seeded_store().await;
    let notifier = InMemoryNotifications::new();
    let mut book = loaded_book(&store, &notifier).await;
    let calls_after_load = store.call_count();

    let err = book
        .delete_payment(&store, &notifier, "p2", Confirmation::Withheld)
        .await
        .unwrap_err();

    assert!(matches!(err, BillpayError::ConfirmationRequired(_)));
    assert_eq!(store.call_count(), calls_after_load);
    assert_eq!(book.payments().len(), 3);
    assert!(store.payment("p2").await.is_some());
}

#[tokio::test]
async fn test_delete_removes_exactly_one_payment() {
    let store = seeded_store().await;
    let notifier = InMemoryNotifications::new();
    let mut book = loaded_book(&store, &notifier).await;
    let before: Vec<_> = book.payments().iter().filter(|p| p.id != "p2").cloned().collect();

    book.delete_payment(&store, &notifier, "p2", Confirmation::Granted)
        .await
        .unwrap();

    assert_eq!(book.payments(), before.as_slice());
    assert!(store.payment("p2").await.is_none());
    assert!(store.payment("p1").await.is_some());
    assert_eq!(book.statement().total_paid, 400.0);
    assert_eq!(book.statement().period_end, NaiveDate::from_ymd_opt(2024, 2, 10));
    assert_eq!(book.statement().months, 1);
}

#[tokio::test]
async fn test_failed_delete_leaves_local_set_untouched() {
    let store = seeded_store().await;
    let notifier = InMemoryNotifications::new();
    let mut book = loaded_book(&store, &notifier).await;
    store.set_fail_writes(true);

    let err = book
        .delete_payment(&store, &notifier, "p1", Confirmation::Granted)
        .await
        .unwrap_err();

    assert!(matches!(err, BillpayError::Submission(_)));
    assert_eq!(book.payments().len(), 3);
    assert_eq!(book.statement().total_paid, 600.0);
    let toasts = notifier.snapshot().await;
    assert_eq!(toasts.last().map(|t| t.level), Some(NotificationLevel::Error));
}

#[tokio::test]
async fn test_service_delete_without_confirmation_makes_no_network_call() {
    let store = seeded_store().await;
    let service = create_test_service_with(store.clone());
    let err = service
        .delete_payment(&signed_in(OWNER), "p1", Confirmation::from(false))
        .await
        .unwrap_err();
    assert!(matches!(err, BillpayError::ConfirmationRequired(_)));
    assert_eq!(store.call_count(), 0);

    let book = service
        .delete_payment(&signed_in(OWNER), "p1", Confirmation::from(true))
        .await
        .unwrap();
    assert_eq!(book.statement().total_bills, 2);
}

#[tokio::test]
async fn test_statement_requires_login() {
    let service = create_test_service_with(seeded_store().await);
    let err = service.my_bills(&Session::anonymous()).await.unwrap_err();
    assert!(matches!(err, BillpayError::Unauthenticated { ref return_to } if return_to == "/my-bills"));
}

#[tokio::test]
async fn test_my_bills_degrades_to_empty_statement_when_offline() {
    let store = seeded_store().await;
    store.set_offline(true);
    let service = create_test_service_with(store.clone());

    let view = service.my_bills(&signed_in(OWNER)).await.unwrap();

    assert_eq!(view.error.as_deref(), Some("Failed to load data: bill service unreachable"));
    assert!(view.book.payments().is_empty());
    assert_eq!(view.book.statement(), &compute_statement(&[]));
    assert_eq!(store.call_count(), 1);

    let toasts = service.notifications(&signed_in(OWNER)).await.unwrap();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, NotificationLevel::Error);
}

#[tokio::test]
async fn test_my_bills_renders_undated_payment() {
    let store = seeded_store().await;
    let mut undated = payment("p4", OWNER, 50.0, "2024-01-01");
    undated.date = None;
    store.seed_payment(undated).await;
    let service = create_test_service_with(store);

    let view = service.my_bills(&signed_in(OWNER)).await.unwrap();

    assert!(view.error.is_none());
    assert_eq!(view.book.payments().len(), 4);
    assert_eq!(view.book.statement().total_paid, 650.0);
    assert_eq!(view.book.statement().period_start, NaiveDate::from_ymd_opt(2024, 1, 10));
}

#[tokio::test(start_paused = true)]
async fn test_shared_book_keeps_newest_load() {
    let slow = seeded_store().await.with_latency(Duration::from_millis(500));
    let fast = InMemoryStore::new();
    fast.seed_payment(payment("p9", OWNER, 75.0, "2024-05-01")).await;
    let book = Arc::new(Mutex::new(StatementBook::new(OWNER)));

    let refresh = |store: InMemoryStore| {
        let book = Arc::clone(&book);
        async move {
            let ticket = book.lock().await.begin_load();
            let payments = store.list_payments(OWNER).await.unwrap();
            book.lock().await.apply_load(ticket, payments)
        }
    };
    let (older, newer) = tokio::join!(refresh(slow), refresh(fast));

    assert!(!older);
    assert!(newer);
    let book = book.lock().await;
    assert_eq!(book.payments().len(), 1);
    assert_eq!(book.statement().total_paid, 75.0);
}

#[tokio::test]
async fn test_failed_load_surfaces_error_and_keeps_empty_state() {
    let store = seeded_store().await;
    store.set_offline(true);
    let notifier = InMemoryNotifications::new();
    let mut book = StatementBook::new(OWNER);

    let err = book.load(&store, &notifier).await.unwrap_err();
    assert!(matches!(err, BillpayError::Fetch(_)));
    assert!(book.payments().is_empty());
    assert_eq!(book.statement().months, 1);
    assert_eq!(notifier.snapshot().await.len(), 1);
}
