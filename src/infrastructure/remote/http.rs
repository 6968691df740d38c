use crate::core::errors::BillpayError;
use crate::core::models::{Bill, NewBill, NewPayment, Payment, PaymentChanges, UserRecord};
use crate::infrastructure::remote::{BillStore, PaymentStore};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Body the bill service sends with a failed write.
#[derive(Deserialize)]
struct RemoteErrorBody {
    message: Option<String>,
}

/// Talks to the bill service over HTTP. No caching and no retries.
#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: Url,
}

impl RemoteStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BillpayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BillpayError::Fetch(format!("Failed to build HTTP client: {}", e)))?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, BillpayError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BillpayError::Fetch(format!("Invalid bill service URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BillpayError::Fetch(format!("Invalid bill service URL {}", base_url)));
        }
        Ok(RemoteStore { client, base_url })
    }

    /// Appends each segment percent-encoded, so ids can never add path levels or a query.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BillpayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BillpayError::Fetch(format!("bill service responded with {}", status)));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BillpayError::Fetch(format!("Failed to decode response: {}", e)))
    }

    /// 404 and a `null` body both mean the record does not exist.
    async fn read_optional<T: DeserializeOwned>(response: Response) -> Result<Option<T>, BillpayError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read_json::<Option<T>>(response).await
    }

    /// Turns a write response into its JSON body, or the service's failure reason.
    async fn write_outcome(response: Response, fallback: &str) -> Result<Value, BillpayError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let reason = serde_json::from_str::<RemoteErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| fallback.to_string());
            warn!(%status, %reason, "bill service rejected write");
            return Err(BillpayError::Submission(reason));
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }
}

fn transport(fallback: &str) -> impl Fn(reqwest::Error) -> BillpayError + '_ {
    move |e| {
        warn!(error = %e, "bill service unreachable");
        BillpayError::Submission(format!("{}: {}", fallback, e))
    }
}

fn fetch_failed(e: reqwest::Error) -> BillpayError {
    BillpayError::Fetch(e.to_string())
}

/// Extracts the id from either a full record or an `insertedId` acknowledgment.
fn created_id(body: &Value) -> Option<String> {
    ["insertedId", "_id", "id"]
        .iter()
        .find_map(|key| body.get(*key))
        .and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// The stored record when echoed back, otherwise the request plus the acknowledged id.
fn stored_payment(body: Value, payment: &NewPayment, fallback: &str) -> Result<Payment, BillpayError> {
    if let Ok(stored) = serde_json::from_value::<Payment>(body.clone()) {
        return Ok(stored);
    }
    let id = created_id(&body)
        .ok_or_else(|| BillpayError::Submission(format!("{}: no id in acknowledgment", fallback)))?;
    debug!(payment_id = %id, "payment acknowledged");
    Ok(payment.clone().into_payment(id))
}

/// Mongo-style acknowledgments report how many documents matched.
fn updated_payment(body: Value, payment_id: &str) -> Result<Option<Payment>, BillpayError> {
    if body.get("matchedCount").and_then(Value::as_u64) == Some(0) {
        return Err(BillpayError::PaymentNotFound(payment_id.to_string()));
    }
    // An acknowledgment without the record leaves merging to the caller.
    Ok(serde_json::from_value::<Payment>(body).ok())
}

fn confirm_deleted(body: &Value, payment_id: &str) -> Result<(), BillpayError> {
    if body.get("deletedCount").and_then(Value::as_u64) == Some(0) {
        return Err(BillpayError::PaymentNotFound(payment_id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl BillStore for RemoteStore {
    async fn list_bills(&self, category: Option<&str>) -> Result<Vec<Bill>, BillpayError> {
        let mut request = self.client.get(self.url(&["bills"]));
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        let response = request.send().await.map_err(fetch_failed)?;
        Self::read_json(response).await
    }

    async fn get_bill(&self, bill_id: &str) -> Result<Option<Bill>, BillpayError> {
        let response = self
            .client
            .get(self.url(&["bills", bill_id]))
            .send()
            .await
            .map_err(fetch_failed)?;
        Self::read_optional(response).await
    }

    async fn recent_bills(&self) -> Result<Vec<Bill>, BillpayError> {
        let response = self
            .client
            .get(self.url(&["recent-bills"]))
            .send()
            .await
            .map_err(fetch_failed)?;
        Self::read_json(response).await
    }

    async fn create_bill(&self, bill: &NewBill) -> Result<String, BillpayError> {
        let fallback = "Failed to create bill";
        let response = self
            .client
            .post(self.url(&["bills"]))
            .json(bill)
            .send()
            .await
            .map_err(transport(fallback))?;
        let body = Self::write_outcome(response, fallback).await?;
        created_id(&body).ok_or_else(|| BillpayError::Submission(format!("{}: no id in acknowledgment", fallback)))
    }

    async fn register_user(&self, user: &UserRecord) -> Result<(), BillpayError> {
        let fallback = "Failed to save user";
        let response = self
            .client
            .post(self.url(&["users"]))
            .json(user)
            .send()
            .await
            .map_err(transport(fallback))?;
        // The service answers an existing email with an acknowledgment of its own; any success will do.
        Self::write_outcome(response, fallback).await.map(|_| ())
    }
}

#[async_trait]
impl PaymentStore for RemoteStore {
    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, BillpayError> {
        let fallback = "Payment failed";
        let response = self
            .client
            .post(self.url(&["payments"]))
            .json(payment)
            .send()
            .await
            .map_err(transport(fallback))?;
        let body = Self::write_outcome(response, fallback).await?;
        stored_payment(body, payment, fallback)
    }

    async fn list_payments(&self, email: &str) -> Result<Vec<Payment>, BillpayError> {
        let response = self
            .client
            .get(self.url(&["payments"]))
            .query(&[("email", email)])
            .send()
            .await
            .map_err(fetch_failed)?;
        Self::read_json(response).await
    }

    async fn update_payment(
        &self,
        payment_id: &str,
        changes: &PaymentChanges,
    ) -> Result<Option<Payment>, BillpayError> {
        let fallback = "Failed to update payment";
        let response = self
            .client
            .patch(self.url(&["payments", payment_id]))
            .json(changes)
            .send()
            .await
            .map_err(transport(fallback))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BillpayError::PaymentNotFound(payment_id.to_string()));
        }
        let body = Self::write_outcome(response, fallback).await?;
        updated_payment(body, payment_id)
    }

    async fn delete_payment(&self, payment_id: &str) -> Result<(), BillpayError> {
        let fallback = "Failed to delete payment";
        let response = self
            .client
            .delete(self.url(&["payments", payment_id]))
            .send()
            .await
            .map_err(transport(fallback))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BillpayError::PaymentNotFound(payment_id.to_string()));
        }
        let body = Self::write_outcome(response, fallback).await?;
        confirm_deleted(&body, payment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn response(status: u16, body: &str) -> Response {
        Response::from(
            http::Response::builder()
                .status(status)
                .body(body.to_string())
                .unwrap(),
        )
    }

    fn new_payment() -> NewPayment {
        NewPayment {
            bill_id: "b1".to_string(),
            email: "rahim@example.com".to_string(),
            username: "Rahim".to_string(),
            phone: "01711000000".to_string(),
            address: "Dhanmondi".to_string(),
            amount: 850.0,
            date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            additional_info: String::new(),
        }
    }

    #[test]
    fn joins_base_url_and_path_with_one_slash() {
        let store = RemoteStore::with_client(Client::new(), "http://localhost:3000/").unwrap();
        assert_eq!(store.url(&["bills"]).as_str(), "http://localhost:3000/bills");
        assert_eq!(store.url(&["payments", "p1"]).as_str(), "http://localhost:3000/payments/p1");

        let nested = RemoteStore::with_client(Client::new(), "http://localhost:3000/api").unwrap();
        assert_eq!(nested.url(&["recent-bills"]).as_str(), "http://localhost:3000/api/recent-bills");
    }

    #[test]
    fn ids_cannot_rewrite_the_upstream_path() {
        let store = RemoteStore::with_client(Client::new(), "http://localhost:3000").unwrap();
        let url = store.url(&["bills", "../users?admin=1"]);
        assert_eq!(url.as_str(), "http://localhost:3000/bills/..%2Fusers%3Fadmin=1");
        assert_eq!(url.query(), None);
        assert_eq!(url.path_segments().map(|s| s.count()), Some(2));
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            RemoteStore::with_client(Client::new(), "not a url"),
            Err(BillpayError::Fetch(_))
        ));
        assert!(RemoteStore::with_client(Client::new(), "mailto:bills@example.com").is_err());
    }

    #[test]
    fn reads_created_id_from_acknowledgment_or_record() {
        assert_eq!(created_id(&json!({ "acknowledged": true, "insertedId": "abc" })), Some("abc".to_string()));
        assert_eq!(created_id(&json!({ "_id": "def", "title": "Gas" })), Some("def".to_string()));
        assert_eq!(created_id(&json!({ "acknowledged": true })), None);
    }

    #[tokio::test]
    async fn failed_write_surfaces_service_message() {
        let err = RemoteStore::write_outcome(response(400, r#"{"message":"Duplicate payment"}"#), "Payment failed")
            .await
            .unwrap_err();
        assert!(matches!(err, BillpayError::Submission(ref reason) if reason == "Duplicate payment"));
    }

    #[tokio::test]
    async fn failed_write_without_message_uses_fallback() {
        for body in ["<html>Bad gateway</html>", "{}", ""] {
            let err = RemoteStore::write_outcome(response(502, body), "Payment failed")
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Payment failed");
        }
    }

    #[tokio::test]
    async fn successful_write_returns_body_or_null() {
        let body = RemoteStore::write_outcome(response(200, r#"{"insertedId":"p7"}"#), "Payment failed")
            .await
            .unwrap();
        assert_eq!(body, json!({ "insertedId": "p7" }));
        let empty = RemoteStore::write_outcome(response(204, ""), "Payment failed").await.unwrap();
        assert_eq!(empty, Value::Null);
    }

    #[tokio::test]
    async fn missing_bill_reads_as_none() {
        assert_eq!(RemoteStore::read_optional::<Bill>(response(404, "")).await.unwrap(), None);
        assert_eq!(RemoteStore::read_optional::<Bill>(response(200, "null")).await.unwrap(), None);

        let bill = RemoteStore::read_optional::<Bill>(response(200, r#"{"_id":"b1","title":"Gas","amount":"900"}"#))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bill.id, "b1");
        assert_eq!(bill.amount, 900.0);
    }

    #[tokio::test]
    async fn failed_read_is_a_fetch_error() {
        let err = RemoteStore::read_json::<Vec<Bill>>(response(500, "oops")).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to load data: bill service responded with 500 Internal Server Error");
        let err = RemoteStore::read_json::<Vec<Bill>>(response(200, "not json")).await.unwrap_err();
        assert!(matches!(err, BillpayError::Fetch(_)));
    }

    #[test]
    fn acknowledged_payment_keeps_request_fields() {
        let payment = stored_payment(json!({ "acknowledged": true, "insertedId": "p7" }), &new_payment(), "Payment failed")
            .unwrap();
        assert_eq!(payment.id, "p7");
        assert_eq!(payment.amount, 850.0);
        assert_eq!(payment.date, NaiveDate::from_ymd_opt(2024, 6, 2));

        let err = stored_payment(json!({ "acknowledged": true }), &new_payment(), "Payment failed").unwrap_err();
        assert_eq!(err.to_string(), "Payment failed: no id in acknowledgment");
    }

    #[test]
    fn echoed_payment_is_taken_as_stored() {
        let echoed = json!({
            "_id": "p8", "billId": "b1", "email": "rahim@example.com",
            "amount": 900, "date": "2024-06-03"
        });
        let payment = stored_payment(echoed, &new_payment(), "Payment failed").unwrap();
        assert_eq!(payment.id, "p8");
        assert_eq!(payment.amount, 900.0);
    }

    #[test]
    fn zero_matched_or_deleted_means_not_found() {
        assert!(matches!(
            updated_payment(json!({ "acknowledged": true, "matchedCount": 0, "modifiedCount": 0 }), "p1"),
            Err(BillpayError::PaymentNotFound(id)) if id == "p1"
        ));
        assert_eq!(
            updated_payment(json!({ "acknowledged": true, "matchedCount": 1, "modifiedCount": 1 }), "p1").unwrap(),
            None
        );
        assert!(matches!(
            confirm_deleted(&json!({ "acknowledged": true, "deletedCount": 0 }), "p2"),
            Err(BillpayError::PaymentNotFound(id)) if id == "p2"
        ));
        assert!(confirm_deleted(&json!({ "acknowledged": true, "deletedCount": 1 }), "p2").is_ok());
        assert!(confirm_deleted(&Value::Null, "p2").is_ok());
    }
}
