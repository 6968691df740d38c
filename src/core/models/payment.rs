use super::bill::date_format;
use super::de::{lenient_amount, lenient_date, string_or_empty};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored payment. Field names on the wire follow the bill service's documents.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Payment {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "billId")]
    pub bill_id: String,
    pub email: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub username: String,
    #[serde(rename = "Phone", default, deserialize_with = "string_or_empty")]
    pub phone: String,
    #[serde(rename = "Address", default, deserialize_with = "string_or_empty")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    /// `None` when the stored date is missing or unreadable
    #[serde(default, serialize_with = "optional_date", deserialize_with = "lenient_date")]
    #[schema(value_type = Option<String>, example = "2024-06-01")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "additionalInfo", default, deserialize_with = "string_or_empty")]
    pub additional_info: String,
}

impl Payment {
    /// Folds validated changes into this record.
    pub fn apply(&mut self, changes: &PaymentChanges) {
        if let Some(amount) = changes.amount {
            self.amount = amount;
        }
        if let Some(address) = &changes.address {
            self.address = address.clone();
        }
        if let Some(phone) = &changes.phone {
            self.phone = phone.clone();
        }
        if let Some(date) = changes.date {
            self.date = Some(date);
        }
    }
}

/// Append payload; the store assigns the id.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NewPayment {
    #[serde(rename = "billId")]
    pub bill_id: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Address")]
    pub address: String,
    pub amount: f64,
    #[serde(with = "date_format")]
    #[schema(value_type = String, example = "2024-06-01")]
    pub date: NaiveDate,
    #[serde(rename = "additionalInfo")]
    pub additional_info: String,
}

impl NewPayment {
    pub fn into_payment(self, id: String) -> Payment {
        Payment {
            id,
            bill_id: self.bill_id,
            email: self.email,
            username: self.username,
            phone: self.phone,
            address: self.address,
            amount: self.amount,
            date: Some(self.date),
            additional_info: self.additional_info,
        }
    }
}

/// What the payer types into the payment form.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PaymentForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub info: Option<String>,
}

/// Raw edit-form input; every field is text as typed and optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PaymentPatch {
    pub amount: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
}

/// A validated [`PaymentPatch`], serialized as the partial document sent to the store.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct PaymentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "Address", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "Phone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "optional_date")]
    pub date: Option<NaiveDate>,
}

impl PaymentChanges {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.address.is_none() && self.phone.is_none() && self.date.is_none()
    }
}

fn optional_date<S: serde::Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => date_format::serialize(d, serializer),
        None => serializer.serialize_none(),
    }
}
