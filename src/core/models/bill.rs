use super::de::{lenient_amount, parse_date, string_or_empty};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Bill {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub location: String,
    /// Issue date as stored by the bill service, normally `YYYY-MM-DD`
    #[serde(default, deserialize_with = "string_or_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub image: String,
}

impl Bill {
    /// `None` when the stored date cannot be read.
    pub fn issued_on(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NewBill {
    pub title: String,
    pub category: String,
    pub amount: f64,
    pub location: String,
    #[serde(with = "date_format")]
    #[schema(value_type = String, example = "2024-06-01")]
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl NewBill {
    pub fn into_bill(self, id: String) -> Bill {
        Bill {
            id,
            title: self.title,
            category: self.category,
            amount: self.amount,
            location: self.location,
            date: self.date.format(date_format::FORMAT).to_string(),
            description: self.description,
            image: self.image,
        }
    }
}

pub(crate) mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        super::super::de::flexible_date(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_bill_with_mongo_style_id() {
        let bill: Bill = serde_json::from_value(json!({
            "_id": "652f1c",
            "title": "DESCO Electricity",
            "category": "Electricity",
            "amount": "1450",
            "location": "Mirpur, Dhaka",
            "date": "2024-06-05",
            "description": "Monthly electricity bill",
            "image": "https://example.com/desco.png"
        }))
        .unwrap();
        assert_eq!(bill.id, "652f1c");
        assert_eq!(bill.amount, 1450.0);
        assert_eq!(bill.issued_on(), NaiveDate::from_ymd_opt(2024, 6, 5));
    }

    #[test]
    fn unreadable_bill_date_is_not_an_error() {
        let bill: Bill = serde_json::from_value(json!({ "id": "b1", "title": "Gas", "date": "soon" })).unwrap();
        assert_eq!(bill.issued_on(), None);
        assert_eq!(bill.category, "");
    }
}
