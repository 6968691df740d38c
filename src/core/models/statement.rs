use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Summary of one user's payment history. Always derived, never stored.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Statement {
    pub total_paid: f64,
    pub total_bills: usize,
    #[schema(value_type = Option<String>, example = "2024-01-10")]
    pub period_start: Option<NaiveDate>,
    #[schema(value_type = Option<String>, example = "2024-03-10")]
    pub period_end: Option<NaiveDate>,
    pub months: u32,
    pub avg_per_bill: f64,
    pub avg_monthly: f64,
    pub contact_phone: Option<String>,
}

impl Statement {
    pub const UNAVAILABLE: &'static str = "unavailable";

    /// Human readable period, e.g. "January 10, 2024 - March 10, 2024".
    pub fn period_label(&self) -> String {
        format!("{} - {}", label(self.period_start), label(self.period_end))
    }

    pub fn duration_label(&self) -> String {
        if self.months > 1 {
            format!("{} Months", self.months)
        } else {
            format!("{} Month", self.months)
        }
    }
}

fn label(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| Statement::UNAVAILABLE.to_string())
}
