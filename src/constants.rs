pub const ALL_CATEGORIES: &str = "all";

pub const LOGIN_PATH: &str = "/login";
pub const MY_BILLS_PATH: &str = "/my-bills";

pub const MIN_PHONE_LEN: usize = 6;

pub const PAYMENT_RECORDED: &str = "Payment recorded successfully";
pub const PAYMENT_UPDATED: &str = "Payment updated successfully";
pub const PAYMENT_DELETED: &str = "Payment deleted";
pub const PAYMENTS_LOAD_FAILED: &str = "Failed to load payments";

pub fn bill_path(bill_id: &str) -> String {
    format!("/bills/{}", bill_id)
}
