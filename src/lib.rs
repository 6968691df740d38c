pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::BillpayError;
pub use crate::core::services::BillpayService;
pub use crate::core::statement::compute_statement;
pub use crate::infrastructure::notifications::in_memory::InMemoryNotifications;
pub use crate::infrastructure::remote::{http::RemoteStore, in_memory::InMemoryStore};

#[cfg(test)]
mod tests;
