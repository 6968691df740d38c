pub mod catalog;
pub mod clock;
pub mod errors;
pub mod models;
pub mod payments;
pub mod services;
pub mod statement;
