pub mod notifications;
pub mod remote;
