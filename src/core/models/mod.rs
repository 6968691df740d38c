pub mod bill;
pub mod de;
pub mod identity;
pub mod notification;
pub mod payment;
pub mod statement;

pub use bill::{Bill, NewBill};
pub use identity::{Identity, UserRecord};
pub use notification::{Notification, NotificationLevel};
pub use payment::{NewPayment, Payment, PaymentChanges, PaymentForm, PaymentPatch};
pub use statement::Statement;
