use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Signed-in user as reported by the identity provider.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Identity {
            email: email.into(),
            display_name: None,
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }
}

/// The user document the bill service keeps, keyed by email.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserRecord {
    pub user: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

impl From<&Identity> for UserRecord {
    fn from(identity: &Identity) -> Self {
        UserRecord {
            user: identity.display_name.clone(),
            email: identity.email.clone(),
            image: identity.photo_url.clone(),
        }
    }
}
