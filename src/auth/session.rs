use crate::constants::bill_path;
use crate::core::errors::BillpayError;
use crate::core::models::Identity;

/// Who is using the app right now. Passed explicitly to every operation that needs
/// an identity; anonymous until [`Session::sign_in`], cleared by [`Session::sign_out`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
}

impl Session {
    pub fn anonymous() -> Self {
        Session { identity: None }
    }

    pub fn signed_in(identity: Identity) -> Self {
        let mut session = Session::anonymous();
        session.sign_in(identity);
        session
    }

    pub fn sign_in(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub fn sign_out(&mut self) {
        self.identity = None;
    }

    /// The identity, if it carries a usable email.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref().filter(|i| i.has_email())
    }

    pub fn email(&self) -> Option<&str> {
        self.identity().map(|i| i.email.as_str())
    }

    /// Fails with `Unauthenticated`, remembering where to come back to after login.
    pub fn require_identity(&self, return_to: &str) -> Result<&Identity, BillpayError> {
        self.identity().ok_or_else(|| BillpayError::Unauthenticated {
            return_to: return_to.to_string(),
        })
    }

    pub fn require_identity_for_bill(&self, bill_id: &str) -> Result<&Identity, BillpayError> {
        self.require_identity(&bill_path(bill_id))
    }
}
