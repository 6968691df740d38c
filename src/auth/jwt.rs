use crate::core::errors::BillpayError;
use crate::core::models::Identity;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Claims carried by the identity provider's ID token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IdTokenClaims {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub exp: usize,
}

pub struct IdentityVerifier {
    secret: String,
}

impl IdentityVerifier {
    pub fn new(secret: String) -> Self {
        IdentityVerifier { secret }
    }

    /// Issues a one-hour token for `identity`; used by local tooling and tests.
    pub fn issue(&self, identity: &Identity) -> Result<String, BillpayError> {
        let expiration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as usize + 3600)
            .map_err(|e| BillpayError::InvalidToken(format!("Time error: {}", e)))?;

        let claims = IdTokenClaims {
            email: identity.email.clone(),
            name: identity.display_name.clone(),
            picture: identity.photo_url.clone(),
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| BillpayError::InvalidToken(format!("JWT encoding error: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, BillpayError> {
        let token_data = decode::<IdTokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| BillpayError::InvalidToken(e.to_string()))?;

        let claims = token_data.claims;
        if claims.email.trim().is_empty() {
            return Err(BillpayError::InvalidToken("token carries no email".to_string()));
        }
        Ok(Identity {
            email: claims.email,
            display_name: claims.name,
            photo_url: claims.picture,
        })
    }
}
