//! JWT issuance and verification
//!
//! Tokens are HS256 signed and carry the identity id and role tag. The
//! gate in `middleware::auth_context` reloads the identity on every request,
//! so a token never outlives the account it names.

use chrono::{DateTime, Duration, Utc};
use database_layer::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Identity id
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Token rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),
}

/// Signs and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, identity_id: Uuid, role: Role) -> Result<String, TokenError> {
        self.issue_at(identity_id, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity_id: Uuid,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: identity_id,
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Check signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_verifies() {
        let service = TokenService::new("test-secret", 1);
        let id = Uuid::new_v4();
        let token = service.issue(id, Role::Doctor).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Doctor);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = TokenService::new("test-secret", 1);
        let token = service
            .issue_at(Uuid::new_v4(), Role::Patient, Utc::now() - Duration::hours(3))
            .unwrap();
        assert!(matches!(service.verify(&token), Err(TokenError::Rejected(_))));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let ours = TokenService::new("test-secret", 1);
        let theirs = TokenService::new("another-secret", 1);
        let token = theirs.issue(Uuid::new_v4(), Role::Admin).unwrap();
        assert!(ours.verify(&token).is_err());
        assert!(ours.verify("not-a-jwt").is_err());
    }
}
