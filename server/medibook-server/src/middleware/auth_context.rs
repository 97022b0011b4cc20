//! Authentication context extraction
//!
//! [`AuthContext`] decodes the bearer token, reloads the identity it names
//! and rejects the request when either step fails. [`OptionalAuth`] runs the
//! same steps but never rejects. The role guards ([`PatientAuth`],
//! [`DoctorAuth`], [`AdminAuth`]) add the role check on top, so a handler's
//! signature states who may call it.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use database_layer::{Identity, Role};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::MediBookServer;

pub const NO_TOKEN: &str = "Access denied. No token provided.";
pub const INVALID_TOKEN: &str = "Invalid token.";
pub const UNKNOWN_IDENTITY: &str = "Invalid token. User not found.";

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Identity,
}

impl AuthContext {
    pub fn id(&self) -> Uuid {
        self.identity.id
    }

    pub fn role(&self) -> Role {
        self.identity.role()
    }
}

/// Bearer token from the Authorization header
fn extract_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::authentication(NO_TOKEN))
}

async fn authenticate(parts: &Parts, server: &MediBookServer) -> Result<AuthContext, ApiError> {
    let token = extract_token(parts)?;

    let claims = server.tokens.verify(token).map_err(|e| {
        debug!(error = %e, "Token verification failed");
        ApiError::authentication(INVALID_TOKEN)
    })?;

    let identity = server
        .store
        .find_identity(claims.sub)
        .await?
        .ok_or_else(|| ApiError::authentication(UNKNOWN_IDENTITY))?;

    if identity.role() != claims.role {
        debug!(identity_id = %identity.id, claimed = %claims.role, "Token role does not match identity");
        return Err(ApiError::authentication(INVALID_TOKEN));
    }

    Ok(AuthContext { identity })
}

#[async_trait]
impl FromRequestParts<MediBookServer> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        server: &MediBookServer,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, server).await
    }
}

/// Best-effort identity: `None` instead of a rejection
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthContext>);

#[async_trait]
impl FromRequestParts<MediBookServer> for OptionalAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        server: &MediBookServer,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, server).await.ok()))
    }
}

/// Permit `role` if it is one of `allowed`
pub fn authorize(role: Role, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(ApiError::authorization(format!(
            "Access denied. {role} role is not authorized."
        )))
    }
}

/// Extractor accepting only callers with the given role
macro_rules! role_guard {
    ($(#[$meta:meta])* $name:ident, $role:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthContext);

        #[async_trait]
        impl FromRequestParts<MediBookServer> for $name {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                server: &MediBookServer,
            ) -> Result<Self, Self::Rejection> {
                let auth = authenticate(parts, server).await?;
                authorize(auth.role(), &[$role])?;
                Ok(Self(auth))
            }
        }
    };
}

role_guard!(
    /// A patient (`user` role)
    PatientAuth,
    Role::Patient
);
role_guard!(DoctorAuth, Role::Doctor);
role_guard!(AdminAuth, Role::Admin);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/me");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_extract_token_strips_bearer_prefix() {
        assert_eq!(extract_token(&parts(Some("Bearer abc.def"))).unwrap(), "abc.def");
    }

    #[test]
    fn test_missing_or_malformed_header_is_rejected() {
        for header in [None, Some("Basic abc"), Some("Bearer ")] {
            let err = extract_token(&parts(header)).unwrap_err();
            assert_eq!(err.to_string(), NO_TOKEN);
        }
    }

    #[test]
    fn test_authorize() {
        assert!(authorize(Role::Admin, &[Role::Admin]).is_ok());
        assert!(authorize(Role::Doctor, &[Role::Patient, Role::Doctor]).is_ok());

        let err = authorize(Role::Patient, &[Role::Doctor]).unwrap_err();
        assert_eq!(err.to_string(), "Access denied. user role is not authorized.");
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
