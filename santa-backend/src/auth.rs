use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Decides whether a presented admin credential is valid.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, provided: &str) -> bool;
}

/// Accepts exactly one configured password.
pub struct StaticPassword {
    expected: String,
}

impl StaticPassword {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

impl CredentialVerifier for StaticPassword {
    fn verify(&self, provided: &str) -> bool {
        let expected = self.expected.as_bytes();
        let provided = provided.as_bytes();
        if expected.is_empty() || expected.len() != provided.len() {
            return false;
        }
        expected
            .iter()
            .zip(provided)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Extractor guarding admin routes.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(ADMIN_PASSWORD_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        if !state.verifier.verify(provided) {
            warn!("rejected admin credential for {} {}", parts.method, parts.uri.path());
            return Err(ApiError::Unauthorized);
        }
        Ok(AdminAuth)
    }
}
