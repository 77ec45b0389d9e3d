//! Bearer-token authentication extraction

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use careslot_domain::CareslotError;

use crate::context::AppContext;
use crate::error::ApiError;

/// Extractor resolving the caller's bearer credential to a patient id.
///
/// Rejects with 401 when the header is absent, malformed, or the identity
/// verifier refuses the credential.
#[derive(Debug, Clone)]
pub struct AuthenticatedPatient(pub String);

impl FromRequestParts<Arc<AppContext>> for AuthenticatedPatient {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let credential = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                ApiError(CareslotError::Unauthenticated("missing bearer credential".to_string()))
            })?;

        let patient_ref = state.identity.verify(credential).await?;

        Ok(Self(patient_ref))
    }
}
