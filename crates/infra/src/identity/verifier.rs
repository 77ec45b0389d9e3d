//! Bearer credential verification.
//!
//! Credentials are JWTs minted by the identity provider sitting in front of
//! this service; the gateway has already checked the signature, so this
//! verifier enforces shape and expiry and extracts the subject claim as the
//! patient identifier.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use careslot_core::IdentityVerifier;
use careslot_domain::{CareslotError, Result};
use chrono::Utc;
use serde_json::Value;

const DEFAULT_LEEWAY_SECONDS: i64 = 30;

/// JWT-claim based identity verifier
pub struct BearerIdentityVerifier {
    leeway_seconds: i64,
}

impl BearerIdentityVerifier {
    /// Create a verifier with the given expiry leeway.
    pub fn new(leeway_seconds: i64) -> Self {
        Self { leeway_seconds }
    }
}

impl Default for BearerIdentityVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_LEEWAY_SECONDS)
    }
}

#[async_trait]
impl IdentityVerifier for BearerIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<String> {
        let claims = decode_claims(credential)?;

        if let Some(exp) = claims.get("exp").and_then(Value::as_i64) {
            if exp + self.leeway_seconds < Utc::now().timestamp() {
                return Err(CareslotError::Unauthenticated("credential expired".to_string()));
            }
        }

        claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|sub| !sub.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                CareslotError::Unauthenticated("subject claim missing from credential".to_string())
            })
    }
}

fn decode_claims(credential: &str) -> Result<Value> {
    let parts: Vec<&str> = credential.split('.').collect();
    if parts.len() != 3 {
        return Err(CareslotError::Unauthenticated("invalid credential format".to_string()));
    }

    let payload_bytes = URL_SAFE_NO_PAD.decode(parts[1]).map_err(|err| {
        CareslotError::Unauthenticated(format!("failed to decode credential payload: {err}"))
    })?;
    let payload_str = String::from_utf8(payload_bytes).map_err(|err| {
        CareslotError::Unauthenticated(format!("invalid UTF-8 in credential payload: {err}"))
    })?;

    serde_json::from_str(&payload_str).map_err(|err| {
        CareslotError::Unauthenticated(format!("failed to parse credential payload: {err}"))
    })
}
