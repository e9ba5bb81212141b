//! JWT expiry helpers
//!
//! Tokens are issued by the rental API; this module only reads the `exp` claim
//! out of the payload. Signatures are not verified.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::cache::Clock;

/// Errors that can occur when reading a token's expiry
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token is not three dot-separated segments
    #[error("Malformed token: expected header.payload.signature")]
    Malformed,

    /// Payload segment is not valid base64url
    #[error("Failed to decode token payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Payload is not a JSON claims object
    #[error("Failed to parse token claims: {0}")]
    Claims(#[from] serde_json::Error),

    /// Payload has no usable `exp` claim
    #[error("Token has no valid expiry claim")]
    MissingExpiry,
}

#[derive(Debug, Deserialize)]
struct Claims {
    /// Seconds since the epoch; JWT NumericDate may be fractional
    exp: Option<f64>,
}

/// Reads the expiry instant from a JWT's `exp` claim
pub fn token_expiry(token: &str) -> Result<DateTime<Utc>, TokenError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(TokenError::Malformed),
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let claims: Claims = serde_json::from_slice(&bytes)?;
    let exp = claims.exp.ok_or(TokenError::MissingExpiry)?;
    if !exp.is_finite() {
        return Err(TokenError::MissingExpiry);
    }

    DateTime::from_timestamp_millis((exp * 1000.0) as i64).ok_or(TokenError::MissingExpiry)
}

/// Returns whether the token is past its expiry
///
/// A token whose expiry cannot be read counts as expired.
pub fn is_token_expired(token: &str, clock: &impl Clock) -> bool {
    match token_expiry(token) {
        Ok(expiry) => clock.now() >= expiry,
        Err(e) => {
            debug!(error = %e, "Treating unreadable token as expired");
            true
        }
    }
}

/// Returns how long the token stays valid, or `None` if it is expired or unreadable
pub fn time_until_expiry(token: &str, clock: &impl Clock) -> Option<Duration> {
    let expiry = token_expiry(token).ok()?;
    let remaining = expiry - clock.now();
    remaining.to_std().ok().filter(|d| !d.is_zero())
}
