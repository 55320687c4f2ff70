//! Access-token inspection
//!
//! The client never verifies signatures (it does not hold the server key); it
//! only reads the `exp` claim to decide when to renew.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error("expiry claim out of range: {0}")]
    ExpiryOutOfRange(i64),
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: i64,
}

/// Read the expiry instant of a JWT without checking its signature
pub fn expiry(token: &str) -> Result<DateTime<Utc>, TokenError> {
    let header = decode_header(token)?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    // Signature checks are off, so the key is never consulted.
    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    DateTime::from_timestamp(data.claims.exp, 0).ok_or(TokenError::ExpiryOutOfRange(data.claims.exp))
}

/// Time to wait before renewing `token`: `exp - now - leeway`, floored at zero.
///
/// Undecodable tokens are treated as already expired.
pub fn refresh_delay(token: &str, now: DateTime<Utc>, leeway: Duration) -> Duration {
    match expiry(token) {
        Ok(exp) => delay_until(exp, now, leeway),
        Err(e) => {
            tracing::warn!(error = %e, "cannot read access token expiry; renewing now");
            Duration::ZERO
        }
    }
}

fn delay_until(exp: DateTime<Utc>, now: DateTime<Utc>, leeway: Duration) -> Duration {
    let leeway = chrono::Duration::from_std(leeway).unwrap_or(chrono::Duration::MAX);
    let renew_at = exp.checked_sub_signed(leeway).unwrap_or(DateTime::<Utc>::MIN_UTC);
    (renew_at - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;

    fn token_expiring_at(exp: i64) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &json!({"token_type": "access", "exp": exp, "user_id": 1}),
            &EncodingKey::from_secret(b"server-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_expiry_is_read_without_the_key() {
        let token = token_expiring_at(1_900_000_000);
        let exp = expiry(&token).unwrap();
        assert_eq!(exp.timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_missing_exp_is_malformed() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"user_id": 1}),
            &EncodingKey::from_secret(b"server-secret"),
        )
        .unwrap();
        assert!(matches!(expiry(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_delay_subtracts_leeway() {
        let now = Utc::now();
        let token = token_expiring_at(now.timestamp() + 600);
        let delay = refresh_delay(&token, now, Duration::from_secs(60));
        assert!(delay <= Duration::from_secs(540));
        assert!(delay > Duration::from_secs(538));
    }

    #[test]
    fn test_delay_is_zero_inside_leeway_or_expired() {
        let now = Utc::now();
        let almost = token_expiring_at(now.timestamp() + 30);
        assert_eq!(refresh_delay(&almost, now, Duration::from_secs(60)), Duration::ZERO);

        let expired = token_expiring_at(now.timestamp() - 3600);
        assert_eq!(refresh_delay(&expired, now, Duration::from_secs(60)), Duration::ZERO);
    }

    #[test]
    fn test_garbage_token_fails_closed() {
        assert!(expiry("not-a-jwt").is_err());
        assert_eq!(
            refresh_delay("not-a-jwt", Utc::now(), Duration::from_secs(60)),
            Duration::ZERO
        );
    }
}
