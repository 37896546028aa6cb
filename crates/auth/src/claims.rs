use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims issued at login.
///
/// `sub` is the normalized user email; permissions are deliberately absent
/// and resolved from storage on every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    pub fn new(sub: impl Into<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self { sub: sub.into(), issued_at: now, expires_at: now + ttl }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token subject is empty")]
    EmptySubject,

    #[error("malformed or badly signed token: {0}")]
    Malformed(String),

    #[error("token could not be issued: {0}")]
    Encoding(String),
}

/// Deterministically validate JWT claims against `now`.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.sub.trim().is_empty() {
        return Err(TokenValidationError::EmptySubject);
    }
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Verifies bearer tokens for the HTTP layer.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HS256 shared-secret signer and validator.
pub struct Hs256JwtValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a token for `sub` valid for `ttl` from `now`.
    pub fn issue(&self, sub: &str, now: DateTime<Utc>, ttl: Duration) -> Result<String, TokenValidationError> {
        let claims = JwtClaims::new(sub, now, ttl);
        validate_claims(&claims, now)?;
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenValidationError::Encoding(e.to_string()))
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        // Time claims are RFC 3339 strings checked by `validate_claims`, not
        // the numeric `exp` the library looks for.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let data = decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_validate() {
        let jwt = Hs256JwtValidator::new("secret");
        let now = Utc::now();
        let token = jwt.issue("ana@totes.test", now, Duration::minutes(5)).unwrap();
        let claims = jwt.validate(&token, now + Duration::minutes(1)).unwrap();
        assert_eq!(claims.sub, "ana@totes.test");
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let jwt = Hs256JwtValidator::new("secret");
        let now = Utc::now();
        let token = jwt.issue("ana@totes.test", now, Duration::minutes(5)).unwrap();
        assert_eq!(
            jwt.validate(&token, now + Duration::minutes(6)),
            Err(TokenValidationError::Expired)
        );

        let other = Hs256JwtValidator::new("another-secret");
        assert!(matches!(other.validate(&token, now), Err(TokenValidationError::Malformed(_))));
        assert!(matches!(jwt.validate("garbage", now), Err(TokenValidationError::Malformed(_))));
    }

    #[test]
    fn claim_windows_are_checked() {
        let now = Utc::now();
        let mut claims = JwtClaims::new("a@b.co", now, Duration::minutes(1));
        assert_eq!(validate_claims(&claims, now - Duration::seconds(1)), Err(TokenValidationError::NotYetValid));
        claims.expires_at = claims.issued_at;
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::InvalidTimeWindow));
        let blank = JwtClaims::new(" ", now, Duration::minutes(1));
        assert_eq!(validate_claims(&blank, now), Err(TokenValidationError::EmptySubject));
    }
}
