//! Bearer token identity.
//!
//! Tokens are HS256 JWTs whose `sub` is the member id. Verification is a
//! local signature and expiry check, so it never blocks.

use std::time::Duration;

use chrono::Utc;
use engine::{IdentityVerifier, MemberId, VerifyError};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Member id, as a string.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: DEFAULT_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Signs a token for `member_id` valid for the configured lifetime.
    pub fn issue(&self, member_id: MemberId) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        self.sign(&Claims {
            sub: member_id.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, credential: &str) -> Result<MemberId, VerifyError> {
        let data = decode::<Claims>(credential, &self.decoding, &self.validation).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                other => VerifyError::Invalid(format!("{other:?}")),
            },
        )?;
        data.claims
            .sub
            .parse()
            .map_err(|_| VerifyError::Invalid(format!("bad subject: {}", data.claims.sub)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let jwt = JwtVerifier::new("secret");
        let token = jwt.issue(42).unwrap();
        assert_eq!(jwt.verify(&token), Ok(42));
    }

    #[test]
    fn expired_token_is_distinguished() {
        let jwt = JwtVerifier::new("secret");
        let now = Utc::now().timestamp();
        let token = jwt
            .sign(&Claims {
                sub: "1".to_string(),
                iat: now - 120,
                exp: now - 60,
            })
            .unwrap();
        assert_eq!(jwt.verify(&token), Err(VerifyError::Expired));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let token = JwtVerifier::new("other").issue(1).unwrap();
        let err = JwtVerifier::new("secret").verify(&token).unwrap_err();
        assert!(matches!(err, VerifyError::Invalid(_)));
        assert!(matches!(
            JwtVerifier::new("secret").verify("garbage"),
            Err(VerifyError::Invalid(_))
        ));
    }
}
