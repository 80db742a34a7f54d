//! Token decoding and signature verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{JwtClaims, Principal, TokenValidationError, validate_claims};

/// Verifies a bearer token and produces the caller's principal.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>)
    -> Result<Principal, TokenValidationError>;
}

impl<T> JwtValidator for std::sync::Arc<T>
where
    T: JwtValidator + ?Sized,
{
    fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Principal, TokenValidationError> {
        (**self).validate(token, now)
    }
}

/// HS256 validator over a shared secret.
///
/// Time-window checks are done by [`validate_claims`] with the caller's
/// `now` rather than the decoder's clock, so validation stays deterministic
/// in tests.
pub struct Hs256JwtValidator {
    key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
        }
    }

    fn decode(&self, token: &str) -> Result<JwtClaims, TokenValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked deterministically in validate_claims.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<JwtClaims>(token, &self.key, &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenValidationError::Rejected(e.to_string()))
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Principal, TokenValidationError> {
        let claims = self.decode(token)?;
        validate_claims(&claims, now)?;
        Ok(Principal::from(&claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";

    fn mint(claims: &JwtClaims, secret: &[u8]) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn claims() -> JwtClaims {
        let now = Utc::now().timestamp();
        JwtClaims {
            sub: "acct-9".to_string(),
            email: "ortho@example.com".to_string(),
            iat: now - 30,
            exp: now + 3600,
        }
    }

    #[test]
    fn valid_token_yields_principal() {
        let validator = Hs256JwtValidator::new(SECRET);
        let token = mint(&claims(), SECRET);

        let principal = validator.validate(&token, Utc::now()).unwrap();
        assert_eq!(principal.subject, "acct-9");
        assert_eq!(principal.email, "ortho@example.com");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let validator = Hs256JwtValidator::new(SECRET);
        let token = mint(&claims(), b"other-secret");

        assert!(matches!(
            validator.validate(&token, Utc::now()),
            Err(TokenValidationError::Rejected(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let validator = Hs256JwtValidator::new(SECRET);
        let mut c = claims();
        c.exp = c.iat + 10;
        let token = mint(&c, SECRET);

        let way_later = Utc::now() + chrono::Duration::hours(2);
        assert_eq!(
            validator.validate(&token, way_later),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn garbage_token_is_rejected() {
        let validator = Hs256JwtValidator::new(SECRET);
        assert!(validator.validate("not.a.jwt", Utc::now()).is_err());
    }
}
