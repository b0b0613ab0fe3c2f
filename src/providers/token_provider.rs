use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::config::SecretManager;
use crate::errors::InternalError;
use crate::errors::internal::JwtValidationError;
use crate::providers::clock::Clock;
use crate::types::internal::auth::{Claims, IssuedTokens, TokenIdentity, TokenType};

/// Mints and verifies HS256 access/refresh token pairs
///
/// Access and refresh tokens are signed with different secrets and carry a
/// `token_type` claim, so neither can stand in for the other. Claims hold role
/// names only; permissions are resolved on every request.
pub struct TokenProvider {
    secret_manager: Arc<SecretManager>,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl TokenProvider {
    pub fn new(
        secret_manager: Arc<SecretManager>,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            secret_manager,
            access_ttl_seconds,
            refresh_ttl_seconds,
            clock,
        }
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    /// Mint a fresh access/refresh pair for the identity
    pub fn issue(&self, identity: &TokenIdentity) -> Result<IssuedTokens, InternalError> {
        let now = self.clock.now_timestamp();

        let access_claims = self.claims(identity, TokenType::Access, now, self.access_ttl_seconds);
        let refresh_claims =
            self.claims(identity, TokenType::Refresh, now, self.refresh_ttl_seconds);

        let access_token = sign(&access_claims, self.secret_manager.jwt_access_secret())?;
        let refresh_token = sign(&refresh_claims, self.secret_manager.jwt_refresh_secret())?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expires_in: self.access_ttl_seconds,
            access_jti: access_claims.jti,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, InternalError> {
        self.verify(token, self.secret_manager.jwt_access_secret(), TokenType::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, InternalError> {
        self.verify(token, self.secret_manager.jwt_refresh_secret(), TokenType::Refresh)
    }

    fn claims(&self, identity: &TokenIdentity, token_type: TokenType, now: i64, ttl: i64) -> Claims {
        Claims {
            sub: identity.user_id.clone(),
            username: identity.username.clone(),
            email: identity.email.clone(),
            roles: identity.roles.clone(),
            facility_id: identity.facility_id.clone(),
            token_type,
            iat: now,
            exp: now + ttl,
            jti: Uuid::new_v4().to_string(),
        }
    }

    fn verify(
        &self,
        token: &str,
        secret: &str,
        expected: TokenType,
    ) -> Result<Claims, InternalError> {
        // Expiry is checked against the provider clock below
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map_err(JwtValidationError::from_jwt)?
            .claims;

        if claims.exp <= self.clock.now_timestamp() {
            return Err(JwtValidationError::expired().into());
        }
        if claims.token_type != expected {
            return Err(JwtValidationError::wrong_type(expected).into());
        }

        Ok(claims)
    }
}

fn sign(claims: &Claims, secret: &str) -> Result<String, InternalError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| InternalError::crypto("jwt_generation", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::internal::JwtFailClass;
    use crate::providers::clock::ManualClock;
    use chrono::{Duration, Utc};

    fn provider(clock: Arc<ManualClock>) -> TokenProvider {
        let secrets = SecretManager::new(
            "access-secret-0123456789abcdefghijkl",
            "refresh-secret-0123456789abcdefghijk",
            "pepper-0123456789",
        )
        .unwrap();
        TokenProvider::new(Arc::new(secrets), 900, 604_800, clock)
    }

    fn identity() -> TokenIdentity {
        TokenIdentity {
            user_id: "user-1".to_string(),
            username: "nurse.kim".to_string(),
            email: "kim@example.org".to_string(),
            roles: vec!["Nurse".to_string()],
            facility_id: Some("fac-a".to_string()),
        }
    }

    fn class_of(err: InternalError) -> JwtFailClass {
        match err {
            InternalError::JWTValidation(e) => e.class,
            other => panic!("expected a token validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_issue_then_verify_access() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let tokens_provider = provider(clock);
        let tokens = tokens_provider.issue(&identity()).unwrap();
        assert_eq!(tokens.expires_in, 900);

        let claims = tokens_provider.verify_access(&tokens.access_token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.roles, vec!["Nurse".to_string()]);
        assert_eq!(claims.facility_id.as_deref(), Some("fac-a"));
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.jti, tokens.access_jti);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_rejected_as_access_token() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let tokens_provider = provider(clock);
        let tokens = tokens_provider.issue(&identity()).unwrap();

        assert!(tokens_provider.verify_access(&tokens.refresh_token).is_err());
        assert!(tokens_provider.verify_refresh(&tokens.access_token).is_err());
        assert!(tokens_provider.verify_refresh(&tokens.refresh_token).is_ok());
    }

    #[test]
    fn test_access_token_expires_on_provider_clock() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let tokens_provider = provider(Arc::clone(&clock));
        let tokens = tokens_provider.issue(&identity()).unwrap();

        clock.advance(Duration::seconds(900));

        let err = tokens_provider.verify_access(&tokens.access_token).unwrap_err();
        assert_eq!(class_of(err), JwtFailClass::ClaimsRejected);
        assert!(tokens_provider.verify_refresh(&tokens.refresh_token).is_ok());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let tokens_provider = provider(clock);
        let tokens = tokens_provider.issue(&identity()).unwrap();

        let mut tampered = tokens.access_token.clone();
        tampered.push('x');

        assert!(tokens_provider.verify_access(&tampered).is_err());
        assert_eq!(
            class_of(tokens_provider.verify_access("not.a.jwt").unwrap_err()),
            JwtFailClass::Malformed
        );
    }
}
