use thiserror::Error;

use crate::types::internal::auth::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtFailClass {
    /// Token is not structurally a JWT or cannot be decoded
    Malformed,

    /// Token is structurally valid but cryptographic verification failed
    Invalid,

    /// Token verified but rejected by claim validation (exp, nbf, ...)
    ClaimsRejected,

    /// Access token presented where a refresh token is expected, or the reverse
    WrongTokenType,

    /// Subject no longer exists, is deleted or inactive
    SubjectRejected,

    /// Token uses a disallowed algorithm or key format
    Unsupported,

    /// Failure inside the validation machinery itself
    Internal,
}

/// Token validation failure. Always surfaces to clients as a generic invalid-token error.
#[derive(Debug, Error)]
#[error("Token validation failed: {class:?} ({note})")]
pub struct JwtValidationError {
    pub class: JwtFailClass,

    /// Small, stable hint like "expired", "signature", "malformed"
    pub note: &'static str,

    #[source]
    pub source: Option<jsonwebtoken::errors::Error>,
}

impl JwtValidationError {
    pub fn from_jwt(err: jsonwebtoken::errors::Error) -> Self {
        let (class, note) = classify_jwt_error(&err);
        Self {
            class,
            note,
            source: Some(err),
        }
    }

    pub fn wrong_type(expected: TokenType) -> Self {
        Self {
            class: JwtFailClass::WrongTokenType,
            note: match expected {
                TokenType::Access => "expected access token",
                TokenType::Refresh => "expected refresh token",
            },
            source: None,
        }
    }

    /// `exp` is at or before the current time
    pub fn expired() -> Self {
        Self {
            class: JwtFailClass::ClaimsRejected,
            note: "expired",
            source: None,
        }
    }

    pub fn subject_rejected(note: &'static str) -> Self {
        Self {
            class: JwtFailClass::SubjectRejected,
            note,
            source: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.class == JwtFailClass::ClaimsRejected && self.note == "expired"
    }
}

fn classify_jwt_error(err: &jsonwebtoken::errors::Error) -> (JwtFailClass, &'static str) {
    use jsonwebtoken::errors::ErrorKind::*;

    match err.kind() {
        InvalidToken | Base64(_) | Json(_) | Utf8(_) => (JwtFailClass::Malformed, "malformed"),

        InvalidSignature | InvalidAlgorithm => (JwtFailClass::Invalid, "signature"),

        ExpiredSignature => (JwtFailClass::ClaimsRejected, "expired"),

        ImmatureSignature | InvalidAudience | InvalidIssuer | InvalidSubject
        | MissingRequiredClaim(_) => (JwtFailClass::ClaimsRejected, "claims"),

        MissingAlgorithm | InvalidAlgorithmName | InvalidKeyFormat => {
            (JwtFailClass::Unsupported, "algorithm")
        }

        _ => (JwtFailClass::Internal, "internal"),
    }
}
