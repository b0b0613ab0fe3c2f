use serde::{Deserialize, Serialize};
use std::fmt;

/// Distinguishes access tokens from refresh tokens inside the signed claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims structure
///
/// Carries identity and role names only. Permissions are resolved per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user_id)
    pub sub: String,

    pub username: String,

    pub email: String,

    /// Role names held by the user at issue time
    pub roles: Vec<String>,

    /// Facility of the first role assignment, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,

    pub token_type: TokenType,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

/// Identity snapshot a token pair is minted from
#[derive(Debug, Clone, PartialEq)]
pub struct TokenIdentity {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub facility_id: Option<String>,
}

/// Freshly minted access/refresh pair
#[derive(Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub access_jti: String,
}

impl fmt::Debug for IssuedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedTokens")
            .field("access_token", &"[access_token]")
            .field("refresh_token", &"[refresh_token]")
            .field("expires_in", &self.expires_in)
            .field("access_jti", &self.access_jti)
            .finish()
    }
}

/// Result of a successful login or refresh
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub tokens: IssuedTokens,
    pub user: crate::types::db::user::Model,
    pub roles: Vec<String>,
    /// Effective permission codes across every assignment
    pub permissions: Vec<String>,
}

/// One role held by a user, with the facility name when scoped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldRole {
    pub role: String,
    pub facility: Option<String>,
}
