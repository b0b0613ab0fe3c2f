use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Request model for user login
#[derive(Object, Debug, Serialize, Deserialize)]
#[oai(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email
    pub username: String,

    pub password: String,

    /// Required when the account has MFA enabled
    pub mfa_code: Option<String>,
}

/// Identity summary returned with a token pair
#[derive(Object, Debug, Clone, PartialEq)]
#[oai(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub roles: Vec<String>,
    /// Effective permission codes at login time
    pub permissions: Vec<String>,
}

/// Response model for login and refresh
#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    pub user: LoginUser,
}

/// Request model for token refresh
#[derive(Object, Debug, Serialize, Deserialize)]
#[oai(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request model for changing the caller's password
#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Object, Debug, Clone, PartialEq)]
pub struct ProfileRole {
    /// Role name
    pub role: String,
    /// Facility name, absent for unscoped assignments
    pub facility: Option<String>,
}

/// Response model for the caller's profile
#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub mfa_enabled: bool,
    /// RFC 3339
    pub last_login_at: Option<String>,
    pub roles: Vec<ProfileRole>,
}

/// Request model for creating a password policy
///
/// Omitted fields take the column defaults.
#[derive(Object, Debug, Default)]
#[oai(rename_all = "camelCase")]
pub struct CreatePasswordPolicyRequest {
    pub name: String,
    pub facility_id: Option<String>,
    pub min_length: Option<i32>,
    pub max_length: Option<i32>,
    pub require_uppercase: Option<bool>,
    pub require_lowercase: Option<bool>,
    pub require_numbers: Option<bool>,
    pub require_special_chars: Option<bool>,
    pub allowed_special_chars: Option<String>,
    pub password_history_count: Option<i32>,
    pub max_failed_attempts: Option<i32>,
    pub lockout_duration_minutes: Option<i32>,
    pub min_age_days: Option<i32>,
    pub common_passwords_blacklist: Option<Vec<String>>,
    pub is_default: Option<bool>,
}

#[derive(Object, Debug, Clone)]
#[oai(rename_all = "camelCase")]
pub struct PasswordPolicyResponse {
    pub id: String,
    pub name: String,
    pub facility_id: Option<String>,
    pub min_length: i32,
    pub max_length: i32,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_numbers: bool,
    pub require_special_chars: bool,
    pub allowed_special_chars: Option<String>,
    pub password_history_count: i32,
    pub max_failed_attempts: i32,
    pub lockout_duration_minutes: i32,
    pub min_age_days: i32,
    pub common_passwords_blacklist: Vec<String>,
    pub is_default: bool,
    pub is_active: bool,
}
