use std::collections::HashMap;
use std::fmt;

/// Event types for audit logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    SuperAdminPermissionBypass,
    AccessDenied,
    RateLimitBlock,
    AccountLocked,
    LoginSuccess,
    LoginFailure,
    PasswordChanged,
    RoleAssigned,
    RoleRemoved,
    PermissionGranted,
    PermissionRevoked,
    AccountReactivated,
    AccountDeactivated,
    Custom(String),
}

impl EventType {
    /// Convert EventType to string representation for database storage
    pub fn as_str(&self) -> &str {
        match self {
            Self::SuperAdminPermissionBypass => "SUPER_ADMIN_PERMISSION_BYPASS",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::RateLimitBlock => "RATE_LIMIT_BLOCK",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::LoginFailure => "LOGIN_FAILURE",
            Self::PasswordChanged => "PASSWORD_CHANGED",
            Self::RoleAssigned => "ROLE_ASSIGNED",
            Self::RoleRemoved => "ROLE_REMOVED",
            Self::PermissionGranted => "PERMISSION_GRANTED",
            Self::PermissionRevoked => "PERMISSION_REVOKED",
            Self::AccountReactivated => "ACCOUNT_REACTIVATED",
            Self::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        EventType::Custom(s.to_string())
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        EventType::Custom(s)
    }
}

/// Audit event structure for building and storing audit logs
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub event_type: EventType,
    /// Who performed the action
    pub actor_id: Option<String>,
    pub ip_address: Option<String>,
    pub jwt_id: Option<String>,
    pub data: HashMap<String, serde_json::Value>,
}

impl AuditEvent {
    /// Create a new audit event with the specified event type
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            actor_id: None,
            ip_address: None,
            jwt_id: None,
            data: HashMap::new(),
        }
    }
}
