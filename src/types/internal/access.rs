use serde::Serialize;
use std::fmt;

use crate::errors::internal::AuthorizationError;

/// Why an authorization check refused access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DenyReason {
    /// Nothing resolves and no role was excluded by facility scope
    #[serde(rename = "NO_PERMISSIONS")]
    NoPermissions,
    /// At least one required permission is absent
    #[serde(rename = "MISSING_PERMISSIONS")]
    MissingPermissions,
    /// The caller holds none of the roles a route demands
    #[serde(rename = "MISSING_ROLES")]
    MissingRoles,
    /// The facility named on the request is not the one the write changes
    #[serde(rename = "SCOPE_MISMATCH")]
    ScopeMismatch,
    /// The caller's account is deactivated or removed
    #[serde(rename = "ACCOUNT_INACTIVE")]
    AccountInactive,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPermissions => "NO_PERMISSIONS",
            Self::MissingPermissions => "MISSING_PERMISSIONS",
            Self::MissingRoles => "MISSING_ROLES",
            Self::ScopeMismatch => "SCOPE_MISMATCH",
            Self::AccountInactive => "ACCOUNT_INACTIVE",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a permission or role check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny {
        reason: DenyReason,
        /// Required codes (or role names) the caller lacks
        missing: Vec<String>,
    },
}

impl AccessDecision {
    pub fn deny(reason: DenyReason, missing: Vec<String>) -> Self {
        Self::Deny { reason, missing }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn into_result(self) -> Result<(), AuthorizationError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny { reason, .. } => Err(AuthorizationError::Forbidden { reason }),
        }
    }
}

/// Access requirements declared next to a route
///
/// Roles are ANY-of; permissions are ALL-of. Empty slices impose no requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteAccess {
    pub permissions: &'static [&'static str],
    pub roles: &'static [&'static str],
}

impl RouteAccess {
    pub const fn permissions(permissions: &'static [&'static str]) -> Self {
        Self {
            permissions,
            roles: &[],
        }
    }

    pub const fn roles(roles: &'static [&'static str]) -> Self {
        Self {
            permissions: &[],
            roles,
        }
    }
}

/// Which role assignments count toward a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentReach<'a> {
    /// No target facility; every assignment counts
    Any,
    /// Assignments in this facility plus unscoped ones
    Facility(&'a str),
    /// Unscoped assignments only
    Global,
}

impl<'a> AssignmentReach<'a> {
    /// Reach of a request that reads within `facility_id`
    pub fn for_request(facility_id: Option<&'a str>) -> Self {
        facility_id.map_or(Self::Any, Self::Facility)
    }

    /// Reach of a write that changes `target`; an unscoped write needs unscoped grants
    pub fn for_write(target: Option<&'a str>) -> Self {
        target.map_or(Self::Global, Self::Facility)
    }

    pub fn facility_id(&self) -> Option<&'a str> {
        match self {
            Self::Facility(facility_id) => Some(facility_id),
            Self::Any | Self::Global => None,
        }
    }
}

/// Where a target facility id may be supplied on a request
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FacilityScope {
    pub header: Option<String>,
    pub query: Option<String>,
    pub body: Option<String>,
    pub path: Option<String>,
}

impl FacilityScope {
    /// First non-empty value in header, query, body, path order
    pub fn resolve(&self) -> Option<String> {
        [&self.header, &self.query, &self.body, &self.path]
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_scope_prefers_header() {
        let scope = FacilityScope {
            header: Some("fac-header".to_string()),
            query: Some("fac-query".to_string()),
            body: Some("fac-body".to_string()),
            path: Some("fac-path".to_string()),
        };
        assert_eq!(scope.resolve(), Some("fac-header".to_string()));
    }

    #[test]
    fn test_facility_scope_skips_empty_values() {
        let scope = FacilityScope {
            header: Some("".to_string()),
            query: Some("   ".to_string()),
            body: None,
            path: Some("fac-path".to_string()),
        };
        assert_eq!(scope.resolve(), Some("fac-path".to_string()));
    }

    #[test]
    fn test_facility_scope_query_before_body() {
        let scope = FacilityScope {
            query: Some("fac-query".to_string()),
            body: Some("fac-body".to_string()),
            ..Default::default()
        };
        assert_eq!(scope.resolve(), Some("fac-query".to_string()));
    }

    #[test]
    fn test_facility_scope_empty() {
        assert_eq!(FacilityScope::default().resolve(), None);
    }

    #[test]
    fn test_write_reach_without_target_is_global() {
        assert_eq!(AssignmentReach::for_write(None), AssignmentReach::Global);
        assert_eq!(AssignmentReach::for_request(None), AssignmentReach::Any);
        assert_eq!(
            AssignmentReach::for_write(Some("fac-1")).facility_id(),
            Some("fac-1")
        );
    }

    #[test]
    fn test_deny_into_result() {
        let denied = AccessDecision::deny(DenyReason::MissingPermissions, vec!["patients.read".into()]);
        assert!(!denied.is_allowed());
        assert!(matches!(
            denied.into_result(),
            Err(AuthorizationError::Forbidden { reason: DenyReason::MissingPermissions })
        ));
        assert!(AccessDecision::Allow.into_result().is_ok());
    }
}
