//! Access declarations for guarded routes
//!
//! Each guarded endpoint names one of these next to its handler; the guard in
//! `helpers` evaluates it.

use crate::types::internal::access::RouteAccess;

pub const SETTINGS_READ: &str = "settings.read";
pub const SETTINGS_MANAGE: &str = "settings.manage";
pub const USERS_MANAGE_ROLES: &str = "users.manage_roles";
pub const USERS_UPDATE: &str = "users.update";
pub const ROLES_MANAGE: &str = "roles.manage";

/// Every permission code the auth core itself checks, with a description,
/// seeded by `bootstrap`
pub const AUTH_PERMISSIONS: &[(&str, &str)] = &[
    (SETTINGS_READ, "View password policies"),
    (SETTINGS_MANAGE, "Create password policies"),
    (USERS_MANAGE_ROLES, "Manage role assignments and permission grants"),
    (USERS_UPDATE, "Change account status and remove accounts"),
    (ROLES_MANAGE, "Rename and delete roles"),
];

pub const LIST_PASSWORD_POLICIES: RouteAccess = RouteAccess::permissions(&[SETTINGS_READ]);
pub const CREATE_PASSWORD_POLICY: RouteAccess = RouteAccess::permissions(&[SETTINGS_MANAGE]);

pub const ASSIGN_ROLE: RouteAccess = RouteAccess::permissions(&[USERS_MANAGE_ROLES]);
pub const REMOVE_ROLE: RouteAccess = RouteAccess::permissions(&[USERS_MANAGE_ROLES]);
pub const GRANT_PERMISSION: RouteAccess = RouteAccess::permissions(&[USERS_MANAGE_ROLES]);
pub const REVOKE_PERMISSION: RouteAccess = RouteAccess::permissions(&[USERS_MANAGE_ROLES]);

pub const ACTIVATE_USER: RouteAccess = RouteAccess::permissions(&[USERS_UPDATE]);
pub const DEACTIVATE_USER: RouteAccess = RouteAccess::permissions(&[USERS_UPDATE]);
pub const REMOVE_USER: RouteAccess = RouteAccess::permissions(&[USERS_UPDATE]);

pub const GRANT_ROLE_PERMISSION: RouteAccess = RouteAccess::permissions(&[USERS_MANAGE_ROLES]);
pub const RENAME_ROLE: RouteAccess = RouteAccess::permissions(&[ROLES_MANAGE]);
pub const DELETE_ROLE: RouteAccess = RouteAccess::permissions(&[ROLES_MANAGE]);
