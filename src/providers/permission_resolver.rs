use std::collections::BTreeSet;
use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::audit::AuditLogger;
use crate::errors::InternalError;
use crate::stores::{GrantStore, RoleStore, UserStore};
use crate::types::db::{role, user_role};
use crate::types::internal::access::{AccessDecision, AssignmentReach, DenyReason, RouteAccess};
use crate::types::internal::context::RequestContext;

/// Role names a user holds plus the facility of their oldest assignment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSnapshot {
    pub roles: Vec<String>,
    pub facility_id: Option<String>,
}

/// Resolves effective permissions and gates access
///
/// Effective permissions are the union of the permissions of every role
/// assignment that applies to the target facility and every direct grant.
/// A holder of a super admin role passes every check, and each pass is audited.
pub struct PermissionResolver {
    db: DatabaseConnection,
    user_store: Arc<UserStore>,
    grant_store: Arc<GrantStore>,
    role_store: Arc<RoleStore>,
    audit_logger: Arc<AuditLogger>,
}

impl PermissionResolver {
    pub fn new(
        db: DatabaseConnection,
        user_store: Arc<UserStore>,
        grant_store: Arc<GrantStore>,
        role_store: Arc<RoleStore>,
        audit_logger: Arc<AuditLogger>,
    ) -> Self {
        Self {
            db,
            user_store,
            grant_store,
            role_store,
            audit_logger,
        }
    }

    /// Check that the user holds every permission in `required`
    ///
    /// An empty list allows without touching storage.
    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        required: &[&str],
        facility_id: Option<&str>,
    ) -> Result<AccessDecision, InternalError> {
        if required.is_empty() {
            return Ok(AccessDecision::Allow);
        }

        let reach = AssignmentReach::for_request(facility_id);
        let assignments = self
            .grant_store
            .assignments_with_roles(&self.db, user_id)
            .await?;

        if is_super_admin(&assignments) {
            self.audit_bypass(ctx, user_id, &to_strings(required), facility_id)
                .await;
            return Ok(AccessDecision::Allow);
        }

        self.check_permissions(ctx, user_id, required, reach, &assignments)
            .await
    }

    /// Evaluate a route's declared roles (any-of) and then its permissions (all-of)
    ///
    /// The caller's account must still be active.
    pub async fn authorize_route(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        access: RouteAccess,
        facility_id: Option<&str>,
    ) -> Result<AccessDecision, InternalError> {
        if access.roles.is_empty() && access.permissions.is_empty() {
            return Ok(AccessDecision::Allow);
        }

        let reach = AssignmentReach::for_request(facility_id);
        if let Some(denied) = self.inactive_caller(ctx, user_id, access, reach).await? {
            return Ok(denied);
        }

        self.evaluate_route(ctx, user_id, access, reach).await
    }

    /// Authorize an administrative write against the facility it changes
    ///
    /// A facility named on the request must be `target`. Only assignments
    /// covering `target` count; an unscoped write (`target` of `None`) needs
    /// unscoped assignments or direct grants.
    pub async fn authorize_write(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        access: RouteAccess,
        requested: Option<&str>,
        target: Option<&str>,
    ) -> Result<AccessDecision, InternalError> {
        if access.roles.is_empty() && access.permissions.is_empty() {
            return Ok(AccessDecision::Allow);
        }

        let reach = AssignmentReach::for_write(target);
        if let Some(denied) = self.inactive_caller(ctx, user_id, access, reach).await? {
            return Ok(denied);
        }

        if requested.is_some() && requested != target {
            let declared = declared(access);
            return Ok(self
                .deny(
                    ctx,
                    user_id,
                    &declared,
                    Vec::new(),
                    DenyReason::ScopeMismatch,
                    requested,
                )
                .await);
        }

        self.evaluate_route(ctx, user_id, access, reach).await
    }

    /// Permission codes the user holds for `facility_id` (all assignments when `None`)
    pub async fn effective_permissions(
        &self,
        user_id: &str,
        facility_id: Option<&str>,
    ) -> Result<BTreeSet<String>, InternalError> {
        let assignments = self
            .grant_store
            .assignments_with_roles(&self.db, user_id)
            .await?;

        self.resolve_codes(user_id, AssignmentReach::for_request(facility_id), &assignments)
            .await
    }

    /// Current role names, deduplicated, oldest assignment first
    pub async fn role_snapshot(&self, user_id: &str) -> Result<RoleSnapshot, InternalError> {
        let assignments = self
            .grant_store
            .assignments_with_roles(&self.db, user_id)
            .await?;

        let mut roles: Vec<String> = Vec::with_capacity(assignments.len());
        for (_, role) in &assignments {
            if !roles.contains(&role.name) {
                roles.push(role.name.clone());
            }
        }

        Ok(RoleSnapshot {
            roles,
            facility_id: assignments
                .first()
                .and_then(|(assignment, _)| assignment.facility_id.clone()),
        })
    }

    /// Deny a caller whose account was deactivated or removed after the token was issued
    async fn inactive_caller(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        access: RouteAccess,
        reach: AssignmentReach<'_>,
    ) -> Result<Option<AccessDecision>, InternalError> {
        let active = self
            .user_store
            .find_by_id(&self.db, user_id)
            .await?
            .is_some_and(|user| user.is_active());
        if active {
            return Ok(None);
        }

        let declared = declared(access);
        Ok(Some(
            self.deny(
                ctx,
                user_id,
                &declared,
                Vec::new(),
                DenyReason::AccountInactive,
                reach.facility_id(),
            )
            .await,
        ))
    }

    async fn evaluate_route(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        access: RouteAccess,
        reach: AssignmentReach<'_>,
    ) -> Result<AccessDecision, InternalError> {
        let assignments = self
            .grant_store
            .assignments_with_roles(&self.db, user_id)
            .await?;

        if is_super_admin(&assignments) {
            self.audit_bypass(ctx, user_id, &declared(access), reach.facility_id())
                .await;
            return Ok(AccessDecision::Allow);
        }

        if !access.roles.is_empty() {
            let held: BTreeSet<&str> = assignments
                .iter()
                .filter(|(assignment, _)| assignment.applies_to(reach))
                .map(|(_, role)| role.name.as_str())
                .collect();

            if !access.roles.iter().any(|role| held.contains(role)) {
                let required = to_strings(access.roles);
                return Ok(self
                    .deny(
                        ctx,
                        user_id,
                        &required,
                        required.clone(),
                        DenyReason::MissingRoles,
                        reach.facility_id(),
                    )
                    .await);
            }
        }

        if access.permissions.is_empty() {
            return Ok(AccessDecision::Allow);
        }

        self.check_permissions(ctx, user_id, access.permissions, reach, &assignments)
            .await
    }

    async fn check_permissions(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        required: &[&str],
        reach: AssignmentReach<'_>,
        assignments: &[(user_role::Model, role::Model)],
    ) -> Result<AccessDecision, InternalError> {
        let granted = self.resolve_codes(user_id, reach, assignments).await?;
        let requested = to_strings(required);
        // Roles held elsewhere make this a missing-permission case, not a no-permission one
        let scoped_out = assignments
            .iter()
            .any(|(assignment, _)| !assignment.applies_to(reach));

        if granted.is_empty() && !scoped_out {
            return Ok(self
                .deny(
                    ctx,
                    user_id,
                    &requested,
                    requested.clone(),
                    DenyReason::NoPermissions,
                    reach.facility_id(),
                )
                .await);
        }

        let missing: Vec<String> = requested
            .iter()
            .filter(|code| !granted.contains(code.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Ok(self
                .deny(
                    ctx,
                    user_id,
                    &requested,
                    missing,
                    DenyReason::MissingPermissions,
                    reach.facility_id(),
                )
                .await);
        }

        Ok(AccessDecision::Allow)
    }

    async fn resolve_codes(
        &self,
        user_id: &str,
        reach: AssignmentReach<'_>,
        assignments: &[(user_role::Model, role::Model)],
    ) -> Result<BTreeSet<String>, InternalError> {
        let role_ids: Vec<String> = assignments
            .iter()
            .filter(|(assignment, _)| assignment.applies_to(reach))
            .map(|(_, role)| role.id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut codes = self
            .role_store
            .permission_codes_for_roles(&self.db, &role_ids)
            .await?;
        // Direct grants are never facility-scoped
        codes.extend(
            self.grant_store
                .direct_permission_codes(&self.db, user_id)
                .await?,
        );

        Ok(codes)
    }

    async fn deny(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        requested: &[String],
        missing: Vec<String>,
        reason: DenyReason,
        facility_id: Option<&str>,
    ) -> AccessDecision {
        tracing::info!(
            user_id = user_id,
            reason = reason.as_str(),
            facility_id = facility_id.unwrap_or("-"),
            "Access denied"
        );

        if let Err(e) = self
            .audit_logger
            .log_access_denied(ctx, user_id, requested, &missing, reason, facility_id)
            .await
        {
            tracing::error!("Failed to log access denial: {}", e);
        }

        AccessDecision::deny(reason, missing)
    }

    async fn audit_bypass(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        bypassed: &[String],
        facility_id: Option<&str>,
    ) {
        if let Err(e) = self
            .audit_logger
            .log_super_admin_bypass(ctx, user_id, bypassed, facility_id)
            .await
        {
            tracing::error!("Failed to log super admin bypass: {}", e);
        }
    }
}

fn is_super_admin(assignments: &[(user_role::Model, role::Model)]) -> bool {
    assignments.iter().any(|(_, role)| role.is_super_admin())
}

/// Role names and permission codes a route declares, for audit records
fn declared(access: RouteAccess) -> Vec<String> {
    let mut declared = to_strings(access.roles);
    declared.extend(to_strings(access.permissions));
    declared
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{TEST_PASSWORD, setup_test_app};
    use crate::types::db::role::RoleKind;

    const BYPASS: &str = "SUPER_ADMIN_PERMISSION_BYPASS";
    const DENIED: &str = "ACCESS_DENIED";

    fn ctx() -> RequestContext {
        RequestContext::for_system("resolver_test")
    }

    #[tokio::test]
    async fn test_empty_requirement_allows_without_audit() {
        let app = setup_test_app().await;
        let user = app.create_user("nobody", TEST_PASSWORD).await;

        let decision = app
            .permission_resolver
            .authorize(&ctx(), &user.id, &[], None)
            .await
            .unwrap();

        assert_eq!(decision, AccessDecision::Allow);
        assert_eq!(app.audit_count(DENIED).await, 0);
    }

    #[tokio::test]
    async fn test_user_without_permissions_is_denied() {
        let app = setup_test_app().await;
        let user = app.create_user("nobody", TEST_PASSWORD).await;

        let decision = app
            .permission_resolver
            .authorize(&ctx(), &user.id, &["patients.read"], None)
            .await
            .unwrap();

        assert_eq!(
            decision,
            AccessDecision::deny(DenyReason::NoPermissions, vec!["patients.read".to_string()])
        );
        assert_eq!(app.audit_count(DENIED).await, 1);
    }

    #[tokio::test]
    async fn test_facility_scoped_role_does_not_reach_other_facility() {
        let app = setup_test_app().await;
        let facility_a = app.create_facility("North Wing").await;
        let facility_b = app.create_facility("South Wing").await;
        let nurse = app.create_user("nurse", TEST_PASSWORD).await;
        let role = app.create_role_with("Nurse", &["patients.read"]).await;
        app.assign(&nurse, &role, Some(&facility_a)).await;

        let in_b = app
            .permission_resolver
            .authorize(&ctx(), &nurse.id, &["patients.read"], Some(&facility_b.id))
            .await
            .unwrap();
        let in_a = app
            .permission_resolver
            .authorize(&ctx(), &nurse.id, &["patients.read"], Some(&facility_a.id))
            .await
            .unwrap();

        assert_eq!(
            in_b,
            AccessDecision::deny(
                DenyReason::MissingPermissions,
                vec!["patients.read".to_string()]
            )
        );
        assert!(in_a.is_allowed());
    }

    #[tokio::test]
    async fn test_facility_scoped_role_with_other_grant_reports_missing() {
        let app = setup_test_app().await;
        let facility_a = app.create_facility("North Wing").await;
        let facility_b = app.create_facility("South Wing").await;
        let nurse = app.create_user("nurse", TEST_PASSWORD).await;
        let scoped = app.create_role_with("Ward Nurse", &["patients.read"]).await;
        let global = app.create_role_with("Staff", &["schedule.read"]).await;
        app.assign(&nurse, &scoped, Some(&facility_a)).await;
        app.assign(&nurse, &global, None).await;

        let decision = app
            .permission_resolver
            .authorize(&ctx(), &nurse.id, &["patients.read"], Some(&facility_b.id))
            .await
            .unwrap();

        assert_eq!(
            decision,
            AccessDecision::deny(
                DenyReason::MissingPermissions,
                vec!["patients.read".to_string()]
            )
        );
    }

    #[tokio::test]
    async fn test_same_role_scoped_and_unscoped_reaches_other_facility() {
        let app = setup_test_app().await;
        let facility_a = app.create_facility("North Wing").await;
        let facility_b = app.create_facility("South Wing").await;
        let nurse = app.create_user("nurse", TEST_PASSWORD).await;
        let role = app.create_role_with("Nurse", &["patients.read"]).await;
        app.assign(&nurse, &role, Some(&facility_a)).await;
        let unscoped = app.assign(&nurse, &role, None).await;

        let both = app
            .permission_resolver
            .authorize(&ctx(), &nurse.id, &["patients.read"], Some(&facility_b.id))
            .await
            .unwrap();
        assert!(both.is_allowed());

        app.grant_store
            .remove_assignment(app.db(), &nurse.id, &unscoped.id)
            .await
            .unwrap();
        let scoped_only = app
            .permission_resolver
            .authorize(&ctx(), &nurse.id, &["patients.read"], Some(&facility_b.id))
            .await
            .unwrap();

        assert_eq!(
            scoped_only,
            AccessDecision::deny(
                DenyReason::MissingPermissions,
                vec!["patients.read".to_string()]
            )
        );
    }

    #[tokio::test]
    async fn test_deactivated_caller_fails_route_check() {
        let app = setup_test_app().await;
        let clerk = app.create_user("clerk", TEST_PASSWORD).await;
        let role = app.create_role_with("Clerk", &["billing.read"]).await;
        app.assign(&clerk, &role, None).await;
        let access = RouteAccess::permissions(&["billing.read"]);

        let before = app
            .permission_resolver
            .authorize_route(&ctx(), &clerk.id, access, None)
            .await
            .unwrap();
        assert!(before.is_allowed());

        app.user_store
            .deactivate(app.db(), &clerk.id, app.now())
            .await
            .unwrap();
        let after = app
            .permission_resolver
            .authorize_route(&ctx(), &clerk.id, access, None)
            .await
            .unwrap();

        assert_eq!(after, AccessDecision::deny(DenyReason::AccountInactive, Vec::new()));
        assert_eq!(app.audit_count(DENIED).await, 1);
    }

    #[tokio::test]
    async fn test_soft_deleted_super_admin_loses_bypass() {
        let app = setup_test_app().await;
        let admin = app.create_user("root", TEST_PASSWORD).await;
        let role = app.create_role("Super Admin", RoleKind::SuperAdmin).await;
        app.assign(&admin, &role, None).await;
        app.user_store
            .soft_delete(app.db(), &admin.id, app.now())
            .await
            .unwrap();

        let decision = app
            .permission_resolver
            .authorize_route(&ctx(), &admin.id, RouteAccess::permissions(&["users.update"]), None)
            .await
            .unwrap();

        assert!(!decision.is_allowed());
        assert_eq!(app.audit_count(BYPASS).await, 0);
    }

    #[tokio::test]
    async fn test_unscoped_write_needs_unscoped_grant() {
        let app = setup_test_app().await;
        let facility = app.create_facility("North Wing").await;
        let ward_admin = app.create_user("ward_admin", TEST_PASSWORD).await;
        let role = app
            .create_role_with("Ward Admin", &["users.manage_roles"])
            .await;
        app.assign(&ward_admin, &role, Some(&facility)).await;
        let access = RouteAccess::permissions(&["users.manage_roles"]);

        let global = app
            .permission_resolver
            .authorize_write(&ctx(), &ward_admin.id, access, None, None)
            .await
            .unwrap();
        let in_ward = app
            .permission_resolver
            .authorize_write(&ctx(), &ward_admin.id, access, Some(&facility.id), Some(&facility.id))
            .await
            .unwrap();

        assert_eq!(
            global,
            AccessDecision::deny(
                DenyReason::MissingPermissions,
                vec!["users.manage_roles".to_string()]
            )
        );
        assert!(in_ward.is_allowed());
    }

    #[tokio::test]
    async fn test_write_scope_must_match_target() {
        let app = setup_test_app().await;
        let facility_a = app.create_facility("North Wing").await;
        let facility_b = app.create_facility("South Wing").await;
        let ward_admin = app.create_user("ward_admin", TEST_PASSWORD).await;
        let role = app
            .create_role_with("Ward Admin", &["users.manage_roles"])
            .await;
        app.assign(&ward_admin, &role, Some(&facility_a)).await;
        let access = RouteAccess::permissions(&["users.manage_roles"]);

        let crossed = app
            .permission_resolver
            .authorize_write(
                &ctx(),
                &ward_admin.id,
                access,
                Some(&facility_a.id),
                Some(&facility_b.id),
            )
            .await
            .unwrap();
        let widened = app
            .permission_resolver
            .authorize_write(&ctx(), &ward_admin.id, access, Some(&facility_a.id), None)
            .await
            .unwrap();

        assert_eq!(crossed, AccessDecision::deny(DenyReason::ScopeMismatch, Vec::new()));
        assert_eq!(widened, AccessDecision::deny(DenyReason::ScopeMismatch, Vec::new()));
        assert_eq!(app.audit_count(DENIED).await, 2);
    }

    #[tokio::test]
    async fn test_global_role_allows_without_facility() {
        let app = setup_test_app().await;
        let doctor = app.create_user("doctor", TEST_PASSWORD).await;
        let role = app
            .create_role_with("Doctor", &["patients.read", "patients.update"])
            .await;
        app.assign(&doctor, &role, None).await;

        let decision = app
            .permission_resolver
            .authorize(&ctx(), &doctor.id, &["patients.read", "patients.update"], None)
            .await
            .unwrap();

        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn test_direct_grant_applies_in_any_facility() {
        let app = setup_test_app().await;
        let facility = app.create_facility("North Wing").await;
        let clerk = app.create_user("clerk", TEST_PASSWORD).await;
        let permission = app.create_permission("billing.read").await;
        app.grant_store
            .grant_permission(app.db(), &clerk.id, &permission.id, None, app.now())
            .await
            .unwrap();

        let decision = app
            .permission_resolver
            .authorize(&ctx(), &clerk.id, &["billing.read"], Some(&facility.id))
            .await
            .unwrap();

        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn test_super_admin_bypass_is_audited_once_per_call() {
        let app = setup_test_app().await;
        let admin = app.create_user("root", TEST_PASSWORD).await;
        let role = app.create_role("Super Admin", RoleKind::SuperAdmin).await;
        app.assign(&admin, &role, None).await;

        let decision = app
            .permission_resolver
            .authorize(&ctx(), &admin.id, &["patients.read", "billing.refund"], None)
            .await
            .unwrap();

        assert!(decision.is_allowed());
        assert_eq!(app.audit_count(BYPASS).await, 1);

        app.permission_resolver
            .authorize(&ctx(), &admin.id, &["lab.read"], None)
            .await
            .unwrap();
        assert_eq!(app.audit_count(BYPASS).await, 2);
    }

    #[tokio::test]
    async fn test_bypass_keyed_on_kind_not_name() {
        let app = setup_test_app().await;
        let user = app.create_user("impostor", TEST_PASSWORD).await;
        let role = app.create_role("Super Admin", RoleKind::Standard).await;
        app.assign(&user, &role, None).await;

        let decision = app
            .permission_resolver
            .authorize(&ctx(), &user.id, &["patients.read"], None)
            .await
            .unwrap();

        assert!(!decision.is_allowed());
        assert_eq!(app.audit_count(BYPASS).await, 0);
    }

    #[tokio::test]
    async fn test_route_roles_are_any_of() {
        let app = setup_test_app().await;
        let user = app.create_user("pharmacist", TEST_PASSWORD).await;
        let role = app.create_role_with("Pharmacist", &["pharmacy.dispense"]).await;
        app.assign(&user, &role, None).await;

        let allowed = app
            .permission_resolver
            .authorize_route(
                &ctx(),
                &user.id,
                RouteAccess {
                    roles: &["Doctor", "Pharmacist"],
                    permissions: &["pharmacy.dispense"],
                },
                None,
            )
            .await
            .unwrap();
        let denied = app
            .permission_resolver
            .authorize_route(&ctx(), &user.id, RouteAccess::roles(&["Doctor"]), None)
            .await
            .unwrap();

        assert!(allowed.is_allowed());
        assert_eq!(
            denied,
            AccessDecision::deny(DenyReason::MissingRoles, vec!["Doctor".to_string()])
        );
    }

    #[tokio::test]
    async fn test_role_snapshot_lists_current_roles() {
        let app = setup_test_app().await;
        let facility = app.create_facility("North Wing").await;
        let user = app.create_user("tech", TEST_PASSWORD).await;
        let lab = app.create_role("Lab Tech", RoleKind::Standard).await;
        let staff = app.create_role("Staff", RoleKind::Standard).await;
        app.assign(&user, &lab, Some(&facility)).await;
        app.clock.advance(chrono::Duration::seconds(1));
        app.assign(&user, &staff, None).await;

        let snapshot = app.permission_resolver.role_snapshot(&user.id).await.unwrap();

        assert_eq!(snapshot.roles, vec!["Lab Tech".to_string(), "Staff".to_string()]);
        assert_eq!(snapshot.facility_id, Some(facility.id));
    }
}
