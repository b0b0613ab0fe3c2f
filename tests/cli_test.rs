mod common;

use common::{PASSWORD, ctx_from, setup};
use hms_auth::cli::account::{set_mfa, unlock_user};
use hms_auth::cli::bootstrap::{SUPER_ADMIN_ROLE, bootstrap_system};
use hms_auth::errors::InternalError;
use hms_auth::errors::internal::CredentialError;

#[tokio::test]
async fn test_bootstrap_creates_super_admin() {
    let app = setup().await;

    let report = bootstrap_system(&app, "chief", "chief@hospital.example", "Chief Admin")
        .await
        .unwrap();

    let role = app
        .role_store
        .find_role_by_name(app.db(), SUPER_ADMIN_ROLE)
        .await
        .unwrap()
        .unwrap();
    assert!(role.is_super_admin());
    assert!(role.is_system_role);

    let snapshot = app
        .permission_resolver
        .role_snapshot(&report.user_id)
        .await
        .unwrap();
    assert_eq!(snapshot.roles, vec![SUPER_ADMIN_ROLE.to_string()]);

    app.credential_provider
        .authenticate(&ctx_from("10.3.0.1"), "chief", &report.password)
        .await
        .unwrap();
    assert_eq!(app.audit_count("BOOTSTRAP_COMPLETED").await, 1);
}

#[tokio::test]
async fn test_bootstrap_twice_with_same_account_fails() {
    let app = setup().await;
    bootstrap_system(&app, "chief", "chief@hospital.example", "Chief Admin")
        .await
        .unwrap();

    let err = bootstrap_system(&app, "chief", "other@hospital.example", "Chief Admin")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InternalError::Credential(CredentialError::DuplicateUsername(_))
    ));

    // A second administrator reuses the seeded role
    bootstrap_system(&app, "deputy", "deputy@hospital.example", "Deputy Admin")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unlock_user_clears_lockout() {
    let app = setup().await;
    let user = app.create_user("nurse", PASSWORD).await;
    let ctx = ctx_from("10.3.0.2");
    for _ in 0..5 {
        let _ = app
            .credential_provider
            .authenticate(&ctx, "nurse", "wrong")
            .await;
    }
    assert!(app.reload(&user).await.locked_until.is_some());

    let before = unlock_user(&app, "nurse@hospital.example").await.unwrap();

    assert_eq!(before.failed_login_attempts, 5);
    let after = app.reload(&user).await;
    assert_eq!(after.failed_login_attempts, 0);
    assert_eq!(after.locked_until, None);
    assert_eq!(app.audit_count("ACCOUNT_UNLOCKED").await, 1);
}

#[tokio::test]
async fn test_unlock_unknown_user_fails() {
    let app = setup().await;

    let err = unlock_user(&app, "ghost").await.unwrap_err();

    assert!(matches!(
        err,
        InternalError::Credential(CredentialError::UserIdNotFound { .. })
    ));
}

#[tokio::test]
async fn test_set_mfa_toggles_flag() {
    let app = setup().await;
    let user = app.create_user("nurse", PASSWORD).await;

    set_mfa(&app, "nurse", true).await.unwrap();
    assert!(app.reload(&user).await.mfa_enabled);

    set_mfa(&app, "nurse", false).await.unwrap();
    assert!(!app.reload(&user).await.mfa_enabled);
}
