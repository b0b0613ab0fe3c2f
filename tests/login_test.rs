mod common;

use chrono::Duration;
use common::{PASSWORD, ctx_from, setup};
use hms_auth::coordinators::AuthCoordinator;
use hms_auth::errors::InternalError;
use hms_auth::errors::internal::{CredentialError, RateLimitError};
use hms_auth::types::db::role::RoleKind;

fn is_invalid_credentials(err: &InternalError) -> bool {
    matches!(err, InternalError::Credential(CredentialError::InvalidCredentials))
}

#[tokio::test]
async fn test_five_failures_lock_for_configured_duration() {
    let app = setup().await;
    let user = app.create_user("nurse.joy", PASSWORD).await;
    let ctx = ctx_from("10.0.0.1");

    for _ in 0..5 {
        let err = app
            .credential_provider
            .authenticate(&ctx, "nurse.joy", "wrong-password")
            .await
            .unwrap_err();
        assert!(is_invalid_credentials(&err));
    }

    let locked = app.reload(&user).await;
    assert_eq!(locked.failed_login_attempts, 5);
    assert_eq!(locked.locked_until, Some(app.now() + 900));
    assert_eq!(app.audit_count("ACCOUNT_LOCKED").await, 1);

    // Even the right password is refused, and nothing is counted
    let err = app
        .credential_provider
        .authenticate(&ctx, "nurse.joy", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InternalError::Credential(CredentialError::AccountLocked {
            remaining_seconds: 900
        })
    ));
    assert_eq!(app.reload(&user).await.failed_login_attempts, 5);
}

#[tokio::test]
async fn test_lock_expires_and_success_resets_counter() {
    let app = setup().await;
    let user = app.create_user("nurse.joy", PASSWORD).await;
    let ctx = ctx_from("10.0.0.1");

    for _ in 0..5 {
        let _ = app
            .credential_provider
            .authenticate(&ctx, "nurse.joy", "wrong-password")
            .await;
    }

    app.clock.advance(Duration::seconds(901));

    let authenticated = app
        .credential_provider
        .authenticate(&ctx, "nurse.joy", PASSWORD)
        .await
        .unwrap();
    assert_eq!(authenticated.id, user.id);

    let reloaded = app.reload(&user).await;
    assert_eq!(reloaded.failed_login_attempts, 0);
    assert_eq!(reloaded.locked_until, None);
}

#[tokio::test]
async fn test_success_after_failures_resets_counter() {
    let app = setup().await;
    let user = app.create_user("dr.house", PASSWORD).await;
    let ctx = ctx_from("10.0.0.2");

    for _ in 0..3 {
        let _ = app
            .credential_provider
            .authenticate(&ctx, "dr.house", "wrong-password")
            .await;
    }
    assert_eq!(app.reload(&user).await.failed_login_attempts, 3);

    app.credential_provider
        .authenticate(&ctx, "dr.house@hospital.example", PASSWORD)
        .await
        .unwrap();

    assert_eq!(app.reload(&user).await.failed_login_attempts, 0);
}

#[tokio::test]
async fn test_unknown_user_looks_like_wrong_password() {
    let app = setup().await;

    let err = app
        .credential_provider
        .authenticate(&ctx_from("10.0.0.3"), "ghost", PASSWORD)
        .await
        .unwrap_err();

    assert!(is_invalid_credentials(&err));
}

#[tokio::test]
async fn test_malformed_hash_is_a_data_integrity_fault() {
    use hms_auth::types::db::user;
    use sea_orm::{ActiveModelTrait, Set};

    let app = setup().await;
    let account = app.create_user("corrupt", PASSWORD).await;
    let mut model: user::ActiveModel = account.clone().into();
    model.password_hash = Set(Some("not-a-phc-string".to_string()));
    model.update(app.db()).await.unwrap();

    let err = app
        .credential_provider
        .authenticate(&ctx_from("10.0.0.4"), "corrupt", PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InternalError::Credential(CredentialError::DataIntegrityFault { .. })
    ));
    assert!(err.is_internal());
    assert_eq!(app.reload(&account).await.failed_login_attempts, 0);
}

#[tokio::test]
async fn test_login_returns_tokens_roles_and_permissions() {
    let app = setup().await;
    let user = app.create_user("dr.grey", PASSWORD).await;
    let role = app
        .create_role_with("Doctor", RoleKind::Standard, &["patients.read", "orders.create"])
        .await;
    app.assign(&user, &role, None).await;
    let coordinator = AuthCoordinator::new(app.app_data.clone());

    let session = coordinator
        .login(&ctx_from("10.0.1.1"), "dr.grey", PASSWORD, None)
        .await
        .unwrap();

    assert_eq!(session.roles, vec!["Doctor".to_string()]);
    assert_eq!(
        session.permissions,
        vec!["orders.create".to_string(), "patients.read".to_string()]
    );
    assert_eq!(session.tokens.expires_in, 900);

    let claims = app
        .token_provider
        .verify_access(&session.tokens.access_token)
        .unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.roles, vec!["Doctor".to_string()]);

    assert_eq!(app.reload(&user).await.last_login_at, Some(app.now()));
    assert_eq!(app.audit_count("LOGIN_SUCCESS").await, 1);
}

#[tokio::test]
async fn test_inactive_account_cannot_login() {
    let app = setup().await;
    let user = app.create_user("retired", PASSWORD).await;
    app.user_store
        .deactivate(app.db(), &user.id, app.now())
        .await
        .unwrap();
    let coordinator = AuthCoordinator::new(app.app_data.clone());

    let err = coordinator
        .login(&ctx_from("10.0.1.2"), "retired", PASSWORD, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InternalError::Credential(CredentialError::AccountInactive)
    ));
    assert_eq!(app.audit_count("LOGIN_FAILURE").await, 1);
}

#[tokio::test]
async fn test_mfa_enabled_account_needs_a_code() {
    let app = setup().await;
    let user = app.create_user("secure", PASSWORD).await;
    app.user_store
        .set_mfa_enabled(app.db(), &user.id, true, app.now())
        .await
        .unwrap();
    let coordinator = AuthCoordinator::new(app.app_data.clone());
    let ctx = ctx_from("10.0.1.3");

    let err = coordinator
        .login(&ctx, "secure", PASSWORD, Some("  "))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InternalError::Credential(CredentialError::MfaRequired)
    ));

    coordinator
        .login(&ctx, "secure", PASSWORD, Some("123456"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sixth_attempt_from_one_address_is_rate_limited() {
    let app = setup().await;
    app.create_user("target", PASSWORD).await;
    let coordinator = AuthCoordinator::new(app.app_data.clone());
    let ctx = ctx_from("192.0.2.10");

    for _ in 0..5 {
        let err = coordinator
            .login(&ctx, "ghost", "guess", None)
            .await
            .unwrap_err();
        assert!(is_invalid_credentials(&err));
    }

    // Correct credentials do not help once blocked
    let err = coordinator
        .login(&ctx, "target", PASSWORD, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InternalError::RateLimit(RateLimitError::Blocked {
            retry_after_seconds: 900
        })
    ));
    assert_eq!(app.audit_count("RATE_LIMIT_BLOCK").await, 1);

    // Another address is unaffected
    coordinator
        .login(&ctx_from("192.0.2.11"), "target", PASSWORD, None)
        .await
        .unwrap();

    app.clock.advance(Duration::minutes(15));
    coordinator
        .login(&ctx, "target", PASSWORD, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_successful_login_resets_rate_limit() {
    let app = setup().await;
    app.create_user("target", PASSWORD).await;
    let coordinator = AuthCoordinator::new(app.app_data.clone());
    let ctx = ctx_from("192.0.2.20");

    for _ in 0..4 {
        let _ = coordinator.login(&ctx, "ghost", "guess", None).await;
    }
    coordinator
        .login(&ctx, "target", PASSWORD, None)
        .await
        .unwrap();

    // A fresh window: five more attempts pass the limiter
    for _ in 0..5 {
        let err = coordinator
            .login(&ctx, "ghost", "guess", None)
            .await
            .unwrap_err();
        assert!(is_invalid_credentials(&err));
    }
    let err = coordinator
        .login(&ctx, "ghost", "guess", None)
        .await
        .unwrap_err();
    assert!(matches!(err, InternalError::RateLimit(_)));
}
