use poem::Request;

use crate::api::helpers::{FACILITY_HEADER, authenticated_context, facility_id, facility_scope};
use crate::test::utils::setup_test_app;
use crate::types::internal::auth::TokenIdentity;

#[test]
fn test_facility_scope_header_beats_query_and_body() {
    let req = Request::builder()
        .header(FACILITY_HEADER, "fac-header")
        .finish();

    let scope = facility_scope(&req, Some("fac-query"), Some("fac-body"), None);

    assert_eq!(scope.resolve().as_deref(), Some("fac-header"));
}

#[test]
fn test_facility_scope_falls_back_to_body() {
    let req = Request::builder().finish();

    let scope = facility_scope(&req, Some(""), Some("fac-body"), Some("fac-path"));

    assert_eq!(scope.resolve().as_deref(), Some("fac-body"));
}

#[test]
fn test_blank_facility_id_is_absent() {
    assert_eq!(facility_id(Some("  ")), None);
    assert_eq!(facility_id(None), None);
    assert_eq!(facility_id(Some(" fac-1 ")).as_deref(), Some("fac-1"));
}

#[tokio::test]
async fn test_authenticated_context_uses_token_subject() {
    let app = setup_test_app().await;
    let tokens = app
        .token_provider
        .issue(&TokenIdentity {
            user_id: "user-42".to_string(),
            username: "clerk".to_string(),
            email: "clerk@example.org".to_string(),
            roles: vec![],
            facility_id: None,
        })
        .unwrap();

    let req = Request::builder().finish();
    let ctx = authenticated_context(&req, &tokens.access_token, &app.token_provider).unwrap();

    assert!(ctx.authenticated);
    assert_eq!(ctx.actor_id, "user-42");
    assert_eq!(ctx.username(), Some("clerk"));
}

#[tokio::test]
async fn test_authenticated_context_rejects_refresh_token() {
    let app = setup_test_app().await;
    let tokens = app
        .token_provider
        .issue(&TokenIdentity {
            user_id: "user-42".to_string(),
            username: "clerk".to_string(),
            email: "clerk@example.org".to_string(),
            roles: vec![],
            facility_id: None,
        })
        .unwrap();

    let req = Request::builder().finish();

    assert!(authenticated_context(&req, &tokens.refresh_token, &app.token_provider).is_err());
}
