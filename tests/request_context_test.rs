use hms_auth::types::internal::context::{RequestContext, RequestSource};
use poem::Request;

#[test]
fn test_request_context_from_request_is_anonymous() {
    let req = Request::builder()
        .uri_str("/api/auth/login")
        .header("X-Forwarded-For", "10.1.2.3, 172.16.0.1")
        .finish();

    let ctx = RequestContext::from_request(&req);

    assert_eq!(ctx.source, RequestSource::API);
    assert_eq!(ctx.actor_id, "anonymous");
    assert_eq!(ctx.client_key(), "10.1.2.3");
    assert_eq!(ctx.path.as_deref(), Some("/api/auth/login"));
    assert!(!ctx.authenticated);
    assert!(ctx.claims.is_none());
}

#[test]
fn test_request_context_ignores_unparseable_forwarded_for() {
    let req = Request::builder()
        .header("X-Forwarded-For", "not-an-address")
        .finish();

    let ctx = RequestContext::from_request(&req);

    // No peer address in a built request either
    assert_eq!(ctx.client_key(), "unknown");
}

#[test]
fn test_request_context_for_cli() {
    let ctx = RequestContext::for_cli("bootstrap");

    assert_eq!(ctx.source, RequestSource::CLI);
    assert_eq!(ctx.actor_id, "cli:bootstrap");
    assert!(ctx.ip_address.is_none());
    assert!(!ctx.authenticated);
}

#[test]
fn test_request_context_for_system() {
    let ctx = RequestContext::for_system("cleanup");

    assert_eq!(ctx.source, RequestSource::System);
    assert_eq!(ctx.actor_id, "system:cleanup");
    assert!(ctx.ip_address.is_none());
}
