use poem::Request;

use crate::errors::InternalError;
use crate::providers::{PermissionResolver, TokenProvider};
use crate::types::internal::access::{FacilityScope, RouteAccess};
use crate::types::internal::context::RequestContext;

/// Header carrying the target facility
pub const FACILITY_HEADER: &str = "x-facility-id";

/// Build an authenticated RequestContext from a bearer token
///
/// # Errors
/// Returns the token validation error when the token is not a valid access token
pub fn authenticated_context(
    req: &Request,
    token: &str,
    token_provider: &TokenProvider,
) -> Result<RequestContext, InternalError> {
    let claims = token_provider.verify_access(token)?;
    Ok(RequestContext::from_request(req).with_auth(claims))
}

/// Collect the facility id candidates of a request
///
/// The header is read here; query, body and path values come from the handler.
pub fn facility_scope(
    req: &Request,
    query: Option<&str>,
    body: Option<&str>,
    path: Option<&str>,
) -> FacilityScope {
    FacilityScope {
        header: req.header(FACILITY_HEADER).map(str::to_owned),
        query: query.map(str::to_owned),
        body: body.map(str::to_owned),
        path: path.map(str::to_owned),
    }
}

/// Trimmed facility id, with blank values treated as absent
pub fn facility_id(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Enforce a route's access declaration for the authenticated caller
///
/// # Errors
/// `AuthorizationError::Forbidden` carrying the denial reason
pub async fn guard(
    resolver: &PermissionResolver,
    ctx: &RequestContext,
    access: RouteAccess,
    scope: &FacilityScope,
) -> Result<(), InternalError> {
    let facility_id = scope.resolve();

    resolver
        .authorize_route(ctx, &ctx.actor_id, access, facility_id.as_deref())
        .await?
        .into_result()
        .map_err(InternalError::from)
}

/// Enforce a route's access declaration for a write that changes `target`
///
/// `target` is the facility the write lands in, `None` for unscoped writes.
///
/// # Errors
/// `AuthorizationError::Forbidden`, including when the request names another facility
pub async fn guard_write(
    resolver: &PermissionResolver,
    ctx: &RequestContext,
    access: RouteAccess,
    scope: &FacilityScope,
    target: Option<&str>,
) -> Result<(), InternalError> {
    let requested = scope.resolve();

    resolver
        .authorize_write(ctx, &ctx.actor_id, access, requested.as_deref(), target)
        .await?
        .into_result()
        .map_err(InternalError::from)
}
