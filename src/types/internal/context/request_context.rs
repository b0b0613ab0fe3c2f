use std::net::IpAddr;

use poem::Request;

use super::{request_id::RequestId, request_source::RequestSource};
use crate::types::internal::auth::Claims;

/// Request context that flows through all layers
///
/// Contains contextual information about the current request that is needed
/// for logging, auditing, and rate limiting across API, coordinator and provider layers.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// IP address of the client making the request
    pub ip_address: Option<IpAddr>,

    /// Unique identifier for this request (for tracing across layers)
    pub request_id: RequestId,

    /// Whether the request is authenticated (JWT validated successfully)
    pub authenticated: bool,

    /// Full JWT claims if authenticated
    pub claims: Option<Claims>,

    /// Source of the request (API, CLI, or System)
    pub source: RequestSource,

    /// Actor who initiated the operation
    pub actor_id: String,

    /// HTTP method, API requests only
    pub method: Option<String>,

    /// HTTP path, API requests only
    pub path: Option<String>,
}

impl RequestContext {
    /// Create an unauthenticated RequestContext for an inbound HTTP request
    pub fn from_request(req: &Request) -> Self {
        Self {
            ip_address: Self::extract_ip_address(req),
            request_id: RequestId::new(),
            authenticated: false,
            claims: None,
            source: RequestSource::API,
            actor_id: "anonymous".to_owned(),
            method: Some(req.method().to_string()),
            path: Some(req.uri().path().to_string()),
        }
    }

    /// Create a RequestContext for CLI operations
    pub fn for_cli(command_name: &str) -> Self {
        Self {
            ip_address: None,
            request_id: RequestId::new(),
            authenticated: false,
            claims: None,
            source: RequestSource::CLI,
            actor_id: format!("cli:{}", command_name),
            method: None,
            path: None,
        }
    }

    /// Create a RequestContext for system operations
    pub fn for_system(operation_name: &str) -> Self {
        Self {
            ip_address: None,
            request_id: RequestId::new(),
            authenticated: false,
            claims: None,
            source: RequestSource::System,
            actor_id: format!("system:{}", operation_name),
            method: None,
            path: None,
        }
    }

    /// Extract the client address
    ///
    /// Uses the first X-Forwarded-For entry when it parses as an address,
    /// otherwise the direct peer address.
    fn extract_ip_address(req: &Request) -> Option<IpAddr> {
        let forwarded = req
            .header("X-Forwarded-For")
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());

        forwarded.or_else(|| req.remote_addr().as_socket_addr().map(|addr| addr.ip()))
    }

    /// Key the login rate limiter counts attempts under
    pub fn client_key(&self) -> String {
        self.ip_address
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Set the ip_address
    pub fn with_ip_address(mut self, ip_address: IpAddr) -> Self {
        self.ip_address = Some(ip_address);
        self
    }

    /// Set authentication state with claims; the subject becomes the actor
    pub fn with_auth(mut self, claims: Claims) -> Self {
        self.authenticated = true;
        self.actor_id = claims.sub.clone();
        self.claims = Some(claims);
        self
    }

    /// Username from the claims, when authenticated
    pub fn username(&self) -> Option<&str> {
        self.claims.as_ref().map(|claims| claims.username.as_str())
    }
}
