pub mod access;
pub mod audit;
pub mod auth;
pub mod context;
pub mod password_policy;
pub mod rate_limit;

pub use context::{RequestContext, RequestId, RequestSource};
