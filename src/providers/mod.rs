// Providers layer - Work performers and business logic
//
// Providers contain business logic and provide composable operations that
// coordinators can orchestrate: credential checks, policy evaluation,
// permission resolution, token handling and rate limiting.

pub mod clock;
pub mod credential_provider;
pub mod crypto_provider;
pub mod password_policy_provider;
pub mod permission_resolver;
pub mod rate_limiter;
pub mod token_provider;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credential_provider::CredentialProvider;
pub use crypto_provider::{CryptoProvider, PasswordVerification};
pub use password_policy_provider::PasswordPolicyProvider;
pub use permission_resolver::{PermissionResolver, RoleSnapshot};
pub use rate_limiter::LoginRateLimiter;
pub use token_provider::TokenProvider;
