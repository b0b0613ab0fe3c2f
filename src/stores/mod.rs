// Stores layer - Data access and repository pattern
//
// Stores are stateless apart from AuditStore and DatabaseAttemptStore, which own
// their connection. Every other method takes `conn: &impl ConnectionTrait` so a
// coordinator can run several store calls inside one transaction.
pub mod audit_store;
pub mod facility_store;
pub mod grant_store;
pub mod login_attempt_store;
pub mod password_history_store;
pub mod password_policy_store;
pub mod role_store;
pub mod user_store;

pub use audit_store::AuditStore;
pub use facility_store::FacilityStore;
pub use grant_store::{GrantStore, NewAssignment};
pub use login_attempt_store::{AttemptStore, DatabaseAttemptStore, InMemoryAttemptStore};
pub use password_history_store::PasswordHistoryStore;
pub use password_policy_store::{NewPasswordPolicy, PasswordPolicyStore};
pub use role_store::RoleStore;
pub use user_store::{FailedAttemptOutcome, NewUser, UserStore};
