// Database entities - SeaORM models
pub mod audit_event;
pub mod facility;
pub mod login_attempt;
pub mod password_history;
pub mod password_policy;
pub mod permission;
pub mod role;
pub mod role_permission;
pub mod user;
pub mod user_permission;
pub mod user_role;
