// Coordinators layer - Workflow orchestration
//
// Coordinators handle pure workflow orchestration by composing provider and
// store operations for specific API endpoints. They decide the sequence and
// the transaction boundaries; business rules live in providers.

pub mod admin_coordinator;
pub mod auth_coordinator;

pub use admin_coordinator::AdminCoordinator;
pub use auth_coordinator::AuthCoordinator;
