// Test utilities shared across unit tests
// Only compiled when running tests

use std::ops::Deref;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};
use migration::{AuditMigrator, AuthMigrator, MigratorTrait};

use crate::app_data::AppData;
use crate::config::{
    AuthSettings, DatabaseConnections, HashSettings, MockEnvironment, RateLimitBackend,
    SecretManager,
};
use crate::providers::{Clock, ManualClock};
use crate::stores::{NewAssignment, NewUser};
use crate::types::db::role::RoleKind;
use crate::types::db::{facility, permission, role, user, user_role};

pub const TEST_PASSWORD: &str = "Correct-Horse-42";

/// Cheapest argon2 parameters argon2 accepts
pub const TEST_HASH: HashSettings = HashSettings {
    cost: 1,
    memory_kib: 8,
};

/// Creates a migrated in-memory auth database
pub async fn setup_test_auth_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    AuthMigrator::up(&db, None)
        .await
        .expect("Failed to run auth migrations");

    db
}

/// Creates a migrated in-memory audit database
pub async fn setup_test_audit_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create audit database");

    AuditMigrator::up(&db, None)
        .await
        .expect("Failed to run audit migrations");

    db
}

pub fn test_secret_manager() -> SecretManager {
    SecretManager::new(
        "test-access-secret-minimum-32-characters",
        "test-refresh-secret-minimum-32-characters",
        "test-pepper-for-unit-tests",
    )
    .expect("Failed to build test SecretManager")
}

pub fn test_settings(backend: RateLimitBackend) -> AuthSettings {
    AuthSettings::from_env_provider(Arc::new(MockEnvironment::empty()))
        .expect("Failed to load default settings")
        .with_hash(TEST_HASH)
        .with_rate_limit_backend(backend)
}

/// Fully wired AppData on in-memory databases and a manual clock
pub struct TestApp {
    pub app_data: Arc<AppData>,
    pub clock: Arc<ManualClock>,
}

impl Deref for TestApp {
    type Target = AppData;

    fn deref(&self) -> &AppData {
        &self.app_data
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(RateLimitBackend::Memory).await
}

pub async fn setup_test_app_with(backend: RateLimitBackend) -> TestApp {
    let connections = DatabaseConnections {
        auth: setup_test_auth_db().await,
        audit: setup_test_audit_db().await,
    };
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
    ));

    let app_data = AppData::new(
        connections,
        test_settings(backend),
        test_secret_manager(),
        clock.clone(),
    );

    TestApp {
        app_data: Arc::new(app_data),
        clock,
    }
}

impl TestApp {
    pub fn db(&self) -> &DatabaseConnection {
        &self.app_data.connections.auth
    }

    /// Creates an active user whose password is `password`
    pub async fn create_user(&self, username: &str, password: &str) -> user::Model {
        let password_hash = self.crypto.hash_password(password).await.unwrap();
        self.user_store
            .create_user(
                self.db(),
                NewUser {
                    username: username.to_string(),
                    email: format!("{}@hospital.example", username),
                    full_name: format!("{} Test", username),
                    phone: None,
                    password_hash,
                },
                self.now(),
            )
            .await
            .unwrap()
    }

    pub async fn create_role(&self, name: &str, kind: RoleKind) -> role::Model {
        self.role_store
            .create_role(self.db(), name, None, kind, false, self.now())
            .await
            .unwrap()
    }

    /// Creates a standard role holding the given permission codes
    pub async fn create_role_with(&self, name: &str, codes: &[&str]) -> role::Model {
        let role = self.create_role(name, RoleKind::Standard).await;
        for code in codes {
            let permission = self.create_permission(code).await;
            self.role_store
                .grant_permission_to_role(self.db(), &role.id, &permission.id, self.now())
                .await
                .unwrap();
        }
        role
    }

    pub async fn create_permission(&self, code: &str) -> permission::Model {
        self.role_store
            .ensure_permission(self.db(), code, None, self.now())
            .await
            .unwrap()
    }

    pub async fn create_facility(&self, name: &str) -> facility::Model {
        self.facility_store
            .create(self.db(), name, self.now())
            .await
            .unwrap()
    }

    pub async fn assign(
        &self,
        user: &user::Model,
        role: &role::Model,
        facility: Option<&facility::Model>,
    ) -> user_role::Model {
        self.grant_store
            .assign_role(
                self.db(),
                NewAssignment {
                    user_id: user.id.clone(),
                    role_id: role.id.clone(),
                    facility_id: facility.map(|f| f.id.clone()),
                    department_id: None,
                },
                self.now(),
            )
            .await
            .unwrap()
    }

    /// Number of audit events of one type
    pub async fn audit_count(&self, event_type: &str) -> usize {
        self.audit_store
            .events_by_type(event_type)
            .await
            .unwrap()
            .len()
    }

    pub fn now(&self) -> i64 {
        self.clock.now_timestamp()
    }
}
