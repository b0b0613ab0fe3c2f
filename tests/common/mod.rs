// Common test utilities for integration tests
#![allow(dead_code)]

use std::ops::Deref;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use hms_auth::AppData;
use hms_auth::config::{
    AuthSettings, DatabaseConnections, HashSettings, MockEnvironment, RateLimitBackend,
    SecretManager,
};
use hms_auth::providers::{Clock, ManualClock};
use hms_auth::stores::{NewAssignment, NewUser};
use hms_auth::types::db::role::RoleKind;
use hms_auth::types::db::{facility, permission, role, user, user_role};
use hms_auth::types::internal::context::RequestContext;
use migration::{AuditMigrator, AuthMigrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

pub const PASSWORD: &str = "Correct-Horse-42";

/// Creates a test auth database with migrations applied
pub async fn setup_test_auth_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    AuthMigrator::up(&db, None)
        .await
        .expect("Failed to run auth migrations");

    db
}

/// Creates a test audit database with migrations applied
pub async fn setup_test_audit_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create audit database");

    AuditMigrator::up(&db, None)
        .await
        .expect("Failed to run audit migrations");

    db
}

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

pub async fn setup() -> TestApp {
    setup_with(RateLimitBackend::Memory).await
}

pub async fn setup_with(backend: RateLimitBackend) -> TestApp {
    let connections = DatabaseConnections {
        auth: setup_test_auth_db().await,
        audit: setup_test_audit_db().await,
    };
    let settings = AuthSettings::from_env_provider(Arc::new(MockEnvironment::empty()))
        .expect("Failed to load default settings")
        .with_hash(HashSettings {
            cost: 1,
            memory_kib: 8,
        })
        .with_rate_limit_backend(backend);
    let secrets = SecretManager::new(
        "integration-access-secret-with-32-characters",
        "integration-refresh-secret-with-32-characters",
        "integration-pepper-16",
    )
    .expect("Failed to build SecretManager");
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
    ));

    let app_data = AppData::new(connections, settings, secrets, clock.clone());

    TestApp {
        app_data: Arc::new(app_data),
        clock,
    }
}

impl TestApp {
    pub fn db(&self) -> &DatabaseConnection {
        &self.app_data.connections.auth
    }

    pub fn now(&self) -> i64 {
        self.clock.now_timestamp()
    }

    pub async fn create_user(&self, username: &str, password: &str) -> user::Model {
        let password_hash = self.crypto.hash_password(password).await.unwrap();
        self.user_store
            .create_user(
                self.db(),
                NewUser {
                    username: username.to_string(),
                    email: format!("{}@hospital.example", username),
                    full_name: format!("{} Test", username),
                    phone: Some("+1-555-0100".to_string()),
                    password_hash,
                },
                self.now(),
            )
            .await
            .unwrap()
    }

    pub async fn create_permission(&self, code: &str) -> permission::Model {
        self.role_store
            .ensure_permission(self.db(), code, None, self.now())
            .await
            .unwrap()
    }

    pub async fn create_role_with(&self, name: &str, kind: RoleKind, codes: &[&str]) -> role::Model {
        let role = self
            .role_store
            .create_role(self.db(), name, None, kind, false, self.now())
            .await
            .unwrap();
        for code in codes {
            let permission = self.create_permission(code).await;
            self.role_store
                .grant_permission_to_role(self.db(), &role.id, &permission.id, self.now())
                .await
                .unwrap();
        }
        role
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

    pub async fn reload(&self, user: &user::Model) -> user::Model {
        self.user_store.get_by_id(self.db(), &user.id).await.unwrap()
    }

    pub async fn audit_count(&self, event_type: &str) -> usize {
        self.audit_store
            .events_by_type(event_type)
            .await
            .unwrap()
            .len()
    }
}

/// Context for a request arriving from `ip`
pub fn ctx_from(ip: &str) -> RequestContext {
    RequestContext::for_system("integration").with_ip_address(ip.parse().unwrap())
}
