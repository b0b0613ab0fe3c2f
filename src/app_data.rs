use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::config::{
    AuthSettings, ConfigError, DatabaseConnections, EnvironmentProvider, RateLimitBackend,
    SecretManager,
};
use crate::providers::{
    Clock, CredentialProvider, CryptoProvider, LoginRateLimiter, PasswordPolicyProvider,
    PermissionResolver, SystemClock, TokenProvider,
};
use crate::stores::{
    AttemptStore, AuditStore, DatabaseAttemptStore, FacilityStore, GrantStore,
    InMemoryAttemptStore, PasswordHistoryStore, PasswordPolicyStore, RoleStore, UserStore,
};
use crate::types::internal::rate_limit::RateLimitPolicy;

/// Centralized application data following the main-owned stores pattern
///
/// Everything is created once in main.rs and shared behind `Arc`.
///
/// ```text
/// main.rs
///   ↓
/// AppData::init()
///   ↓ creates once
///   ├─ connections (auth DB + audit DB)
///   ├─ settings, secret_manager, clock
///   ├─ stores (user, role, grant, facility, policy, history, audit)
///   ├─ audit_logger
///   └─ providers (crypto, policy, credential, resolver, tokens, rate limiter)
///   ↓ wrapped in Arc<AppData>
///   ├─ AuthCoordinator::new(app_data)
///   └─ AdminCoordinator::new(app_data)
/// ```
pub struct AppData {
    pub connections: DatabaseConnections,
    pub settings: Arc<AuthSettings>,
    pub secret_manager: Arc<SecretManager>,
    pub clock: Arc<dyn Clock>,

    pub audit_store: Arc<AuditStore>,
    pub user_store: Arc<UserStore>,
    pub role_store: Arc<RoleStore>,
    pub grant_store: Arc<GrantStore>,
    pub facility_store: Arc<FacilityStore>,
    pub policy_store: Arc<PasswordPolicyStore>,
    pub history_store: Arc<PasswordHistoryStore>,

    pub audit_logger: Arc<AuditLogger>,
    pub crypto: Arc<CryptoProvider>,
    pub policy_provider: Arc<PasswordPolicyProvider>,
    pub credential_provider: Arc<CredentialProvider>,
    pub permission_resolver: Arc<PermissionResolver>,
    pub token_provider: Arc<TokenProvider>,
    /// Process-wide; with the database backend shared across instances too
    pub rate_limiter: Arc<LoginRateLimiter>,
}

impl AppData {
    /// Load secrets from the environment and build everything on the system clock
    ///
    /// Database connections should be initialized and migrated before calling this.
    pub fn init(
        connections: DatabaseConnections,
        settings: AuthSettings,
        env_provider: Arc<dyn EnvironmentProvider + Send + Sync>,
    ) -> Result<Self, ConfigError> {
        tracing::info!("Initializing AppData...");
        let secret_manager = SecretManager::from_env_provider(env_provider)?;
        tracing::debug!("Secret manager initialized: {}", secret_manager);

        Ok(Self::new(
            connections,
            settings,
            secret_manager,
            Arc::new(SystemClock),
        ))
    }

    /// Build from explicit parts; tests pass a `ManualClock`
    pub fn new(
        connections: DatabaseConnections,
        settings: AuthSettings,
        secret_manager: SecretManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let db = connections.auth.clone();
        let settings = Arc::new(settings);
        let secret_manager = Arc::new(secret_manager);

        // Order matters: audit store first, everything below logs through it
        let audit_store = Arc::new(AuditStore::new(connections.audit.clone()));
        let audit_logger = Arc::new(AuditLogger::new(Arc::clone(&audit_store)));

        let user_store = Arc::new(UserStore::new());
        let role_store = Arc::new(RoleStore::new());
        let grant_store = Arc::new(GrantStore::new());
        let facility_store = Arc::new(FacilityStore::new());
        let policy_store = Arc::new(PasswordPolicyStore::new());
        let history_store = Arc::new(PasswordHistoryStore::new());

        let crypto = Arc::new(CryptoProvider::new(
            secret_manager.password_pepper(),
            settings.hash(),
        ));
        let policy_provider = Arc::new(PasswordPolicyProvider::new(
            db.clone(),
            Arc::clone(&policy_store),
            Arc::clone(&history_store),
            Arc::clone(&crypto),
            Arc::clone(&clock),
        ));
        let credential_provider = Arc::new(CredentialProvider::new(
            db.clone(),
            Arc::clone(&user_store),
            Arc::clone(&policy_provider),
            Arc::clone(&crypto),
            Arc::clone(&audit_logger),
            Arc::clone(&clock),
            settings.lockout(),
        ));
        let permission_resolver = Arc::new(PermissionResolver::new(
            db.clone(),
            Arc::clone(&user_store),
            Arc::clone(&grant_store),
            Arc::clone(&role_store),
            Arc::clone(&audit_logger),
        ));
        let token_provider = Arc::new(TokenProvider::new(
            Arc::clone(&secret_manager),
            settings.access_token_ttl_seconds(),
            settings.refresh_token_ttl_seconds(),
            Arc::clone(&clock),
        ));

        let attempt_store: Arc<dyn AttemptStore> = match settings.rate_limit_backend() {
            RateLimitBackend::Memory => Arc::new(InMemoryAttemptStore::new()),
            RateLimitBackend::Database => Arc::new(DatabaseAttemptStore::new(db.clone())),
        };
        tracing::debug!(
            "Login rate limiter using {:?} backend",
            settings.rate_limit_backend()
        );
        let rate_limiter = Arc::new(LoginRateLimiter::new(
            attempt_store,
            RateLimitPolicy::default(),
            Arc::clone(&clock),
            Arc::clone(&audit_logger),
        ));

        tracing::info!("AppData initialized");

        Self {
            connections,
            settings,
            secret_manager,
            clock,
            audit_store,
            user_store,
            role_store,
            grant_store,
            facility_store,
            policy_store,
            history_store,
            audit_logger,
            crypto,
            policy_provider,
            credential_provider,
            permission_resolver,
            token_provider,
            rate_limiter,
        }
    }
}
