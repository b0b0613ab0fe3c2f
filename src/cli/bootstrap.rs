// Bootstrap command implementation
// Seeds the permission catalogue, the Super Admin role and its first holder

use sea_orm::TransactionTrait;

use crate::api::routes::AUTH_PERMISSIONS;
use crate::app_data::AppData;
use crate::errors::InternalError;
use crate::stores::{NewAssignment, NewUser};
use crate::types::db::role::RoleKind;
use crate::types::internal::context::RequestContext;

pub const SUPER_ADMIN_ROLE: &str = "Super Admin";

const BOOTSTRAP_COMPLETED: &str = "BOOTSTRAP_COMPLETED";

/// Account created by `bootstrap`
///
/// The password is generated and shown exactly once.
#[derive(Debug)]
pub struct BootstrapReport {
    pub user_id: String,
    pub username: String,
    pub password: String,
    pub permissions_seeded: usize,
}

/// Seed permissions and create the first super administrator
///
/// Permission and role seeding is idempotent; the account must not exist yet.
///
/// # Errors
/// * `CredentialError::DuplicateUsername` / `DuplicateEmail` - the account already exists
pub async fn bootstrap_system(
    app_data: &AppData,
    username: &str,
    email: &str,
    full_name: &str,
) -> Result<BootstrapReport, InternalError> {
    let ctx = RequestContext::for_cli("bootstrap");
    let db = &app_data.connections.auth;
    let now = app_data.clock.now_timestamp();

    let password = app_data.crypto.generate_secure_password();
    let password_hash = app_data.crypto.hash_password(&password).await?;

    let txn = db.begin().await.map_err(InternalError::transaction_begin)?;

    for (code, description) in AUTH_PERMISSIONS {
        app_data
            .role_store
            .ensure_permission(&txn, code, Some(description.to_string()), now)
            .await?;
    }

    let role = match app_data
        .role_store
        .find_role_by_name(&txn, SUPER_ADMIN_ROLE)
        .await?
    {
        Some(existing) => existing,
        None => {
            app_data
                .role_store
                .create_role(
                    &txn,
                    SUPER_ADMIN_ROLE,
                    Some("Unrestricted access across every facility".to_string()),
                    RoleKind::SuperAdmin,
                    true,
                    now,
                )
                .await?
        }
    };

    let user = app_data
        .user_store
        .create_user(
            &txn,
            NewUser {
                username: username.to_string(),
                email: email.to_string(),
                full_name: full_name.to_string(),
                phone: None,
                password_hash,
            },
            now,
        )
        .await?;

    app_data
        .grant_store
        .assign_role(
            &txn,
            NewAssignment {
                user_id: user.id.clone(),
                role_id: role.id.clone(),
                ..Default::default()
            },
            now,
        )
        .await?;

    txn.commit().await.map_err(InternalError::transaction_commit)?;

    tracing::info!("Bootstrap created super administrator {}", user.username);
    if let Err(e) = app_data
        .audit_logger
        .builder(BOOTSTRAP_COMPLETED)
        .with_context(&ctx)
        .add_field("user_id", &user.id)
        .add_field("username", &user.username)
        .add_sensitive("email", &user.email)
        .add_field("role", &role.name)
        .write()
        .await
    {
        tracing::error!("Failed to log bootstrap: {}", e);
    }

    Ok(BootstrapReport {
        user_id: user.id,
        username: user.username,
        password,
        permissions_seeded: AUTH_PERMISSIONS.len(),
    })
}
