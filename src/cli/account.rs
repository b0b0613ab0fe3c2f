// Account maintenance commands run with direct database access

use crate::app_data::AppData;
use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::types::db::user;
use crate::types::internal::context::RequestContext;

const ACCOUNT_UNLOCKED: &str = "ACCOUNT_UNLOCKED";
const MFA_FLAG_CHANGED: &str = "MFA_FLAG_CHANGED";

async fn find_account(app_data: &AppData, identifier: &str) -> Result<user::Model, InternalError> {
    app_data
        .user_store
        .find_by_identifier(&app_data.connections.auth, identifier)
        .await?
        .ok_or_else(|| {
            CredentialError::UserIdNotFound {
                user_id: identifier.to_string(),
            }
            .into()
        })
}

/// Clear the failed counter and any running lockout
pub async fn unlock_user(app_data: &AppData, identifier: &str) -> Result<user::Model, InternalError> {
    let ctx = RequestContext::for_cli("unlock_user");
    let account = find_account(app_data, identifier).await?;

    app_data
        .user_store
        .reset_failed_attempts(
            &app_data.connections.auth,
            &account.id,
            app_data.clock.now_timestamp(),
        )
        .await?;

    tracing::info!("Account {} unlocked from the CLI", account.username);
    if let Err(e) = app_data
        .audit_logger
        .builder(ACCOUNT_UNLOCKED)
        .with_context(&ctx)
        .add_field("user_id", &account.id)
        .add_sensitive("identifier", identifier)
        .add_field("previous_failed_attempts", account.failed_login_attempts)
        .write()
        .await
    {
        tracing::error!("Failed to log account unlock: {}", e);
    }

    Ok(account)
}

/// Turn the MFA requirement on or off for an account
pub async fn set_mfa(
    app_data: &AppData,
    identifier: &str,
    enabled: bool,
) -> Result<user::Model, InternalError> {
    let ctx = RequestContext::for_cli("set_mfa");
    let account = find_account(app_data, identifier).await?;

    app_data
        .user_store
        .set_mfa_enabled(
            &app_data.connections.auth,
            &account.id,
            enabled,
            app_data.clock.now_timestamp(),
        )
        .await?;

    if let Err(e) = app_data
        .audit_logger
        .builder(MFA_FLAG_CHANGED)
        .with_context(&ctx)
        .add_field("user_id", &account.id)
        .add_field("mfa_enabled", enabled)
        .write()
        .await
    {
        tracing::error!("Failed to log MFA flag change: {}", e);
    }

    Ok(account)
}
