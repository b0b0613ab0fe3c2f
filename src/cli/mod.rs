// CLI module for administrative operations requiring server access

pub mod account;
pub mod bootstrap;

use clap::{Parser, Subcommand};

use crate::app_data::AppData;

/// HMS auth service and administrative CLI
#[derive(Parser)]
#[command(name = "hms-auth")]
#[command(about = "Authorization and account-security service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Seed permissions and create the first Super Admin account
    Bootstrap {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "System Administrator")]
        full_name: String,
    },

    /// Clear a lockout by username or email
    UnlockUser { identifier: String },

    /// Require or stop requiring an MFA code at login
    Mfa {
        identifier: String,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },
}

/// Execute a non-server CLI command
pub async fn execute_command(
    command: Commands,
    app_data: &AppData,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve => {
            return Err("serve is handled by main".into());
        }
        Commands::Bootstrap {
            username,
            email,
            full_name,
        } => {
            let report =
                bootstrap::bootstrap_system(app_data, &username, &email, &full_name).await?;
            println!("Seeded {} permissions", report.permissions_seeded);
            println!("Super Admin created: {} ({})", report.username, report.user_id);
            println!("Password (shown once): {}", report.password);
        }
        Commands::UnlockUser { identifier } => {
            let account = account::unlock_user(app_data, &identifier).await?;
            println!(
                "Unlocked {} (had {} failed attempts)",
                account.username, account.failed_login_attempts
            );
        }
        Commands::Mfa {
            identifier,
            enable,
            disable,
        } => {
            if enable == disable {
                return Err("pass exactly one of --enable or --disable".into());
            }
            let account = account::set_mfa(app_data, &identifier, enable).await?;
            println!(
                "MFA {} for {}",
                if enable { "enabled" } else { "disabled" },
                account.username
            );
        }
    }

    Ok(())
}
