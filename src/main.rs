use std::sync::Arc;

use clap::Parser;
use poem::{Server, listener::TcpListener};

use hms_auth::AppData;
use hms_auth::api;
use hms_auth::cli::{self, Cli, Commands};
use hms_auth::config::{AuthSettings, DatabaseConnections, SystemEnvironment, init_logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_logging()?;

    let cli = Cli::parse();

    let settings = AuthSettings::from_env()?;
    tracing::debug!("Loaded settings: {:?}", settings);

    let connections = DatabaseConnections::connect(&settings).await?;
    connections.migrate().await?;
    tracing::info!("Database migrations completed");

    let server_address = settings.server_address();
    let server_url = format!("http://localhost:{}/api", settings.server_port());

    let app_data = Arc::new(AppData::init(
        connections,
        settings,
        Arc::new(SystemEnvironment),
    )?);

    match cli.command {
        None | Some(Commands::Serve) => {
            let app = api::routes(app_data, &server_url);

            tracing::info!("Starting server on http://{}", server_address);
            tracing::info!("Swagger UI available at /swagger");

            Server::new(TcpListener::bind(server_address)).run(app).await?;
        }
        Some(command) => {
            cli::execute_command(command, &app_data).await?;
        }
    }

    Ok(())
}
