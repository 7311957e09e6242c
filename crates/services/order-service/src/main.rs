//! Order Service - HTTP server for order management.

use clap::{Parser, Subcommand};

use common::init_logging;
use order_service_lib::MigrateAction;

#[derive(Parser)]
#[command(name = "order-service")]
#[command(about = "Order management microservice")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Overrides ORDER_SERVICE_HOST
        #[arg(long)]
        host: Option<String>,
        /// Overrides ORDER_SERVICE_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = order_service_lib::config::from_env();

    // Dropped last so buffered records are flushed on shutdown
    let _log_guard = init_logging(&config.service_name, &config.log);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            order_service_lib::run(config).await?;
        }
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            order_service_lib::run_migrations(&config, migrate_action).await?;
        }
    }

    Ok(())
}
