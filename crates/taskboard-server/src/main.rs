use std::path::PathBuf;

use clap::{Parser, Subcommand};
use taskboard_core::auth::TokenSigner;
use taskboard_core::store::Store;
use taskboard_server::AppState;

#[derive(Parser)]
#[command(
    name = "taskboard",
    about = "Kanban collaboration backend — boards, lists, tasks, and live updates",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP and WebSocket API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "5000", env = "TASKBOARD_PORT")]
        port: u16,

        /// SQLite database path
        #[arg(long, default_value = "taskboard.db", env = "TASKBOARD_DB")]
        db: PathBuf,
    },

    /// Load demo data (demo user, one board, three lists) into the database
    Seed {
        /// SQLite database path
        #[arg(long, default_value = "taskboard.db", env = "TASKBOARD_DB")]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve {
        port: 5000,
        db: PathBuf::from("taskboard.db"),
    });

    match command {
        Commands::Serve { port, db } => {
            let store = Store::open(&db)?;
            let signer = match std::env::var("TASKBOARD_SECRET") {
                Ok(secret) if !secret.is_empty() => TokenSigner::new(secret.into_bytes()),
                _ => {
                    tracing::warn!(
                        "TASKBOARD_SECRET not set; tokens are signed with an ephemeral key \
                         and will not survive a restart"
                    );
                    TokenSigner::random()
                }
            };
            taskboard_server::serve(AppState::new(store, signer), port).await
        }
        Commands::Seed { db } => {
            let mut store = Store::open(&db)?;
            taskboard_core::seed::run(&mut store)?;
            Ok(())
        }
    }
}
