use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use parley_config::load as load_config;
use parley_gateway::{create_router, GatewayState};
use parley_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "parley-server")]
#[command(about = "Parley chat backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP/WebSocket server (default)
    Serve {
        /// Seed demo identities and chats into the in-memory store
        #[arg(long)]
        seed: bool,
    },
    /// Seed demo data and print the resulting store contents
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve { seed: false }) {
        Commands::Serve { seed } => run_server(seed).await,
        Commands::Demo => run_demo().await,
    }
}

async fn run_server(seed: bool) -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Parley backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    if seed {
        services
            .seed_demo_data()
            .await
            .context("failed to seed demo data")?;
    }

    let state = GatewayState::new(
        services.store.clone(),
        Duration::from_millis(config.realtime.typing_idle_ms),
    );
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(parley_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn run_demo() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;
    services
        .seed_demo_data()
        .await
        .context("failed to seed demo data")?;

    let chats = services.store.all_chats().await;
    println!("Found {} chats:", chats.len());
    println!(
        "{:<26} {:<20} {:<8} {:<30} {:<30}",
        "ID", "Name", "Group", "Members", "Latest message"
    );
    println!("{}", "-".repeat(120));

    for chat in &chats {
        let latest = chat
            .latest_message
            .as_ref()
            .and_then(|message| message.content.clone())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<26} {:<20} {:<8} {:<30} {:<30}",
            chat.id,
            chat.name,
            chat.is_group,
            chat.members.join(", "),
            latest
        );
    }

    for chat in &chats {
        if let Some(member) = chat.members.first() {
            let history = services
                .store
                .history(&chat.id, member)
                .await
                .context("failed to fetch history")?;
            println!("\nMessages in '{}' ({}):", chat.name, history.len());
            for message in history {
                println!(
                    "  [{}] {}: {}",
                    message.created_at,
                    message.sender_id,
                    message.content.as_deref().unwrap_or("<attachment>")
                );
            }
        }
    }

    Ok(())
}
