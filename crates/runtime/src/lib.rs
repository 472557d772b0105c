use std::sync::Arc;

use anyhow::Result;
use parley_config::AppConfig;
use parley_store::{CreateChatRequest, CreateMessageRequest, MemoryStore};
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct BackendServices {
    pub store: Arc<MemoryStore>,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());

        info!(
            typing_idle_ms = config.realtime.typing_idle_ms,
            "backend services ready"
        );

        Ok(Self { store })
    }

    /// Populate the store with a couple of demo identities and chats so a
    /// freshly started dev server has something to sync.
    pub async fn seed_demo_data(&self) -> Result<()> {
        let general = self
            .store
            .create_chat(CreateChatRequest {
                name: "general".to_string(),
                is_group: true,
                members: vec![
                    "alice".to_string(),
                    "bob".to_string(),
                    "carol".to_string(),
                ],
            })
            .await?;

        let direct = self
            .store
            .create_chat(CreateChatRequest {
                name: "alice & bob".to_string(),
                is_group: false,
                members: vec!["alice".to_string(), "bob".to_string()],
            })
            .await?;

        self.store
            .create_message(
                "alice",
                CreateMessageRequest {
                    chat_id: general.id.clone(),
                    content: Some("welcome to parley".to_string()),
                    attachment: None,
                },
            )
            .await?;
        self.store
            .create_message(
                "bob",
                CreateMessageRequest {
                    chat_id: direct.id.clone(),
                    content: Some("hey alice".to_string()),
                    attachment: None,
                },
            )
            .await?;

        info!(
            general = %general.id,
            direct = %direct.id,
            "seeded demo chats"
        );
        Ok(())
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
