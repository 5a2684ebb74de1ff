//! Patient-care assistant
//!
//! A clinical dialogue orchestrator that coordinates language-model steps,
//! a bounded tool-calling loop and multi-stage validation gates over shared
//! per-thread session state. Appointments and medicine orders are persisted
//! only after the user has confirmed a concrete slot and validation passed.

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use domain::clinical::Notifier;
use domain::{ClinicalEngine, EngineConfig};
use infrastructure::gateway::{HttpClient, ModeConfig, OpenAiModelGateway};
use infrastructure::notify::{LogNotifier, WebhookNotifier};
use infrastructure::session::InMemorySessionRepository;
use infrastructure::store::PostgresClinicalStore;
use tracing::info;

/// Wire the engine from configuration: OpenAI gateway, PostgreSQL clinical
/// store, webhook (or log) notifier and in-memory sessions.
pub async fn create_engine(config: &AppConfig) -> anyhow::Result<ClinicalEngine> {
    let call_timeout = Duration::from_secs(config.engine.call_timeout_secs);

    let api_key = config
        .llm
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is required"))?;

    let gateway = OpenAiModelGateway::with_base_url(
        HttpClient::with_timeout(call_timeout)?,
        api_key,
        &config.llm.base_url,
        ModeConfig::new(&config.llm.conversation.model, config.llm.conversation.temperature),
        ModeConfig::new(&config.llm.reasoning.model, config.llm.reasoning.temperature),
        ModeConfig::new(&config.llm.validation.model, config.llm.validation.temperature),
    );

    let database_url = config
        .database
        .url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required"))?;

    info!("Connecting to PostgreSQL...");
    let pool = sqlx::PgPool::connect(&database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
    info!("PostgreSQL connection established");

    let store = Arc::new(PostgresClinicalStore::new(pool));

    let notifier: Arc<dyn Notifier> = match &config.notification.webhook_url {
        Some(url) => {
            info!("Reminders will be delivered to the configured webhook");
            Arc::new(WebhookNotifier::new(
                HttpClient::with_timeout(call_timeout)?,
                url,
                &config.notification.channel,
            ))
        }
        None => {
            info!("No webhook configured; reminders go to the application log");
            Arc::new(LogNotifier::new())
        }
    };

    Ok(ClinicalEngine::new(
        Arc::new(gateway),
        store.clone(),
        store,
        notifier,
        Arc::new(InMemorySessionRepository::new()),
        EngineConfig {
            max_tool_rounds: config.engine.max_tool_rounds,
            max_engine_steps: config.engine.max_engine_steps,
            call_timeout,
        },
    ))
}
