//! Remnabot - Telegram concierge for a Remnawave panel
//!
//! Users pick a language, link their chat identity to a panel account and
//! browse usage, services and account screens. New-service requests are
//! forwarded to an admin review channel.

mod config;
mod db;
mod i18n;
mod menu;
mod panel;
mod runtime;
mod state_machine;
mod telegram;

use config::{Config, EnvFile};
use db::Database;
use i18n::Translator;
use panel::{LoggingPanel, PanelService, RemnawaveClient};
use runtime::{ConversationRuntime, DatabaseStorage, PanelGateway, ProductionRuntime, RuntimeSettings};
use std::sync::Arc;
use telegram::TelegramTransport;
use teloxide::Bot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration first: LOG_LEVEL may come from .env
    let env_file = EnvFile::load();
    let config = Config::from_env();

    // Initialize logging
    let default_level = config
        .as_ref()
        .map_or("info", |c| c.log_level.as_str())
        .to_string();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("remnabot={default_level},teloxide=warn").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();
    env_file.log();

    let config = config.inspect_err(|e| tracing::error!(error = %e, "Invalid configuration"))?;

    // Ensure database directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    tracing::info!(path = %config.database_path.display(), "Opening database");
    let db = Database::open(&config.database_path)?;

    // Panel client, wrapped for logging
    let client = RemnawaveClient::new(
        &config.panel.base_url,
        config.panel.token.clone(),
        config.panel.timeout,
    )?;
    let service: Arc<dyn PanelService> = Arc::new(LoggingPanel::new(Arc::new(client)));

    let settings = RuntimeSettings::from_config(&config);
    if settings.admin_channel.is_none() {
        tracing::warn!("ADMIN_GROUP_ID not set, service requests will not be forwarded");
    }
    tracing::info!(
        admins = settings.admin_ids.len(),
        panel = %config.panel.base_url,
        "Runtime configured"
    );

    let bot = Bot::new(&config.bot_token);
    let runtime: Arc<ProductionRuntime> = Arc::new(ConversationRuntime::new(
        DatabaseStorage::new(db),
        PanelGateway::new(service),
        TelegramTransport::new(bot.clone()),
        Arc::new(Translator::default()),
        settings,
    ));

    tracing::info!("Remnabot polling for updates");
    telegram::run(bot, runtime).await;
    tracing::info!("Remnabot stopped");

    Ok(())
}
