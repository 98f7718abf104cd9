//! Runtime for executing conversation turns

mod executor;
mod scratch;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use traits::*;

use crate::config::Config;
use std::collections::HashSet;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime =
    ConversationRuntime<DatabaseStorage, PanelGateway, crate::telegram::TelegramTransport>;

/// The chatting user, as seen on an inbound update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub external_id: i64,
    pub chat_id: i64,
    pub display_name: Option<String>,
    pub handle: Option<String>,
}

/// Admin review channel for new-service requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminChannel {
    pub chat_id: i64,
    pub thread_id: Option<i32>,
}

/// Deployment settings the executor needs
#[derive(Debug, Clone, Default)]
pub struct RuntimeSettings {
    pub admin_ids: HashSet<i64>,
    pub admin_channel: Option<AdminChannel>,
    /// Opened by the admin panel button
    pub panel_url: String,
}

impl RuntimeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin_ids: config.admin_ids.iter().copied().collect(),
            admin_channel: config.admin_group_id.map(|chat_id| AdminChannel {
                chat_id,
                thread_id: config.admin_topic_id,
            }),
            panel_url: config.panel.base_url.clone(),
        }
    }
}
