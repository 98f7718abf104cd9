//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::UserRecord;
use crate::i18n::Language;
use crate::menu::Screen;
use crate::panel::{PanelService, PanelStats, PanelUser, ServiceEntry};
use async_trait::async_trait;

/// Durable identity records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, external_id: i64) -> Result<Option<UserRecord>, String>;

    /// Create on first contact; on re-contact refresh display name and handle only
    async fn upsert_user(
        &self,
        external_id: i64,
        display_name: Option<&str>,
        handle: Option<&str>,
    ) -> Result<UserRecord, String>;

    /// Returns false when no record exists
    async fn set_language(&self, external_id: i64, language: Language) -> Result<bool, String>;

    /// Returns false when no record exists
    async fn link_panel_identity(
        &self,
        external_id: i64,
        panel_identity: &str,
    ) -> Result<bool, String>;
}

/// The panel as the executor sees it: failures are already absent values
#[async_trait]
pub trait PanelApi: Send + Sync {
    async fn find_by_identity(&self, external_id: i64) -> Option<PanelUser>;

    async fn get_stats(&self, panel_identity: &str) -> Option<PanelStats>;

    async fn list_services(&self, panel_identity: &str) -> Vec<ServiceEntry>;
}

/// Outbound side of the chat transport
#[async_trait]
pub trait Transport: Send + Sync {
    async fn acknowledge(&self, callback_id: &str) -> Result<(), String>;

    /// Returns the id of the sent message
    async fn send_screen(&self, chat_id: i64, screen: &Screen) -> Result<i32, String>;

    async fn edit_screen(&self, chat_id: i64, message_id: i32, screen: &Screen)
        -> Result<(), String>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), String>;

    /// Post HTML text to a channel, optionally inside a forum thread
    async fn post_to_channel(
        &self,
        chat_id: i64,
        thread_id: Option<i32>,
        text: &str,
    ) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    async fn get_user(&self, external_id: i64) -> Result<Option<UserRecord>, String> {
        (**self).get_user(external_id).await
    }

    async fn upsert_user(
        &self,
        external_id: i64,
        display_name: Option<&str>,
        handle: Option<&str>,
    ) -> Result<UserRecord, String> {
        (**self).upsert_user(external_id, display_name, handle).await
    }

    async fn set_language(&self, external_id: i64, language: Language) -> Result<bool, String> {
        (**self).set_language(external_id, language).await
    }

    async fn link_panel_identity(
        &self,
        external_id: i64,
        panel_identity: &str,
    ) -> Result<bool, String> {
        (**self).link_panel_identity(external_id, panel_identity).await
    }
}

#[async_trait]
impl<T: PanelApi + ?Sized> PanelApi for Arc<T> {
    async fn find_by_identity(&self, external_id: i64) -> Option<PanelUser> {
        (**self).find_by_identity(external_id).await
    }

    async fn get_stats(&self, panel_identity: &str) -> Option<PanelStats> {
        (**self).get_stats(panel_identity).await
    }

    async fn list_services(&self, panel_identity: &str) -> Vec<ServiceEntry> {
        (**self).list_services(panel_identity).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn acknowledge(&self, callback_id: &str) -> Result<(), String> {
        (**self).acknowledge(callback_id).await
    }

    async fn send_screen(&self, chat_id: i64, screen: &Screen) -> Result<i32, String> {
        (**self).send_screen(chat_id, screen).await
    }

    async fn edit_screen(
        &self,
        chat_id: i64,
        message_id: i32,
        screen: &Screen,
    ) -> Result<(), String> {
        (**self).edit_screen(chat_id, message_id, screen).await
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), String> {
        (**self).delete_message(chat_id, message_id).await
    }

    async fn post_to_channel(
        &self,
        chat_id: i64,
        thread_id: Option<i32>,
        text: &str,
    ) -> Result<(), String> {
        (**self).post_to_channel(chat_id, thread_id, text).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

use crate::db::Database;
use std::sync::Arc;

/// Adapter to use Database as a `UserStore`
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for DatabaseStorage {
    async fn get_user(&self, external_id: i64) -> Result<Option<UserRecord>, String> {
        self.db.get_user(external_id).map_err(|e| e.to_string())
    }

    async fn upsert_user(
        &self,
        external_id: i64,
        display_name: Option<&str>,
        handle: Option<&str>,
    ) -> Result<UserRecord, String> {
        self.db
            .upsert_user(external_id, display_name, handle)
            .map_err(|e| e.to_string())
    }

    async fn set_language(&self, external_id: i64, language: Language) -> Result<bool, String> {
        self.db
            .set_language(external_id, language)
            .map_err(|e| e.to_string())
    }

    async fn link_panel_identity(
        &self,
        external_id: i64,
        panel_identity: &str,
    ) -> Result<bool, String> {
        self.db
            .link_panel_identity(external_id, panel_identity)
            .map_err(|e| e.to_string())
    }
}

/// Adapter from a `PanelService` to `PanelApi`. Errors were already logged
/// by the service wrapper; here they collapse to the absent value.
pub struct PanelGateway {
    service: Arc<dyn PanelService>,
}

impl PanelGateway {
    pub fn new(service: Arc<dyn PanelService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl PanelApi for PanelGateway {
    async fn find_by_identity(&self, external_id: i64) -> Option<PanelUser> {
        self.service
            .find_by_identity(external_id)
            .await
            .ok()
            .flatten()
    }

    async fn get_stats(&self, panel_identity: &str) -> Option<PanelStats> {
        self.service.get_stats(panel_identity).await.ok().flatten()
    }

    async fn list_services(&self, panel_identity: &str) -> Vec<ServiceEntry> {
        self.service
            .list_services(panel_identity)
            .await
            .unwrap_or_default()
    }
}
