//! Subscription panel integration
//!
//! Typed client for the panel API plus a logging wrapper. Errors are kept
//! typed here; the runtime boundary collapses them into absent results.

mod client;
mod error;
mod types;

pub use client::{RemnawaveClient, DEFAULT_TIMEOUT};
pub use error::{PanelError, PanelErrorKind};
pub use types::{PanelStats, PanelUser, ServiceEntry, UserTraffic};

use async_trait::async_trait;
use std::sync::Arc;

/// Read-only operations against the panel
#[async_trait]
pub trait PanelService: Send + Sync {
    /// Look up the panel account linked to a chat identity
    async fn find_by_identity(&self, external_id: i64) -> Result<Option<PanelUser>, PanelError>;

    /// Usage, expiry and status for a linked account
    async fn get_stats(&self, panel_identity: &str) -> Result<Option<PanelStats>, PanelError>;

    /// Active subscription entries for a linked account
    async fn list_services(&self, panel_identity: &str) -> Result<Vec<ServiceEntry>, PanelError>;
}

/// Logging wrapper for panel services
pub struct LoggingPanel {
    inner: Arc<dyn PanelService>,
}

impl LoggingPanel {
    pub fn new(inner: Arc<dyn PanelService>) -> Self {
        Self { inner }
    }

    fn log_outcome<T>(operation: &str, started: std::time::Instant, result: &Result<T, PanelError>) {
        let duration = started.elapsed();
        match result {
            Ok(_) => {
                tracing::info!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    "Panel request completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.label(),
                    error = %e.message,
                    "Panel request failed"
                );
            }
        }
    }
}

#[async_trait]
impl PanelService for LoggingPanel {
    async fn find_by_identity(&self, external_id: i64) -> Result<Option<PanelUser>, PanelError> {
        let start = std::time::Instant::now();
        let result = self.inner.find_by_identity(external_id).await;
        Self::log_outcome("find_by_identity", start, &result);
        if let Ok(None) = &result {
            tracing::info!(external_id, "No panel account for identity");
        }
        result
    }

    async fn get_stats(&self, panel_identity: &str) -> Result<Option<PanelStats>, PanelError> {
        let start = std::time::Instant::now();
        let result = self.inner.get_stats(panel_identity).await;
        Self::log_outcome("get_stats", start, &result);
        result
    }

    async fn list_services(&self, panel_identity: &str) -> Result<Vec<ServiceEntry>, PanelError> {
        let start = std::time::Instant::now();
        let result = self.inner.list_services(panel_identity).await;
        Self::log_outcome("list_services", start, &result);
        result
    }
}
