//! Effects produced by state transitions

use super::event::StatsPurpose;
use crate::i18n::Language;
use crate::menu::{ServiceRequestNotice, View};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Create the identity record, or refresh its display name and handle
    UpsertUser,

    /// Write the language onto the record; falls back to the pending slot
    /// when no record exists
    PersistLanguage { language: Language },

    /// Keep the language in scratch until a record exists
    StashPendingLanguage { language: Language },

    /// Mark the record registered with this panel identity
    LinkPanelIdentity { panel_identity: String },

    /// Answer the callback so the client stops its spinner
    AcknowledgeAction { callback_id: String },

    /// Best-effort delete of a user message
    DeleteMessage { message_id: i32 },

    /// Render a view and deliver it
    ShowScreen {
        view: View,
        language: Language,
        target: ScreenTarget,
    },

    /// Look up the principal on the panel; yields `PanelUserResolved`
    LookupPanelUser,

    /// Yields `StatsResolved`
    FetchStats {
        panel_identity: String,
        purpose: StatsPurpose,
    },

    /// Yields `ServicesResolved`
    FetchServices { panel_identity: String },

    /// Post the notice to the admin review channel, if one is configured
    ForwardServiceRequest { notice: ServiceRequestNotice },

    /// Store the awaiting flag, anchored to the screen just rendered
    SetAwaiting,

    ClearAwaiting,
}

/// Where a screen goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenTarget {
    Send,
    Edit(i32),
}

impl ScreenTarget {
    /// Edit in place when the message is known, otherwise send a new one
    pub fn replacing(message_id: Option<i32>) -> Self {
        message_id.map_or(ScreenTarget::Send, ScreenTarget::Edit)
    }
}

impl Effect {
    pub fn show(view: View, language: Language, target: ScreenTarget) -> Self {
        Effect::ShowScreen {
            view,
            language,
            target,
        }
    }
}
