//! Events that can occur in a conversation

use super::action::Action;
use crate::panel::{PanelStats, PanelUser, ServiceEntry};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Inbound from the chat
    Start {
        message_id: i32,
    },
    Action {
        action: Action,
        callback_id: String,
        /// `None` when the message carrying the button is no longer accessible
        message_id: Option<i32>,
    },
    /// Callback data that does not parse as an action
    UnknownAction {
        callback_id: String,
    },
    Text {
        text: String,
        message_id: i32,
    },

    // Follow-ups produced by panel effects. `message_id` is the screen the
    // turn last rendered.
    PanelUserResolved {
        message_id: Option<i32>,
        user: Option<PanelUser>,
    },
    StatsResolved {
        message_id: Option<i32>,
        purpose: StatsPurpose,
        panel_identity: String,
        stats: Option<PanelStats>,
    },
    ServicesResolved {
        message_id: Option<i32>,
        services: Vec<ServiceEntry>,
    },
}

/// Which screen asked for panel stats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPurpose {
    Stats,
    Account,
}
