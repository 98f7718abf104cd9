//! Conversation state types

use crate::db::UserRecord;
use crate::i18n::Language;
use chrono::NaiveDate;

/// Where a conversation stands. Derived each turn by [`project`]; only
/// `AwaitingServiceDescription` is stored, as a flag in [`Scratch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvState {
    /// No identity record yet
    New,
    LanguageChoice,
    /// Unregistered rest state
    AuthGate,
    LoggingIn,
    AwaitingServiceDescription,
    /// Registered rest state
    MainMenu,
    Stats,
    Account,
    Wallet,
    Services,
    Tutorial,
    SettingsScreen,
    Support,
    Profile,
    AdminPanel,
}

/// Per-chat ephemeral data, lost on restart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scratch {
    /// Language picked before an identity record existed
    pub pending_language: Option<Language>,
    /// Bot message to edit when the awaited description arrives
    pub anchor_message_id: Option<i32>,
    pub awaiting_description: bool,
}

impl Scratch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Everything the transition function may read for one step
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub external_id: i64,
    pub chat_id: i64,
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub record: Option<UserRecord>,
    pub scratch: Scratch,
    pub is_admin: bool,
    pub today: NaiveDate,
    pub panel_url: String,
}

impl ConvContext {
    /// Record language, then the pending pick, then the default
    pub fn effective_language(&self) -> Language {
        self.record
            .as_ref()
            .map(|r| r.language)
            .or(self.scratch.pending_language)
            .unwrap_or_default()
    }

    pub fn linked_identity(&self) -> Option<&str> {
        self.record.as_ref().and_then(UserRecord::linked_identity)
    }
}

/// Pure projection from stored data to the current state
pub fn project(record: Option<&UserRecord>, scratch: &Scratch) -> ConvState {
    if scratch.awaiting_description {
        return ConvState::AwaitingServiceDescription;
    }
    match record {
        None => ConvState::New,
        Some(r) if r.linked_identity().is_some() => ConvState::MainMenu,
        Some(_) => ConvState::AuthGate,
    }
}
