//! Callback action grammar
//!
//! Inline buttons carry `namespace:name` strings. Parsing them into a closed
//! enum means every action is routed by an exhaustive match.

use crate::i18n::Language;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `lang:<code>`
    Lang(Language),
    /// `auth:<name>`
    Auth(AuthAction),
    /// `menu:<name>`
    Menu(MenuAction),
    /// `settings:<name>`
    Settings(SettingsAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    NewService,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Stats,
    Account,
    Wallet,
    Services,
    Tutorial,
    Settings,
    Support,
    Profile,
    Panel,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    ChangeLanguage,
}

impl AuthAction {
    fn name(self) -> &'static str {
        match self {
            AuthAction::Login => "login",
            AuthAction::NewService => "new_service",
            AuthAction::Back => "back",
        }
    }
}

impl MenuAction {
    pub const ALL: [MenuAction; 10] = [
        MenuAction::Stats,
        MenuAction::Account,
        MenuAction::Wallet,
        MenuAction::Services,
        MenuAction::Tutorial,
        MenuAction::Settings,
        MenuAction::Support,
        MenuAction::Profile,
        MenuAction::Panel,
        MenuAction::Back,
    ];

    fn name(self) -> &'static str {
        match self {
            MenuAction::Stats => "stats",
            MenuAction::Account => "account",
            MenuAction::Wallet => "wallet",
            MenuAction::Services => "services",
            MenuAction::Tutorial => "tutorial",
            MenuAction::Settings => "settings",
            MenuAction::Support => "support",
            MenuAction::Profile => "profile",
            MenuAction::Panel => "panel",
            MenuAction::Back => "back",
        }
    }

    /// Screens that need a linked panel identity before any panel call
    pub fn requires_link(self) -> bool {
        matches!(
            self,
            MenuAction::Stats | MenuAction::Account | MenuAction::Services
        )
    }
}

impl SettingsAction {
    fn name(self) -> &'static str {
        match self {
            SettingsAction::ChangeLanguage => "change_lang",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionParseError {
    #[error("action has no namespace: {0}")]
    MissingNamespace(String),
    #[error("unknown action namespace: {0}")]
    UnknownNamespace(String),
    #[error("unknown action {name} in namespace {namespace}")]
    UnknownName { namespace: String, name: String },
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, name) = s
            .split_once(':')
            .ok_or_else(|| ActionParseError::MissingNamespace(s.to_string()))?;
        let unknown = || ActionParseError::UnknownName {
            namespace: namespace.to_string(),
            name: name.to_string(),
        };

        match namespace {
            "lang" => name.parse().map(Action::Lang).map_err(|_| unknown()),
            "auth" => match name {
                "login" => Ok(Action::Auth(AuthAction::Login)),
                "new_service" => Ok(Action::Auth(AuthAction::NewService)),
                "back" => Ok(Action::Auth(AuthAction::Back)),
                _ => Err(unknown()),
            },
            "menu" => MenuAction::ALL
                .into_iter()
                .find(|a| a.name() == name)
                .map(Action::Menu)
                .ok_or_else(unknown),
            "settings" => match name {
                "change_lang" => Ok(Action::Settings(SettingsAction::ChangeLanguage)),
                _ => Err(unknown()),
            },
            other => Err(ActionParseError::UnknownNamespace(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Lang(lang) => write!(f, "lang:{}", lang.code()),
            Action::Auth(a) => write!(f, "auth:{}", a.name()),
            Action::Menu(a) => write!(f, "menu:{}", a.name()),
            Action::Settings(a) => write!(f, "settings:{}", a.name()),
        }
    }
}
