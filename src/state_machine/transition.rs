//! Pure state transition function
//!
//! Actions are routed by namespace rather than by the projected state: old
//! inline buttons stay clickable, so any action can arrive at any time. The
//! link and admin checks below are what gate access.

use super::action::{Action, AuthAction, MenuAction, SettingsAction};
use super::effect::ScreenTarget;
use super::event::StatsPurpose;
use super::{ConvContext, ConvState, Effect, Event};
use crate::i18n::Language;
use crate::menu::{AccountSummary, ProfileSummary, ServiceRequestNotice, StatsSummary, View};
use crate::panel::PanelUser;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Free text outside of a service description prompt")]
    UnexpectedText,
}

/// Pure transition function: no I/O, same inputs give the same outputs.
#[allow(clippy::too_many_lines)]
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::Start { message_id } => {
            let mut result = TransitionResult::new(ConvState::LanguageChoice)
                .with_effect(Effect::UpsertUser);
            if *state == ConvState::AwaitingServiceDescription {
                result = result.with_effect(Effect::ClearAwaiting);
            }
            Ok(result.with_effects([
                Effect::DeleteMessage { message_id },
                Effect::show(
                    View::LanguageChoice,
                    context.effective_language(),
                    ScreenTarget::Send,
                ),
            ]))
        }

        Event::Action {
            action,
            callback_id,
            message_id,
        } => {
            let mut effects = vec![Effect::AcknowledgeAction { callback_id }];
            let rearms = action == Action::Auth(AuthAction::NewService);
            if *state == ConvState::AwaitingServiceDescription && !rearms {
                effects.push(Effect::ClearAwaiting);
            }
            let result = route_action(context, action, ScreenTarget::replacing(message_id));
            Ok(TransitionResult::new(result.new_state)
                .with_effects(effects)
                .with_effects(result.effects))
        }

        Event::UnknownAction { callback_id } => Ok(TransitionResult::new(state.clone())
            .with_effect(Effect::AcknowledgeAction { callback_id })),

        Event::Text { text, message_id } => {
            if *state != ConvState::AwaitingServiceDescription {
                return Err(TransitionError::UnexpectedText);
            }
            let notice = ServiceRequestNotice {
                display_name: context.display_name.clone(),
                handle: context.handle.clone(),
                external_id: context.external_id,
                text,
            };
            Ok(TransitionResult::new(ConvState::AuthGate).with_effects([
                Effect::DeleteMessage { message_id },
                Effect::ForwardServiceRequest { notice },
                Effect::ClearAwaiting,
                Effect::show(
                    View::ServiceSent,
                    context.effective_language(),
                    ScreenTarget::replacing(context.scratch.anchor_message_id),
                ),
            ]))
        }

        Event::PanelUserResolved { message_id, user } => {
            let language = context.effective_language();
            let target = ScreenTarget::replacing(message_id);
            // A match without a usable identity counts as not found
            let identity = user.as_ref().and_then(PanelUser::identity).map(String::from);

            Ok(match identity {
                Some(panel_identity) => {
                    let mut result = TransitionResult::new(ConvState::MainMenu);
                    if context.record.is_some() {
                        result = result.with_effect(Effect::LinkPanelIdentity { panel_identity });
                    }
                    result.with_effect(Effect::show(
                        View::MainMenu {
                            is_admin: context.is_admin,
                        },
                        language,
                        target,
                    ))
                }
                None => TransitionResult::new(ConvState::AuthGate)
                    .with_effect(Effect::show(View::LoginNotFound, language, target)),
            })
        }

        Event::StatsResolved {
            message_id,
            purpose,
            panel_identity,
            stats,
        } => {
            let view = match purpose {
                StatsPurpose::Stats => stats.map_or(View::NoData, |s| {
                    View::Stats(StatsSummary::from_stats(&s, &panel_identity, context.today))
                }),
                StatsPurpose::Account => View::Account(AccountSummary {
                    username: stats.and_then(|s| s.username),
                    panel_identity,
                    external_id: context.external_id,
                }),
            };
            let new_state = match purpose {
                StatsPurpose::Stats => ConvState::Stats,
                StatsPurpose::Account => ConvState::Account,
            };
            Ok(TransitionResult::new(new_state).with_effect(Effect::show(
                view,
                context.effective_language(),
                ScreenTarget::replacing(message_id),
            )))
        }

        Event::ServicesResolved {
            message_id,
            services,
        } => Ok(
            TransitionResult::new(ConvState::Services).with_effect(Effect::show(
                View::Services(services),
                context.effective_language(),
                ScreenTarget::replacing(message_id),
            )),
        ),
    }
}

fn route_action(context: &ConvContext, action: Action, target: ScreenTarget) -> TransitionResult {
    let language = context.effective_language();
    let show = |state: ConvState, view: View| {
        TransitionResult::new(state).with_effect(Effect::show(view, language, target))
    };

    match action {
        Action::Lang(selected) => {
            let store = if context.record.is_some() {
                Effect::PersistLanguage { language: selected }
            } else {
                Effect::StashPendingLanguage { language: selected }
            };
            TransitionResult::new(ConvState::AuthGate)
                .with_effect(store)
                .with_effect(Effect::show(
                    View::AuthGate {
                        selected: Some(selected),
                    },
                    selected,
                    target,
                ))
        }

        Action::Auth(AuthAction::Login) => {
            show(ConvState::LoggingIn, View::LoginChecking).with_effect(Effect::LookupPanelUser)
        }
        Action::Auth(AuthAction::Back) => show(ConvState::AuthGate, View::AuthGate { selected: None }),
        Action::Auth(AuthAction::NewService) => {
            show(ConvState::AwaitingServiceDescription, View::ServicePrompt)
                .with_effect(Effect::SetAwaiting)
        }

        Action::Menu(menu) => route_menu(context, menu, language, target),

        Action::Settings(SettingsAction::ChangeLanguage) => {
            show(ConvState::LanguageChoice, View::LanguageChoice)
        }
    }
}

fn route_menu(
    context: &ConvContext,
    menu: MenuAction,
    language: Language,
    target: ScreenTarget,
) -> TransitionResult {
    let show = |state: ConvState, view: View| {
        TransitionResult::new(state).with_effect(Effect::show(view, language, target))
    };

    let linked = context.linked_identity().map(String::from);
    if menu.requires_link() && linked.is_none() {
        return show(ConvState::AuthGate, View::NotAuthorized);
    }
    let panel_identity = linked.unwrap_or_default();

    match menu {
        MenuAction::Stats => show(ConvState::Stats, View::StatsLoading).with_effect(
            Effect::FetchStats {
                panel_identity,
                purpose: StatsPurpose::Stats,
            },
        ),
        MenuAction::Account => show(ConvState::Account, View::StatsLoading).with_effect(
            Effect::FetchStats {
                panel_identity,
                purpose: StatsPurpose::Account,
            },
        ),
        MenuAction::Services => show(ConvState::Services, View::ServicesLoading)
            .with_effect(Effect::FetchServices { panel_identity }),
        MenuAction::Wallet => show(ConvState::Wallet, View::Wallet),
        MenuAction::Tutorial => show(ConvState::Tutorial, View::Tutorial),
        MenuAction::Settings => show(ConvState::SettingsScreen, View::Settings),
        MenuAction::Support => show(ConvState::Support, View::Support),
        MenuAction::Profile => show(ConvState::Profile, View::Profile(profile_summary(context))),
        MenuAction::Panel if context.is_admin => show(
            ConvState::AdminPanel,
            View::AdminPanel {
                panel_url: context.panel_url.clone(),
            },
        ),
        MenuAction::Panel => show(ConvState::MainMenu, View::NotAuthorized),
        MenuAction::Back => show(
            ConvState::MainMenu,
            View::MainMenu {
                is_admin: context.is_admin,
            },
        ),
    }
}

fn profile_summary(context: &ConvContext) -> ProfileSummary {
    match &context.record {
        Some(record) => ProfileSummary {
            display_name: record.display_name.clone(),
            handle: record.handle.clone(),
            external_id: record.external_id,
            language: record.language,
            is_registered: record.is_registered,
        },
        None => ProfileSummary {
            display_name: context.display_name.clone(),
            handle: context.handle.clone(),
            external_id: context.external_id,
            language: context.effective_language(),
            is_registered: false,
        },
    }
}
