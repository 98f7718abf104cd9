//! Turn executor
//!
//! Loads the context for a principal, runs the pure transition function and
//! performs the effects it asks for. Panel effects produce follow-up events
//! that are fed back into the same turn.

use super::scratch::ScratchStore;
use super::traits::{PanelApi, Transport, UserStore};
use super::{Principal, RuntimeSettings};
use crate::i18n::Translator;
use crate::menu::{render, render_service_notice};
use crate::state_machine::{project, transition, ConvContext, Effect, Event, ScreenTarget};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::Instrument;

/// Generic conversation runtime that can work with any store, panel and
/// transport implementations
pub struct ConversationRuntime<S, P, T>
where
    S: UserStore + 'static,
    P: PanelApi + 'static,
    T: Transport + 'static,
{
    store: S,
    panel: P,
    transport: T,
    translator: Arc<Translator>,
    scratch: ScratchStore,
    settings: RuntimeSettings,
}

/// Per-turn bookkeeping the transition function does not see
#[derive(Default)]
struct Turn {
    /// The bot message the turn last rendered into
    screen_message_id: Option<i32>,
}

impl<S, P, T> ConversationRuntime<S, P, T>
where
    S: UserStore + 'static,
    P: PanelApi + 'static,
    T: Transport + 'static,
{
    pub fn new(
        store: S,
        panel: P,
        transport: T,
        translator: Arc<Translator>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            store,
            panel,
            transport,
            translator,
            scratch: ScratchStore::new(),
            settings,
        }
    }

    /// Handle one inbound event to completion
    pub async fn handle(&self, principal: &Principal, event: Event) {
        let span = tracing::info_span!(
            "turn",
            external_id = principal.external_id,
            chat_id = principal.chat_id
        );
        self.run_turn(principal, event).instrument(span).await;
    }

    async fn run_turn(&self, principal: &Principal, event: Event) {
        let mut turn = Turn::default();
        let mut events_to_process = VecDeque::from([event]);

        // Process events in a loop - no recursion
        while let Some(event) = events_to_process.pop_front() {
            let context = self.load_context(principal).await;
            let state = project(context.record.as_ref(), &context.scratch);

            let result = match transition(&state, &context, event) {
                Ok(result) => result,
                Err(e) => {
                    tracing::debug!(state = ?state, error = %e, "Event ignored");
                    continue;
                }
            };

            tracing::debug!(from = ?state, to = ?result.new_state, "Transition");

            for effect in result.effects {
                if let Some(next) = self.execute_effect(&context, &mut turn, effect).await {
                    events_to_process.push_back(next);
                }
            }
        }
    }

    async fn load_context(&self, principal: &Principal) -> ConvContext {
        let record = match self.store.get_user(principal.external_id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load user record");
                None
            }
        };

        ConvContext {
            external_id: principal.external_id,
            chat_id: principal.chat_id,
            display_name: principal.display_name.clone(),
            handle: principal.handle.clone(),
            record,
            scratch: self.scratch.get(principal.chat_id),
            is_admin: self.settings.admin_ids.contains(&principal.external_id),
            today: Utc::now().date_naive(),
            panel_url: self.settings.panel_url.clone(),
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn execute_effect(
        &self,
        context: &ConvContext,
        turn: &mut Turn,
        effect: Effect,
    ) -> Option<Event> {
        let chat_id = context.chat_id;
        let external_id = context.external_id;

        match effect {
            Effect::UpsertUser => {
                if let Err(e) = self
                    .store
                    .upsert_user(
                        external_id,
                        context.display_name.as_deref(),
                        context.handle.as_deref(),
                    )
                    .await
                {
                    tracing::error!(error = %e, "Failed to upsert user");
                }
                None
            }

            Effect::PersistLanguage { language } => {
                match self.store.set_language(external_id, language).await {
                    Ok(true) => {}
                    Ok(false) => {
                        self.scratch
                            .update(chat_id, |s| s.pending_language = Some(language));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to persist language");
                        self.scratch
                            .update(chat_id, |s| s.pending_language = Some(language));
                    }
                }
                None
            }

            Effect::StashPendingLanguage { language } => {
                self.scratch
                    .update(chat_id, |s| s.pending_language = Some(language));
                None
            }

            Effect::LinkPanelIdentity { panel_identity } => {
                match self
                    .store
                    .link_panel_identity(external_id, &panel_identity)
                    .await
                {
                    Ok(true) => tracing::info!(panel_identity = %panel_identity, "Linked panel identity"),
                    Ok(false) => tracing::warn!("No record to link panel identity to"),
                    Err(e) => tracing::error!(error = %e, "Failed to link panel identity"),
                }
                None
            }

            Effect::AcknowledgeAction { callback_id } => {
                if let Err(e) = self.transport.acknowledge(&callback_id).await {
                    tracing::debug!(error = %e, "Failed to acknowledge action");
                }
                None
            }

            Effect::DeleteMessage { message_id } => {
                if let Err(e) = self.transport.delete_message(chat_id, message_id).await {
                    tracing::debug!(message_id, error = %e, "Failed to delete message");
                }
                None
            }

            Effect::ShowScreen {
                view,
                language,
                target,
            } => {
                let screen = render(&view, language, &self.translator);
                match target {
                    ScreenTarget::Send => match self.transport.send_screen(chat_id, &screen).await {
                        Ok(message_id) => turn.screen_message_id = Some(message_id),
                        Err(e) => tracing::debug!(error = %e, "Failed to send screen"),
                    },
                    ScreenTarget::Edit(message_id) => {
                        turn.screen_message_id = Some(message_id);
                        if let Err(e) = self
                            .transport
                            .edit_screen(chat_id, message_id, &screen)
                            .await
                        {
                            tracing::debug!(message_id, error = %e, "Failed to edit screen");
                        }
                    }
                }
                None
            }

            Effect::LookupPanelUser => {
                let user = self.panel.find_by_identity(external_id).await;
                Some(Event::PanelUserResolved {
                    message_id: turn.screen_message_id,
                    user,
                })
            }

            Effect::FetchStats {
                panel_identity,
                purpose,
            } => {
                let stats = self.panel.get_stats(&panel_identity).await;
                Some(Event::StatsResolved {
                    message_id: turn.screen_message_id,
                    purpose,
                    panel_identity,
                    stats,
                })
            }

            Effect::FetchServices { panel_identity } => {
                let services = self.panel.list_services(&panel_identity).await;
                Some(Event::ServicesResolved {
                    message_id: turn.screen_message_id,
                    services,
                })
            }

            Effect::ForwardServiceRequest { notice } => {
                let Some(channel) = self.settings.admin_channel else {
                    tracing::info!("Admin channel not configured, service request not forwarded");
                    return None;
                };
                let text = render_service_notice(&notice, &self.translator);
                match self
                    .transport
                    .post_to_channel(channel.chat_id, channel.thread_id, &text)
                    .await
                {
                    Ok(()) => tracing::info!("Service request forwarded"),
                    Err(e) => tracing::error!(error = %e, "Failed to forward service request"),
                }
                None
            }

            Effect::SetAwaiting => {
                let anchor = turn.screen_message_id;
                self.scratch.update(chat_id, |s| {
                    s.awaiting_description = true;
                    s.anchor_message_id = anchor;
                });
                None
            }

            Effect::ClearAwaiting => {
                if context.scratch.awaiting_description {
                    tracing::debug!("Clearing awaited service description");
                }
                self.scratch.update(chat_id, |s| {
                    s.awaiting_description = false;
                    s.anchor_message_id = None;
                });
                None
            }
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn scratch(&self) -> &ScratchStore {
        &self.scratch
    }
}
