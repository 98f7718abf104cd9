//! Telegram transport
//!
//! Outbound: [`TelegramTransport`] turns screens into HTML messages with
//! inline keyboards. Inbound: [`run`] dispatches updates into the runtime.

use crate::menu::{ButtonTarget, Screen};
use crate::runtime::{Principal, ProductionRuntime, Transport};
use crate::state_machine::{Action, Event};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode, ThreadId, User,
};

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn keyboard(screen: &Screen) -> InlineKeyboardMarkup {
    let rows = screen.rows.iter().map(|row| {
        row.iter()
            .filter_map(|button| match &button.target {
                ButtonTarget::Action(action) => Some(InlineKeyboardButton::callback(
                    button.label.clone(),
                    action.to_string(),
                )),
                ButtonTarget::Url(url) => match url.parse() {
                    Ok(parsed) => Some(InlineKeyboardButton::url(button.label.clone(), parsed)),
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "Skipping button with invalid URL");
                        None
                    }
                },
            })
            .collect::<Vec<_>>()
    });
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn acknowledge(&self, callback_id: &str) -> Result<(), String> {
        self.bot
            .answer_callback_query(callback_id.to_string())
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn send_screen(&self, chat_id: i64, screen: &Screen) -> Result<i32, String> {
        self.bot
            .send_message(ChatId(chat_id), screen.text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard(screen))
            .await
            .map(|msg| msg.id.0)
            .map_err(|e| e.to_string())
    }

    async fn edit_screen(
        &self,
        chat_id: i64,
        message_id: i32,
        screen: &Screen,
    ) -> Result<(), String> {
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), screen.text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard(screen))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), String> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn post_to_channel(
        &self,
        chat_id: i64,
        thread_id: Option<i32>,
        text: &str,
    ) -> Result<(), String> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text.to_string())
            .parse_mode(ParseMode::Html);
        if let Some(thread_id) = thread_id {
            request = request.message_thread_id(ThreadId(MessageId(thread_id)));
        }
        request.await.map(|_| ()).map_err(|e| e.to_string())
    }
}

// ============================================================================
// Inbound dispatch
// ============================================================================

/// Run the long-polling dispatcher until ctrl-c
pub async fn run(bot: Bot, runtime: Arc<ProductionRuntime>) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![runtime])
        .default_handler(|update: Arc<Update>| async move {
            tracing::debug!(update_id = ?update.id, "Unhandled update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn principal(user: &User, chat_id: i64) -> Option<Principal> {
    let external_id = i64::try_from(user.id.0).ok()?;
    Some(Principal {
        external_id,
        chat_id,
        display_name: Some(user.full_name()),
        handle: user.username.clone(),
    })
}

/// `/start`, optionally addressed (`/start@bot`) or with a payload
fn is_start_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .and_then(|command| command.split('@').next())
        == Some("/start")
}

#[allow(clippy::needless_pass_by_value)] // dptree injects owned values
async fn on_message(msg: Message, runtime: Arc<ProductionRuntime>) -> ResponseResult<()> {
    let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };
    let Some(principal) = principal(user, msg.chat.id.0) else {
        return Ok(());
    };

    let event = if is_start_command(text) {
        Event::Start {
            message_id: msg.id.0,
        }
    } else {
        Event::Text {
            text: text.to_string(),
            message_id: msg.id.0,
        }
    };
    runtime.handle(&principal, event).await;
    Ok(())
}

#[allow(clippy::needless_pass_by_value)]
async fn on_callback(q: CallbackQuery, runtime: Arc<ProductionRuntime>) -> ResponseResult<()> {
    // Private chats share the user's id
    let chat_id = q
        .message
        .as_ref()
        .map_or_else(|| i64::try_from(q.from.id.0).unwrap_or_default(), |m| m.chat().id.0);
    let Some(principal) = principal(&q.from, chat_id) else {
        return Ok(());
    };

    let data = q.data.as_deref().unwrap_or_default();
    let event = match data.parse::<Action>() {
        Ok(action) => Event::Action {
            action,
            callback_id: q.id.to_string(),
            message_id: q.message.as_ref().map(|m| m.id().0),
        },
        Err(e) => {
            tracing::debug!(data = %data, error = %e, "Unparseable callback data");
            Event::UnknownAction {
                callback_id: q.id.to_string(),
            }
        }
    };
    runtime.handle(&principal, event).await;
    Ok(())
}
