//! Telegram update handlers.
//!
//! The teloxide endpoints only translate updates into the core messaging
//! types; [`dispatch`] does auth, takes the conversation lock, and routes to
//! the command / free-text / callback handlers.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery as TgCallbackQuery, Message},
};

use fpb_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    formatting::escape_html,
    messaging::types::{CallbackQuery, Command, IncomingUpdate, TextMessage},
    security::is_authorized,
    session::ConversationKey,
    Error,
};

use crate::router::AppState;

mod callback;
mod commands;
mod text;
mod views;

pub async fn handle_callback(
    bot: Bot,
    q: TgCallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let Some(message) = q.message.as_ref() else {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return Ok(());
    };

    let update = IncomingUpdate::Callback(CallbackQuery {
        chat_id: ChatId(message.chat.id.0),
        user_id: UserId(q.from.id.0 as i64),
        username: q.from.username.clone(),
        callback_id: q.id.clone(),
        data: q.data.clone().unwrap_or_default(),
        message: Some(MessageRef {
            chat_id: ChatId(message.chat.id.0),
            message_id: MessageId(message.id.0),
        }),
    });

    dispatch(&state, update).await;
    Ok(())
}

pub async fn handle_message(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let chat_id = ChatId(msg.chat.id.0);
    let user_id = UserId(user.id.0 as i64);
    let username = user.username.clone();

    let Some(text) = msg.text() else {
        if is_authorized(Some(user_id), &state.cfg.telegram_allowed_users) {
            let _ = state
                .messenger
                .send_html(chat_id, "Only text messages are supported. Use /help.")
                .await;
        }
        return Ok(());
    };

    let update = if text.starts_with('/') {
        let (name, args) = commands::parse_command(text);
        IncomingUpdate::Command(Command {
            chat_id,
            user_id,
            username,
            name,
            args,
        })
    } else {
        IncomingUpdate::Text(TextMessage {
            chat_id,
            user_id,
            username,
            text: text.to_string(),
        })
    };

    dispatch(&state, update).await;
    Ok(())
}

/// Handle one update end to end. Failures are reported to the user, never propagated.
pub async fn dispatch(state: &AppState, update: IncomingUpdate) {
    let chat_id = update.chat_id();
    let user_id = update.user_id();

    if !is_authorized(Some(user_id), &state.cfg.telegram_allowed_users) {
        tracing::warn!(user_id = user_id.0, "unauthorized access attempt");
        let _ = match &update {
            IncomingUpdate::Callback(q) => {
                state
                    .messenger
                    .answer_callback_query(&q.callback_id, Some("Unauthorized"))
                    .await
            }
            _ => state
                .messenger
                .send_html(chat_id, "⛔ Unauthorized. Contact the bot owner for access.")
                .await
                .map(|_| ()),
        };
        return;
    }

    // One update at a time per conversation.
    let conversation = state
        .sessions
        .conversation(ConversationKey { chat_id, user_id })
        .await;
    let mut conv = conversation.lock().await;

    let callback_id = match &update {
        IncomingUpdate::Callback(q) => Some(q.callback_id.clone()),
        _ => None,
    };

    let res = match update {
        IncomingUpdate::Command(cmd) => commands::handle_command(state, &mut conv, cmd).await,
        IncomingUpdate::Text(msg) => text::handle_text(state, &mut conv, msg).await,
        IncomingUpdate::Callback(q) => callback::handle_callback(state, &mut conv, q).await,
    };

    if let Err(e) = res {
        report_error(state, chat_id, user_id, callback_id.as_deref(), &e).await;
    }
}

async fn report_error(
    state: &AppState,
    chat_id: ChatId,
    user_id: UserId,
    callback_id: Option<&str>,
    err: &Error,
) {
    if err.is_recoverable() {
        tracing::debug!(user_id = user_id.0, error = %err, "request rejected");
    } else {
        tracing::warn!(user_id = user_id.0, error = %err, "handler failed");
    }

    let text = escape_html(&err.user_message(state.cfg.debug));
    if let Some(id) = callback_id {
        let _ = state.messenger.answer_callback_query(id, None).await;
    }
    let _ = state.messenger.send_html(chat_id, &text).await;
}
