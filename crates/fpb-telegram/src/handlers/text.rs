use chrono::Local;

use fpb_core::{
    dialog::{is_cancel, Committed, DialogOutcome},
    formatting::{escape_html, format_record},
    messaging::types::TextMessage,
    session::Conversation,
    Result,
};

use crate::router::AppState;

use super::views;

/// Free text feeds the active dialog; without one it only gets a hint.
pub(super) async fn handle_text(
    state: &AppState,
    conv: &mut Conversation,
    msg: TextMessage,
) -> Result<()> {
    let chat_id = msg.chat_id;
    let user_id = msg.user_id;

    let ctx = state.cfg.dialog_context(Local::now().date_naive());
    let Some(dialog) = conv.dialog_mut() else {
        let hint = if is_cancel(&msg.text) {
            "Nothing to cancel."
        } else {
            "Use /help to see what I can do."
        };
        state.messenger.send_html(chat_id, hint).await?;
        return Ok(());
    };

    match dialog.advance(&msg.text, &ctx) {
        DialogOutcome::Prompt(prompt) => {
            state.messenger.send_html(chat_id, &escape_html(&prompt)).await?;
        }

        DialogOutcome::Retry(err) => {
            let again = dialog.prompt(&ctx);
            state
                .messenger
                .send_html(
                    chat_id,
                    &format!("❌ {}\n\n{}", escape_html(err.message()), escape_html(&again)),
                )
                .await?;
        }

        DialogOutcome::Cancelled => {
            conv.end_dialog();
            state.messenger.send_html(chat_id, "❌ Cancelled.").await?;
        }

        DialogOutcome::Completed(Committed::Record(new)) => {
            conv.end_dialog();
            let record = state.store.insert(user_id, new).await?;
            tracing::info!(user_id = user_id.0, record_id = record.id.0, "record saved");
            state
                .messenger
                .send_html(
                    chat_id,
                    &format!(
                        "✅ Saved <code>#{}</code>\n{}",
                        record.id,
                        format_record(&record)
                    ),
                )
                .await?;
        }

        DialogOutcome::Completed(Committed::Search { scope, query }) => {
            conv.end_dialog();
            conv.set_search(scope, query);
            let view = views::load(state, conv, user_id, scope, 1).await?;
            views::send(state, chat_id, &view).await?;
        }
    }

    Ok(())
}
