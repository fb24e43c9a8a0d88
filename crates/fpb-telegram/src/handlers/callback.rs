use chrono::Local;

use fpb_core::{
    dialog::{Dialog, DialogKind},
    formatting::escape_html,
    keyboards::CallbackAction,
    messaging::types::CallbackQuery,
    session::Conversation,
    Result,
};

use crate::router::AppState;

use super::views;

pub(super) async fn handle_callback(
    state: &AppState,
    conv: &mut Conversation,
    q: CallbackQuery,
) -> Result<()> {
    let Some(action) = CallbackAction::parse(&q.data) else {
        tracing::debug!(user_id = q.user_id.0, data = %q.data, "unknown callback data");
        state
            .messenger
            .answer_callback_query(&q.callback_id, Some("This button is no longer valid"))
            .await?;
        return Ok(());
    };

    let notice = match action {
        CallbackAction::Noop => None,

        CallbackAction::Page { scope, page } => {
            let view = views::load(state, conv, q.user_id, scope, page).await?;
            match q.message {
                Some(msg) => views::edit(state, msg, &view).await?,
                None => views::send(state, q.chat_id, &view).await?,
            }
            view.clamped_from
                .map(|_| "That page no longer exists; showing the last one")
        }

        CallbackAction::SearchStart(scope) => {
            let ctx = state.cfg.dialog_context(Local::now().date_naive());
            let (dialog, prompt) = Dialog::start(DialogKind::Search(scope), &ctx);
            conv.start_dialog(dialog);
            state
                .messenger
                .send_html(q.chat_id, &escape_html(&prompt))
                .await?;
            None
        }

        CallbackAction::SearchClear(scope) => {
            conv.clear_search(scope);
            let view = views::load(state, conv, q.user_id, scope, 1).await?;
            match q.message {
                Some(msg) => views::edit(state, msg, &view).await?,
                None => views::send(state, q.chat_id, &view).await?,
            }
            Some("Search cleared")
        }
    };

    state
        .messenger
        .answer_callback_query(&q.callback_id, notice)
        .await
}
