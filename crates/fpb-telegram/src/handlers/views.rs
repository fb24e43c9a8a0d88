use fpb_core::{
    domain::{ChatId, MessageRef, RecordScope, UserId},
    listing::ListView,
    session::Conversation,
    Result,
};

use crate::router::AppState;

/// Fetch a page of `scope` using the conversation's active search.
pub(super) async fn load(
    state: &AppState,
    conv: &mut Conversation,
    user_id: UserId,
    scope: RecordScope,
    page: usize,
) -> Result<ListView> {
    let query = conv.search(scope);
    let view = state.listing.list(user_id, scope, page, query).await?;
    conv.remember_page(scope, view.info.current_page);
    Ok(view)
}

pub(super) async fn send(state: &AppState, chat_id: ChatId, view: &ListView) -> Result<()> {
    state
        .messenger
        .send_inline_keyboard(chat_id, &view.render(), view.keyboard())
        .await?;
    Ok(())
}

/// Re-render a listing in place (page navigation).
pub(super) async fn edit(state: &AppState, msg: MessageRef, view: &ListView) -> Result<()> {
    state
        .messenger
        .edit_inline_keyboard(msg, &view.render(), view.keyboard())
        .await
}
