use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    dialog::Dialog,
    domain::{ChatId, RecordScope, UserId},
    search::SearchQuery,
};

/// Per-conversation interaction state.
///
/// Handlers lock one conversation for the whole update and pass it down
/// explicitly, so search state never leaks between users.
#[derive(Debug, Default)]
pub struct Conversation {
    dialog: Option<Dialog>,
    searches: HashMap<RecordScope, SearchQuery>,
    last_pages: HashMap<RecordScope, usize>,
}

impl Conversation {
    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn dialog_mut(&mut self) -> Option<&mut Dialog> {
        self.dialog.as_mut()
    }

    pub fn start_dialog(&mut self, dialog: Dialog) {
        self.dialog = Some(dialog);
    }

    /// Drop the active dialog, returning whether there was one.
    pub fn end_dialog(&mut self) -> bool {
        self.dialog.take().is_some()
    }

    pub fn search(&self, scope: RecordScope) -> Option<&SearchQuery> {
        self.searches.get(&scope)
    }

    /// Store a search for `scope`. An empty query clears it.
    pub fn set_search(&mut self, scope: RecordScope, query: SearchQuery) {
        if query.is_empty() {
            self.searches.remove(&scope);
        } else {
            self.searches.insert(scope, query);
        }
        self.last_pages.remove(&scope);
    }

    pub fn clear_search(&mut self, scope: RecordScope) -> bool {
        self.last_pages.remove(&scope);
        self.searches.remove(&scope).is_some()
    }

    pub fn last_page(&self, scope: RecordScope) -> usize {
        self.last_pages.get(&scope).copied().unwrap_or(1)
    }

    pub fn remember_page(&mut self, scope: RecordScope, page: usize) {
        self.last_pages.insert(scope, page);
    }

    /// Reset everything (used by `/start`).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Identifies a conversation: one user in one chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

/// Hands out per-conversation state. Owned by the application state, not global.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<ConversationKey, Arc<Mutex<Conversation>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn conversation(&self, key: ConversationKey) -> Arc<Mutex<Conversation>> {
        let mut map = self.inner.lock().await;
        map.entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::default())))
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(chat: i64, user: i64) -> ConversationKey {
        ConversationKey {
            chat_id: ChatId(chat),
            user_id: UserId(user),
        }
    }

    #[tokio::test]
    async fn conversations_are_isolated_per_user() {
        let store = SessionStore::new();
        let a = store.conversation(key(1, 10)).await;
        let b = store.conversation(key(1, 20)).await;

        a.lock()
            .await
            .set_search(RecordScope::Expenses, SearchQuery::parse("такси"));

        assert!(a.lock().await.search(RecordScope::Expenses).is_some());
        assert!(b.lock().await.search(RecordScope::Expenses).is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn same_key_returns_same_conversation() {
        let store = SessionStore::new();
        let first = store.conversation(key(5, 5)).await;
        first.lock().await.remember_page(RecordScope::Plans, 3);

        let again = store.conversation(key(5, 5)).await;
        assert_eq!(again.lock().await.last_page(RecordScope::Plans), 3);
    }

    #[test]
    fn new_search_resets_remembered_page() {
        let mut conv = Conversation::default();
        conv.remember_page(RecordScope::Expenses, 4);
        conv.set_search(RecordScope::Expenses, SearchQuery::parse("кофе"));
        assert_eq!(conv.last_page(RecordScope::Expenses), 1);

        conv.set_search(RecordScope::Expenses, SearchQuery::parse("   "));
        assert!(conv.search(RecordScope::Expenses).is_none());
        assert!(!conv.clear_search(RecordScope::Expenses));
    }
}
