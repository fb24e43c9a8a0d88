//! Inline keyboards and the callback data they carry.

use crate::{
    domain::RecordScope,
    messaging::types::{InlineButton, InlineKeyboard},
    pagination::PageInfo,
};

const NOOP: &str = "noop";

/// What a pressed inline button asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Page { scope: RecordScope, page: usize },
    SearchStart(RecordScope),
    SearchClear(RecordScope),
    Noop,
}

impl CallbackAction {
    /// Compact callback data, well under Telegram's 64-byte limit.
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Page { scope, page } => format!("pg:{}:{page}", scope.key()),
            CallbackAction::SearchStart(scope) => format!("sr:{}:start", scope.key()),
            CallbackAction::SearchClear(scope) => format!("sr:{}:clear", scope.key()),
            CallbackAction::Noop => NOOP.to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        if data == NOOP {
            return Some(CallbackAction::Noop);
        }
        let mut parts = data.splitn(3, ':');
        let (tag, scope, arg) = (parts.next()?, parts.next()?, parts.next()?);
        let scope = RecordScope::from_key(scope)?;
        match (tag, arg) {
            ("pg", n) => {
                let page = n.parse::<usize>().ok().filter(|p| *p >= 1)?;
                Some(CallbackAction::Page { scope, page })
            }
            ("sr", "start") => Some(CallbackAction::SearchStart(scope)),
            ("sr", "clear") => Some(CallbackAction::SearchClear(scope)),
            _ => None,
        }
    }

    fn button(self, label: impl Into<String>) -> InlineButton {
        InlineButton::new(label, self.encode())
    }
}

/// `[◀️] [X/Y] [▶️]` plus a search row.
///
/// The navigation row is omitted when there are no pages.
pub fn pagination_keyboard(info: &PageInfo, scope: RecordScope, search_active: bool) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::default();

    if info.total_pages > 0 {
        let mut nav = Vec::with_capacity(3);
        if info.has_prev {
            nav.push(
                CallbackAction::Page {
                    scope,
                    page: info.current_page - 1,
                }
                .button("◀️"),
            );
        }
        nav.push(
            CallbackAction::Noop.button(format!("{}/{}", info.current_page, info.total_pages)),
        );
        if info.has_next {
            nav.push(
                CallbackAction::Page {
                    scope,
                    page: info.current_page + 1,
                }
                .button("▶️"),
            );
        }
        keyboard.push_row(nav);
    }

    let search = if search_active {
        CallbackAction::SearchClear(scope).button("❌ Clear search")
    } else {
        CallbackAction::SearchStart(scope).button("🔍 Search")
    };
    keyboard.push_row(vec![search]);
    keyboard
}
