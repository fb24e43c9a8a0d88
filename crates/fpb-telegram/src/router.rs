use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::BotCommand};

use fpb_core::{
    config::Config, listing::ListingService, messaging::port::MessagingPort,
    session::SessionStore, store::RecordSource,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: Arc<dyn RecordSource>,
    pub listing: Arc<ListingService>,
    pub sessions: Arc<SessionStore>,
    pub messenger: Arc<dyn MessagingPort>,
}

impl AppState {
    pub fn new(
        cfg: Arc<Config>,
        store: Arc<dyn RecordSource>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        let listing = Arc::new(ListingService::new(
            store.clone(),
            cfg.paginator(),
            cfg.search_filter(),
        ));
        Self {
            cfg,
            store,
            listing,
            sessions: Arc::new(SessionStore::new()),
            messenger,
        }
    }
}

fn bot_commands() -> Vec<BotCommand> {
    [
        ("expenses", "List expenses"),
        ("income", "List income"),
        ("plans", "List plans"),
        ("purchases", "List planned purchases"),
        ("add_expense", "Add an expense"),
        ("add_income", "Add income"),
        ("add_plan", "Add a plan"),
        ("add_purchase", "Add a planned purchase"),
        ("search", "Search records"),
        ("stats", "Income and expense statistics"),
        ("shared", "Combined finances of all members"),
        ("delete", "Delete a record by id"),
        ("cancel", "Cancel the current action"),
        ("help", "Show help"),
    ]
    .into_iter()
    .map(|(cmd, desc)| BotCommand::new(cmd, desc))
    .collect()
}

pub async fn run_polling(cfg: Arc<Config>, store: Arc<dyn RecordSource>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "bot started"),
        Err(e) => tracing::warn!(error = %e, "get_me failed"),
    }
    tracing::info!(
        allowed_users = cfg.telegram_allowed_users.len(),
        page_size = cfg.page_size,
        data_file = %cfg.data_file.display(),
        "configuration loaded"
    );

    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        tracing::warn!(error = %e, "failed to register bot commands");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState::new(cfg, store, messenger));

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
