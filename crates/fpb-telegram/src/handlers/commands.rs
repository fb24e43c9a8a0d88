use chrono::Local;

use fpb_core::{
    dialog::{Dialog, DialogKind},
    domain::{Period, RecordId, RecordScope, UserId},
    errors::ValidationError,
    formatting::{escape_html, format_record, format_shared_statistics, format_statistics},
    messaging::types::Command,
    search::SearchQuery,
    session::Conversation,
    stats::{SharedStatistics, Statistics},
    store::RecordFilter,
    Result,
};

use crate::router::AppState;

use super::views;

const SEARCH_USAGE: &str = "Usage: /search <expenses|income|plans|purchases> [text]";

pub(super) fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Explicit page argument; `None` when the command came without one.
fn parse_page(arg: &str) -> Result<Option<usize>> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Ok(None);
    }
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => Err(ValidationError::new("Page must be a positive number").into()),
    }
}

fn help_text() -> String {
    "💰 <b>Finance Planner</b>\n\n\
<b>📋 Lists:</b>\n\
/expenses [page] - Your expenses (reopens the last page)\n\
/income [page] - Your income\n\
/plans [page] - Your plans (and shared ones)\n\
/purchases [page] - Planned purchases\n\n\
<b>➕ Add:</b>\n\
/add_expense, /add_income, /add_plan, /add_purchase\n\n\
<b>🔍 Search:</b>\n\
/search &lt;scope&gt; [text] - e.g. <code>/search expenses такси</code>\n\
Filters: <code>cat:Еда</code> <code>min:100</code> <code>max:500</code> <code>~1500</code> \
<code>from:2025-01-01</code> <code>to:31.01.2025</code>\n\n\
<b>📊 Other:</b>\n\
/stats [today|week|month|year|all] - Statistics\n\
/shared [period] - Everyone's totals, today by default\n\
/delete &lt;id&gt; - Delete a record\n\
/cancel - Cancel the current action"
        .to_string()
}

pub(super) async fn handle_command(
    state: &AppState,
    conv: &mut Conversation,
    cmd: Command,
) -> Result<()> {
    let chat_id = cmd.chat_id;
    let user_id = cmd.user_id;
    tracing::info!(
        user_id = user_id.0,
        username = cmd.username.as_deref().unwrap_or("unknown"),
        command = %cmd.name,
        "command"
    );

    // Any command abandons an unfinished dialog.
    let had_dialog = conv.end_dialog();

    match cmd.name.as_str() {
        "start" => {
            conv.reset();
            state.messenger.send_html(chat_id, &help_text()).await?;
        }

        "help" => {
            state.messenger.send_html(chat_id, &help_text()).await?;
        }

        "cancel" => {
            let text = if had_dialog {
                "❌ Cancelled."
            } else {
                "Nothing to cancel."
            };
            state.messenger.send_html(chat_id, text).await?;
        }

        "expenses" | "income" | "plans" | "purchases" => {
            let scope = RecordScope::from_key(&cmd.name)
                .ok_or_else(|| ValidationError::new("Unknown list"))?;
            // Without an argument, reopen the page this list was last left on.
            let page = parse_page(&cmd.args)?.unwrap_or_else(|| conv.last_page(scope));
            let view = views::load(state, conv, user_id, scope, page).await?;
            views::send(state, chat_id, &view).await?;
        }

        "add_expense" | "add_income" | "add_plan" | "add_purchase" => {
            let kind = match cmd.name.as_str() {
                "add_expense" => DialogKind::AddExpense,
                "add_income" => DialogKind::AddIncome,
                "add_plan" => DialogKind::AddPlan,
                _ => DialogKind::AddPurchase,
            };
            let ctx = state.cfg.dialog_context(Local::now().date_naive());
            let (dialog, prompt) = Dialog::start(kind, &ctx);
            conv.start_dialog(dialog);
            state.messenger.send_html(chat_id, &escape_html(&prompt)).await?;
        }

        "search" => {
            let (scope_arg, text) = cmd
                .args
                .split_once(char::is_whitespace)
                .map(|(s, t)| (s, t.trim()))
                .unwrap_or((cmd.args.as_str(), ""));
            let scope = RecordScope::from_key(scope_arg)
                .ok_or_else(|| ValidationError::new(SEARCH_USAGE))?;

            if text.is_empty() {
                let ctx = state.cfg.dialog_context(Local::now().date_naive());
                let (dialog, prompt) = Dialog::start(DialogKind::Search(scope), &ctx);
                conv.start_dialog(dialog);
                state.messenger.send_html(chat_id, &escape_html(&prompt)).await?;
            } else {
                conv.set_search(scope, SearchQuery::parse(text));
                let view = views::load(state, conv, user_id, scope, 1).await?;
                views::send(state, chat_id, &view).await?;
            }
        }

        "stats" => {
            let period = Period::parse(&cmd.args).ok_or_else(|| {
                ValidationError::new("Period must be one of: today, week, month, year, all")
            })?;
            let today = Local::now().date_naive();
            let mut records = Vec::new();
            for scope in [RecordScope::Expenses, RecordScope::Income] {
                let filter = RecordFilter::new(scope, today).with_period(period);
                records.extend(state.store.fetch_all(user_id, filter).await?);
            }
            let stats = Statistics::compute(&records, period, today);
            state
                .messenger
                .send_html(chat_id, &format_statistics(&stats))
                .await?;
        }

        "shared" => {
            let period = if cmd.args.trim().is_empty() {
                Period::Today
            } else {
                Period::parse(&cmd.args).ok_or_else(|| {
                    ValidationError::new("Period must be one of: today, week, month, year, all")
                })?
            };
            let today = Local::now().date_naive();
            let mut members = Vec::with_capacity(state.cfg.telegram_allowed_users.len());
            for &member in &state.cfg.telegram_allowed_users {
                let owner = UserId(member);
                let mut records = Vec::new();
                for scope in [RecordScope::Expenses, RecordScope::Income] {
                    let filter = RecordFilter::new(scope, today).with_period(period);
                    records.extend(state.store.fetch_all(owner, filter).await?);
                }
                members.push((owner, records));
            }
            let stats = SharedStatistics::compute(&members, period, today);
            state
                .messenger
                .send_html(chat_id, &format_shared_statistics(&stats, user_id))
                .await?;
        }

        "delete" => {
            let id = cmd
                .args
                .trim()
                .trim_start_matches('#')
                .parse::<u64>()
                .map(RecordId)
                .map_err(|_| ValidationError::new("Usage: /delete <id>"))?;
            let record = state.store.get(user_id, id).await?;
            state.store.soft_delete(user_id, id).await?;
            state
                .messenger
                .send_html(
                    chat_id,
                    &format!("🗑 Deleted #{id}: {}", format_record(&record)),
                )
                .await?;
        }

        _ => {
            state
                .messenger
                .send_html(chat_id, "Unknown command. Use /help.")
                .await?;
        }
    }

    Ok(())
}
