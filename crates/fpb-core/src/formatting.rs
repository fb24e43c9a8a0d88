//! Formatting utilities (records, pages and statistics → Telegram HTML).

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    domain::{Priority, Record, RecordBody, TransactionType, UserId},
    pagination::PageInfo,
    stats::{CategoryTotal, SharedStatistics, Statistics},
};

const CURRENCY: &str = "₽";

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `1234567.5` → `1 234 567,50`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped},{frac_part}")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Cut `text` to `max_len` characters, ending with `...` when shortened.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    format!("{}...", text.chars().take(keep).collect::<String>())
}

fn priority_emoji(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "🔴",
        Priority::Medium => "🟡",
        Priority::Low => "🟢",
    }
}

/// One-line HTML summary of a record.
pub fn format_record(record: &Record) -> String {
    match &record.body {
        RecordBody::Transaction {
            tx_type,
            amount,
            category,
            description,
        } => {
            let emoji = match tx_type {
                TransactionType::Income => "💵",
                TransactionType::Expense => "💸",
            };
            let mut line = format!(
                "{emoji} {} {CURRENCY} - {} ({})",
                format_amount(*amount),
                escape_html(category),
                format_date(record.date)
            );
            if let Some(desc) = description.as_deref().filter(|d| !d.is_empty()) {
                line.push_str(" | ");
                line.push_str(&escape_html(&truncate_text(desc, 30)));
            }
            line
        }
        RecordBody::Plan { title, shared, .. } => {
            let shared = if *shared { " 👥" } else { "" };
            let when = match record.time {
                Some(t) => format!("{} at {}", format_date(record.date), t.format("%H:%M")),
                None => format_date(record.date),
            };
            format!("{}{shared} - {when}", escape_html(&truncate_text(title, 25)))
        }
        RecordBody::Purchase {
            item_name,
            estimated_cost,
            priority,
            target_date,
            ..
        } => {
            let by = target_date
                .map(|d| format!(" by {}", format_date(d)))
                .unwrap_or_default();
            format!(
                "{} {} - {} {CURRENCY}{by}",
                priority_emoji(*priority),
                escape_html(&truncate_text(item_name, 20)),
                format_amount(*estimated_cost)
            )
        }
    }
}

/// `📄 Page X of Y (showing A–B of N)`.
pub fn page_footer(info: &PageInfo) -> String {
    format!(
        "📄 Page {} of {} (showing {}–{} of {})",
        info.current_page, info.total_pages, info.start_item, info.end_item, info.total_items
    )
}

/// Render one page of records. Items are numbered by their global position.
pub fn render_page(
    title: &str,
    records: &[Record],
    info: &PageInfo,
    search: Option<&str>,
) -> String {
    let mut out = format!("<b>{}</b>\n", escape_html(title));
    if let Some(q) = search {
        out.push_str(&format!("🔍 Search: <i>{}</i>\n", escape_html(q)));
    }
    out.push('\n');

    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} <code>#{}</code>\n",
            info.start_item + i,
            format_record(record),
            record.id
        ));
    }

    out.push('\n');
    out.push_str(&page_footer(info));
    out
}

/// Message for an empty result set. A search with no hits is not an error.
pub fn render_empty(title: &str, search: Option<&str>) -> String {
    match search {
        Some(q) => format!(
            "<b>{}</b>\n🔍 Nothing matches <i>{}</i>.",
            escape_html(title),
            escape_html(q)
        ),
        None => format!("<b>{}</b>\n📭 No records yet.", escape_html(title)),
    }
}

fn category_lines(out: &mut String, items: &[CategoryTotal]) {
    for c in items {
        out.push_str(&format!(
            "  • {}: {} {CURRENCY} ({})\n",
            escape_html(&c.category),
            format_amount(c.total),
            c.count
        ));
    }
}

fn totals_block(out: &mut String, stats: &Statistics) {
    out.push_str(&format!(
        "💵 Income: {} {CURRENCY}\n",
        format_amount(stats.income_total)
    ));
    category_lines(out, &stats.income_by_category);
    out.push_str(&format!(
        "💸 Expenses: {} {CURRENCY}\n",
        format_amount(stats.expense_total)
    ));
    category_lines(out, &stats.expense_by_category);

    let balance = stats.balance();
    let emoji = if balance.is_sign_negative() && !balance.is_zero() {
        "📉"
    } else {
        "📈"
    };
    out.push_str(&format!(
        "\n{emoji} Balance: {} {CURRENCY}",
        format_amount(balance)
    ));
}

pub fn format_statistics(stats: &Statistics) -> String {
    let mut out = format!("📊 <b>Statistics for {}</b>\n\n", stats.period.label());
    if stats.is_empty() {
        out.push_str("No transactions in this period.");
        return out;
    }
    totals_block(&mut out, stats);
    out
}

/// Per-member totals followed by the combined breakdown. `viewer` is shown as "You".
pub fn format_shared_statistics(stats: &SharedStatistics, viewer: UserId) -> String {
    let mut out = format!("👫 <b>Shared finances for {}</b>\n\n", stats.period.label());
    if stats.is_empty() {
        out.push_str("No transactions in this period.");
        return out;
    }

    for (user, member) in &stats.members {
        let name = if *user == viewer {
            "You".to_string()
        } else {
            format!("User {}", user.0)
        };
        out.push_str(&format!(
            "👤 <b>{name}</b>: 💵 {} {CURRENCY} · 💸 {} {CURRENCY}\n",
            format_amount(member.income_total),
            format_amount(member.expense_total)
        ));
    }

    out.push_str("\n<b>Together</b>\n");
    totals_block(&mut out, &stats.combined);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::fixtures::expense, domain::Period, pagination::Paginator};
    use std::str::FromStr;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn amounts_group_thousands() {
        assert_eq!(format_amount(Decimal::from(1234567)), "1 234 567,00");
        assert_eq!(format_amount(Decimal::from_str("999.5").unwrap()), "999,50");
        assert_eq!(format_amount(Decimal::from_str("1000.005").unwrap()), "1 000,01");
        assert_eq!(format_amount(Decimal::from(-2500)), "-2 500,00");
        assert_eq!(format_amount(Decimal::ZERO), "0,00");
    }

    #[test]
    fn truncation_counts_chars() {
        assert_eq!(truncate_text("короткий", 10), "короткий");
        assert_eq!(truncate_text("абвгдеёжзийк", 10), "абвгдеё...");
    }

    #[test]
    fn transaction_line_escapes_and_truncates() {
        let r = expense(1, 1500, "Еда", Some("<b>very long description that keeps going</b>"));
        let line = format_record(&r);
        assert!(line.starts_with("💸 1 500,00 ₽ - Еда (02.03.2025) | "));
        assert!(line.contains("&lt;b&gt;"));
        assert!(line.ends_with("..."));
    }

    #[test]
    fn page_uses_global_numbering() {
        let records: Vec<_> = (1..=7).map(|i| expense(i, 100, "Еда", None)).collect();
        let (slice, info) = Paginator::new(5).unwrap().paginate(&records, 2);
        let text = render_page("Your expenses", slice, &info, Some("еда"));
        assert!(text.contains("6. "));
        assert!(text.contains("7. "));
        assert!(!text.contains("\n1. "));
        assert!(text.contains("🔍 Search: <i>еда</i>"));
        assert!(text.ends_with("📄 Page 2 of 2 (showing 6–7 of 7)"));
    }

    #[test]
    fn empty_search_differs_from_empty_list() {
        assert!(render_empty("Your income", Some("x")).contains("Nothing matches"));
        assert!(render_empty("Your income", None).contains("No records yet"));
    }

    #[test]
    fn statistics_show_balance() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let stats = Statistics::compute(&[expense(1, 300, "Еда", None)], Period::Month, today);
        let text = format_statistics(&stats);
        assert!(text.contains("Statistics for this month"));
        assert!(text.contains("Еда: 300,00 ₽ (1)"));
        assert!(text.ends_with("📉 Balance: -300,00 ₽"));
    }

    #[test]
    fn shared_statistics_name_the_viewer() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let mut theirs = expense(2, 700, "Еда", None);
        theirs.owner = UserId(2);
        let shared = SharedStatistics::compute(
            &[
                (UserId(1), vec![expense(1, 300, "Еда", None)]),
                (UserId(2), vec![theirs]),
            ],
            Period::Month,
            today,
        );

        let text = format_shared_statistics(&shared, UserId(2));
        assert!(text.starts_with("👫 <b>Shared finances for this month</b>"));
        assert!(text.contains("👤 <b>User 1</b>: 💵 0,00 ₽ · 💸 300,00 ₽"));
        assert!(text.contains("👤 <b>You</b>: 💵 0,00 ₽ · 💸 700,00 ₽"));
        assert!(text.contains("Еда: 1 000,00 ₽ (2)"));
        assert!(text.ends_with("📉 Balance: -1 000,00 ₽"));

        let empty = SharedStatistics::compute(&[], Period::Today, today);
        assert!(format_shared_statistics(&empty, UserId(1)).ends_with("No transactions in this period."));
    }
}
