use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Stable record identifier, assigned by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Kind-specific payload of a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordBody {
    Transaction {
        tx_type: TransactionType,
        amount: Decimal,
        category: String,
        description: Option<String>,
    },
    Plan {
        title: String,
        description: Option<String>,
        category: String,
        shared: bool,
    },
    Purchase {
        item_name: String,
        estimated_cost: Decimal,
        priority: Priority,
        target_date: Option<NaiveDate>,
        notes: Option<String>,
    },
}

/// A transaction, plan, or planned purchase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub owner: UserId,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
    pub body: RecordBody,
}

/// A record composed by a dialog, before the store assigns identity.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRecord {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub body: RecordBody,
}

/// Text fields a search can look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchField {
    Category,
    Description,
    Title,
    ItemName,
    Notes,
}

/// Listable subsets of a user's records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordScope {
    Expenses,
    Income,
    Plans,
    Purchases,
}

impl RecordScope {
    pub const ALL: [RecordScope; 4] = [
        RecordScope::Expenses,
        RecordScope::Income,
        RecordScope::Plans,
        RecordScope::Purchases,
    ];

    /// Short identifier used in commands and callback data.
    pub fn key(self) -> &'static str {
        match self {
            RecordScope::Expenses => "expenses",
            RecordScope::Income => "income",
            RecordScope::Plans => "plans",
            RecordScope::Purchases => "purchases",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|scope| {
            scope.key() == s
                || match scope {
                    RecordScope::Expenses => s == "expense",
                    RecordScope::Income => s == "incomes",
                    RecordScope::Plans => s == "plan",
                    RecordScope::Purchases => s == "purchase",
                }
        })
    }

    pub fn title(self) -> &'static str {
        match self {
            RecordScope::Expenses => "Your expenses",
            RecordScope::Income => "Your income",
            RecordScope::Plans => "Your plans",
            RecordScope::Purchases => "Your planned purchases",
        }
    }

    /// Fields searched when the user types free text for this scope.
    pub fn search_fields(self) -> &'static [SearchField] {
        match self {
            RecordScope::Expenses | RecordScope::Income => {
                &[SearchField::Category, SearchField::Description]
            }
            RecordScope::Plans => &[
                SearchField::Title,
                SearchField::Description,
                SearchField::Category,
            ],
            RecordScope::Purchases => &[SearchField::ItemName, SearchField::Notes],
        }
    }
}

/// Time window for statistics and list filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Period {
    Today,
    Week,
    Month,
    Year,
    All,
}

impl Period {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" | "day" => Some(Period::Today),
            "week" => Some(Period::Week),
            "month" | "" => Some(Period::Month),
            "year" => Some(Period::Year),
            "all" => Some(Period::All),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "the last 7 days",
            Period::Month => "this month",
            Period::Year => "this year",
            Period::All => "all time",
        }
    }

    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Period::Today => date == today,
            Period::Week => date >= today - Duration::days(7),
            Period::Month => date.year() == today.year() && date.month() == today.month(),
            Period::Year => date.year() == today.year(),
            Period::All => true,
        }
    }
}

impl Record {
    pub fn kind_matches(&self, scope: RecordScope) -> bool {
        match (&self.body, scope) {
            (RecordBody::Transaction { tx_type, .. }, RecordScope::Expenses) => {
                *tx_type == TransactionType::Expense
            }
            (RecordBody::Transaction { tx_type, .. }, RecordScope::Income) => {
                *tx_type == TransactionType::Income
            }
            (RecordBody::Plan { .. }, RecordScope::Plans) => true,
            (RecordBody::Purchase { .. }, RecordScope::Purchases) => true,
            _ => false,
        }
    }

    /// Whether `user` may see this record (own records plus shared plans).
    pub fn visible_to(&self, user: UserId) -> bool {
        if self.deleted {
            return false;
        }
        self.owner == user || matches!(self.body, RecordBody::Plan { shared: true, .. })
    }

    pub fn text_field(&self, field: SearchField) -> Option<&str> {
        let value = match (&self.body, field) {
            (RecordBody::Transaction { category, .. }, SearchField::Category)
            | (RecordBody::Plan { category, .. }, SearchField::Category) => category,
            (RecordBody::Transaction { description, .. }, SearchField::Description)
            | (RecordBody::Plan { description, .. }, SearchField::Description) => {
                description.as_ref()?
            }
            (RecordBody::Plan { title, .. }, SearchField::Title) => title,
            (RecordBody::Purchase { item_name, .. }, SearchField::ItemName) => item_name,
            (RecordBody::Purchase { notes, .. }, SearchField::Notes) => notes.as_ref()?,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Amount for transactions, estimated cost for purchases.
    pub fn amount(&self) -> Option<Decimal> {
        match &self.body {
            RecordBody::Transaction { amount, .. } => Some(*amount),
            RecordBody::Purchase { estimated_cost, .. } => Some(*estimated_cost),
            RecordBody::Plan { .. } => None,
        }
    }

    /// Categorical field: category, or priority for purchases.
    pub fn category(&self) -> &str {
        match &self.body {
            RecordBody::Transaction { category, .. } | RecordBody::Plan { category, .. } => {
                category
            }
            RecordBody::Purchase { priority, .. } => priority.as_str(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::expense;
    use super::*;

    #[test]
    fn scope_keys_round_trip() {
        for scope in RecordScope::ALL {
            assert_eq!(RecordScope::from_key(scope.key()), Some(scope));
        }
        assert_eq!(RecordScope::from_key("Expense"), Some(RecordScope::Expenses));
        assert_eq!(RecordScope::from_key("bogus"), None);
    }

    #[test]
    fn shared_plans_are_visible_to_others() {
        let mut r = expense(1, 10, "Еда", None);
        assert!(r.visible_to(UserId(1)));
        assert!(!r.visible_to(UserId(2)));

        r.body = RecordBody::Plan {
            title: "Trip".to_string(),
            description: None,
            category: "отдых".to_string(),
            shared: true,
        };
        assert!(r.visible_to(UserId(2)));

        r.deleted = true;
        assert!(!r.visible_to(UserId(1)));
    }

    #[test]
    fn text_fields_follow_record_kind() {
        let r = expense(1, 10, "Транспорт", Some("такси домой"));
        assert_eq!(r.text_field(SearchField::Category), Some("Транспорт"));
        assert_eq!(r.text_field(SearchField::Description), Some("такси домой"));
        assert_eq!(r.text_field(SearchField::Title), None);
        assert_eq!(r.amount(), Some(Decimal::from(10)));
    }

    #[test]
    fn period_month_is_calendar_month() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert!(Period::Month.contains(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), today));
        assert!(!Period::Month.contains(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(), today));
        assert!(Period::Week.contains(NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(), today));
        assert!(!Period::Week.contains(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(), today));
    }
}
