use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{Period, Record, RecordBody, TransactionType, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: usize,
}

/// Income/expense summary for one period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statistics {
    pub period: Period,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub income_by_category: Vec<CategoryTotal>,
    pub expense_by_category: Vec<CategoryTotal>,
}

impl Statistics {
    /// Summarize the transactions in `records` that fall inside `period`.
    /// Deleted records and non-transactions are ignored.
    pub fn compute(records: &[Record], period: Period, today: NaiveDate) -> Self {
        let mut income: HashMap<&str, CategoryTotal> = HashMap::new();
        let mut expense: HashMap<&str, CategoryTotal> = HashMap::new();

        for record in records {
            if record.deleted || !period.contains(record.date, today) {
                continue;
            }
            let RecordBody::Transaction {
                tx_type,
                amount,
                category,
                ..
            } = &record.body
            else {
                continue;
            };
            let bucket = match tx_type {
                TransactionType::Income => &mut income,
                TransactionType::Expense => &mut expense,
            };
            let entry = bucket
                .entry(category.as_str())
                .or_insert_with(|| CategoryTotal {
                    category: category.clone(),
                    total: Decimal::ZERO,
                    count: 0,
                });
            entry.total += *amount;
            entry.count += 1;
        }

        let income_by_category = sorted(income);
        let expense_by_category = sorted(expense);
        Self {
            period,
            income_total: income_by_category.iter().map(|c| c.total).sum(),
            expense_total: expense_by_category.iter().map(|c| c.total).sum(),
            income_by_category,
            expense_by_category,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.income_total - self.expense_total
    }

    pub fn is_empty(&self) -> bool {
        self.income_by_category.is_empty() && self.expense_by_category.is_empty()
    }
}

/// Statistics for everyone sharing the bot: one block per member plus the combined total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedStatistics {
    pub period: Period,
    pub members: Vec<(UserId, Statistics)>,
    pub combined: Statistics,
}

impl SharedStatistics {
    /// `members` pairs each user with the records fetched for them. Only records
    /// the user owns are counted, so shared records are never summed twice.
    pub fn compute(members: &[(UserId, Vec<Record>)], period: Period, today: NaiveDate) -> Self {
        let owned: Vec<(UserId, Vec<Record>)> = members
            .iter()
            .map(|(user, records)| {
                let mine = records.iter().filter(|r| r.owner == *user).cloned().collect();
                (*user, mine)
            })
            .collect();

        let all: Vec<Record> = owned.iter().flat_map(|(_, r)| r.iter().cloned()).collect();
        Self {
            period,
            members: owned
                .iter()
                .map(|(user, records)| (*user, Statistics::compute(records, period, today)))
                .collect(),
            combined: Statistics::compute(&all, period, today),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.combined.is_empty()
    }
}

fn sorted(map: HashMap<&str, CategoryTotal>) -> Vec<CategoryTotal> {
    let mut out: Vec<_> = map.into_values().collect();
    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    out
}
