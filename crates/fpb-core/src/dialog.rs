//! Linear data-collection dialogs.
//!
//! A dialog is a step enum plus an accumulating draft. Each valid answer moves
//! to the next step; the last step commits a composed [`NewRecord`] (or a
//! [`SearchQuery`] for search dialogs). Invalid answers keep the current step.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::{
    domain::{NewRecord, Priority, RecordBody, RecordScope, TransactionType},
    errors::ValidationError,
    search::SearchQuery,
    validation,
};

const CANCEL_WORDS: &[&str] = &["/cancel", "cancel", "отмена", "🔙 отмена"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogKind {
    AddExpense,
    AddIncome,
    AddPlan,
    AddPurchase,
    Search(RecordScope),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Amount,
    Category,
    Description,
    Title,
    Date,
    Time,
    Shared,
    ItemName,
    Cost,
    Priority,
    TargetDate,
    Notes,
    Query,
}

/// Answers collected so far.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Draft {
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub shared: Option<bool>,
    pub item_name: Option<String>,
    pub priority: Option<Priority>,
    pub target_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// What the dialog needs to validate answers.
#[derive(Clone, Debug)]
pub struct DialogContext<'a> {
    pub today: NaiveDate,
    pub expense_categories: &'a [String],
    pub income_categories: &'a [String],
    pub plan_categories: &'a [String],
    pub max_text_len: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Committed {
    Record(NewRecord),
    Search {
        scope: RecordScope,
        query: SearchQuery,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum DialogOutcome {
    /// Answer accepted; ask the next question.
    Prompt(String),
    /// Answer rejected; the step is unchanged.
    Retry(ValidationError),
    Cancelled,
    Completed(Committed),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dialog {
    kind: DialogKind,
    step: Step,
    draft: Draft,
}

impl Dialog {
    pub fn start(kind: DialogKind, ctx: &DialogContext<'_>) -> (Self, String) {
        let step = first_step(kind);
        let dialog = Self {
            kind,
            step,
            draft: Draft::default(),
        };
        let prompt = dialog.prompt(ctx);
        (dialog, prompt)
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Feed one user answer into the dialog.
    pub fn advance(&mut self, input: &str, ctx: &DialogContext<'_>) -> DialogOutcome {
        if is_cancel(input) {
            return DialogOutcome::Cancelled;
        }

        if let Err(e) = self.accept(input, ctx) {
            return DialogOutcome::Retry(e);
        }

        match next_step(self.kind, self.step) {
            Some(next) => {
                self.step = next;
                DialogOutcome::Prompt(self.prompt(ctx))
            }
            None => DialogOutcome::Completed(self.commit(input, ctx)),
        }
    }

    /// Question for the current step.
    pub fn prompt(&self, ctx: &DialogContext<'_>) -> String {
        match self.step {
            Step::Amount => "💰 Enter the amount (e.g. 1500.50):".to_string(),
            Step::Category => format!(
                "📂 Choose a category: {}",
                self.categories(ctx).join(", ")
            ),
            Step::Description => "📝 Add a description (or - to skip):".to_string(),
            Step::Title => "📅 What is the plan?".to_string(),
            Step::Date => "📆 Date (YYYY-MM-DD, DD.MM.YYYY, today, tomorrow):".to_string(),
            Step::Time => "⏰ Time HH:MM (or - to skip):".to_string(),
            Step::Shared => "👥 Share this plan? (yes/no)".to_string(),
            Step::ItemName => "🛒 What do you want to buy?".to_string(),
            Step::Cost => "💰 Estimated cost:".to_string(),
            Step::Priority => "🔴🟡🟢 Priority (high/medium/low):".to_string(),
            Step::TargetDate => "📆 Target date (or - to skip):".to_string(),
            Step::Notes => "📝 Notes (or - to skip):".to_string(),
            Step::Query => {
                "🔍 Enter search text. Filters: cat:<name> min:<n> max:<n> ~<n> from:<date> to:<date>"
                    .to_string()
            }
        }
    }

    fn categories<'a>(&self, ctx: &DialogContext<'a>) -> &'a [String] {
        match self.kind {
            DialogKind::AddIncome => ctx.income_categories,
            DialogKind::AddPlan => ctx.plan_categories,
            _ => ctx.expense_categories,
        }
    }

    fn accept(&mut self, input: &str, ctx: &DialogContext<'_>) -> Result<(), ValidationError> {
        let max = ctx.max_text_len;
        let allowed = self.categories(ctx);
        let d = &mut self.draft;
        match self.step {
            Step::Amount | Step::Cost => d.amount = Some(validation::validate_amount(input)?),
            Step::Category => d.category = Some(validation::validate_category(input, allowed)?),
            Step::Description => {
                d.description = validation::validate_text(input, "Description", max, true)?
            }
            Step::Title => d.title = validation::validate_text(input, "Title", max, false)?,
            Step::Date => d.date = Some(validation::validate_date(input, ctx.today)?.0),
            Step::Time => d.time = validation::validate_time(input)?,
            Step::Shared => d.shared = Some(validation::validate_yes_no(input)?),
            Step::ItemName => {
                d.item_name = validation::validate_text(input, "Item name", max, false)?
            }
            Step::Priority => d.priority = Some(validation::validate_priority(input)?),
            Step::TargetDate => {
                let s = input.trim();
                d.target_date = if s.is_empty() || s == "-" {
                    None
                } else {
                    Some(validation::validate_date(s, ctx.today)?.0)
                };
            }
            Step::Notes => d.notes = validation::validate_text(input, "Notes", max, true)?,
            Step::Query => {
                if input.trim().is_empty() {
                    return Err(ValidationError::new("Search text cannot be empty"));
                }
            }
        }
        Ok(())
    }

    fn commit(&self, last_input: &str, ctx: &DialogContext<'_>) -> Committed {
        let d = self.draft.clone();
        let transaction = |tx_type| NewRecord {
            date: ctx.today,
            time: None,
            body: RecordBody::Transaction {
                tx_type,
                amount: d.amount.unwrap_or_default(),
                category: d.category.clone().unwrap_or_default(),
                description: d.description.clone(),
            },
        };

        match self.kind {
            DialogKind::AddExpense => Committed::Record(transaction(TransactionType::Expense)),
            DialogKind::AddIncome => Committed::Record(transaction(TransactionType::Income)),
            DialogKind::AddPlan => Committed::Record(NewRecord {
                date: d.date.unwrap_or(ctx.today),
                time: d.time,
                body: RecordBody::Plan {
                    title: d.title.clone().unwrap_or_default(),
                    description: d.description.clone(),
                    category: d.category.clone().unwrap_or_default(),
                    shared: d.shared.unwrap_or(false),
                },
            }),
            DialogKind::AddPurchase => Committed::Record(NewRecord {
                date: ctx.today,
                time: None,
                body: RecordBody::Purchase {
                    item_name: d.item_name.clone().unwrap_or_default(),
                    estimated_cost: d.amount.unwrap_or_default(),
                    priority: d.priority.unwrap_or(Priority::Medium),
                    target_date: d.target_date,
                    notes: d.notes.clone(),
                },
            }),
            DialogKind::Search(scope) => Committed::Search {
                scope,
                query: SearchQuery::parse(last_input),
            },
        }
    }
}

pub fn is_cancel(input: &str) -> bool {
    let s = input.trim().to_lowercase();
    CANCEL_WORDS.contains(&s.as_str())
}

fn first_step(kind: DialogKind) -> Step {
    match kind {
        DialogKind::AddExpense | DialogKind::AddIncome => Step::Amount,
        DialogKind::AddPlan => Step::Title,
        DialogKind::AddPurchase => Step::ItemName,
        DialogKind::Search(_) => Step::Query,
    }
}

fn next_step(kind: DialogKind, step: Step) -> Option<Step> {
    match (kind, step) {
        (DialogKind::AddExpense | DialogKind::AddIncome, Step::Amount) => Some(Step::Category),
        (DialogKind::AddExpense | DialogKind::AddIncome, Step::Category) => Some(Step::Description),
        (DialogKind::AddPlan, Step::Title) => Some(Step::Description),
        (DialogKind::AddPlan, Step::Description) => Some(Step::Date),
        (DialogKind::AddPlan, Step::Date) => Some(Step::Time),
        (DialogKind::AddPlan, Step::Time) => Some(Step::Category),
        (DialogKind::AddPlan, Step::Category) => Some(Step::Shared),
        (DialogKind::AddPurchase, Step::ItemName) => Some(Step::Cost),
        (DialogKind::AddPurchase, Step::Cost) => Some(Step::Priority),
        (DialogKind::AddPurchase, Step::Priority) => Some(Step::TargetDate),
        (DialogKind::AddPurchase, Step::TargetDate) => Some(Step::Notes),
        _ => None,
    }
}
