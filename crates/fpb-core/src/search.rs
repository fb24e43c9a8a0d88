//! Free-text and structured record search.
//!
//! Everything here is pure and never fails: a malformed search token narrows
//! the result to nothing instead of surfacing an error to the user.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::{Record, SearchField};

pub const DEFAULT_AMOUNT_TOLERANCE_PCT: u32 = 10;

/// How multi-word queries combine their tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenMode {
    /// A record matches if any single token matches (recall over precision).
    #[default]
    Any,
    /// Every token must match somewhere in the field.
    All,
}

impl TokenMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "any" | "or" => Some(TokenMode::Any),
            "all" | "and" => Some(TokenMode::All),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    pub token_mode: TokenMode,
    /// Relative band for "around X" amount searches, in percent of X.
    pub amount_tolerance_pct: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            token_mode: TokenMode::Any,
            amount_tolerance_pct: DEFAULT_AMOUNT_TOLERANCE_PCT,
        }
    }
}

/// Record-side seam for searching. Implemented for [`Record`]; tests use plain structs.
pub trait Searchable {
    fn search_text(&self, field: SearchField) -> Option<&str>;
    fn search_amount(&self) -> Option<Decimal>;
    fn search_category(&self) -> Option<&str>;
    fn search_date(&self) -> Option<NaiveDate>;
}

impl Searchable for Record {
    fn search_text(&self, field: SearchField) -> Option<&str> {
        self.text_field(field)
    }

    fn search_amount(&self) -> Option<Decimal> {
        self.amount()
    }

    fn search_category(&self) -> Option<&str> {
        Some(self.category())
    }

    fn search_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

/// Trimmed, case-folded query text. Empty means "no filter".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    text: String,
    tokens: Vec<String>,
}

impl NormalizedQuery {
    pub fn new(raw: &str) -> Self {
        let text = raw.trim().to_lowercase();
        let tokens = text.split_whitespace().map(str::to_string).collect();
        Self { text, tokens }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Numeric narrowing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AmountFilter {
    /// Within the configured tolerance of the first number in the text.
    Around(String),
    Range {
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
    /// A bound could not be parsed; nothing matches.
    Unmatchable,
}

/// Inclusive date window; either side may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }
}

/// A user's search: free text plus optional structured predicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub raw: String,
    pub text: NormalizedQuery,
    pub category: Option<String>,
    pub amount: Option<AmountFilter>,
    pub dates: Option<DateRange>,
    /// Set when a date token failed to parse; nothing matches.
    pub invalid_dates: bool,
}

impl SearchQuery {
    pub fn text(raw: &str) -> Self {
        Self {
            raw: raw.trim().to_string(),
            text: NormalizedQuery::new(raw),
            ..Self::default()
        }
    }

    /// Parse free-form search input.
    ///
    /// Recognised tokens: `cat:<name>`, `min:<n>`, `max:<n>`, `from:<date>`,
    /// `to:<date>` and `~<n>`. Everything else is free text.
    pub fn parse(raw: &str) -> Self {
        let mut q = SearchQuery {
            raw: raw.trim().to_string(),
            ..SearchQuery::default()
        };
        let mut words: Vec<&str> = Vec::new();
        let mut min: Option<Option<Decimal>> = None;
        let mut max: Option<Option<Decimal>> = None;
        let mut dates = DateRange::default();
        let mut has_dates = false;

        for word in raw.split_whitespace() {
            let lower = word.to_lowercase();
            if let Some(v) = lower.strip_prefix("cat:") {
                q.category = Some(v.to_string()).filter(|s| !s.is_empty());
            } else if let Some(v) = lower.strip_prefix("min:") {
                min = Some(parse_amount_token(v));
            } else if let Some(v) = lower.strip_prefix("max:") {
                max = Some(parse_amount_token(v));
            } else if let Some(v) = lower.strip_prefix("from:") {
                has_dates = true;
                dates.from = parse_search_date(v);
                q.invalid_dates |= dates.from.is_none();
            } else if let Some(v) = lower.strip_prefix("to:") {
                has_dates = true;
                dates.to = parse_search_date(v);
                q.invalid_dates |= dates.to.is_none();
            } else if let Some(v) = word.strip_prefix('~') {
                q.amount = Some(AmountFilter::Around(v.to_string()));
            } else {
                words.push(word);
            }
        }

        if min.is_some() || max.is_some() {
            q.amount = match (min, max) {
                (Some(None), _) | (_, Some(None)) => Some(AmountFilter::Unmatchable),
                (min, max) => Some(AmountFilter::Range {
                    min: min.flatten(),
                    max: max.flatten(),
                }),
            };
        }
        if has_dates {
            q.dates = Some(dates);
        }
        q.text = NormalizedQuery::new(&words.join(" "));
        q
    }

    /// True when the query narrows nothing.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.category.is_none()
            && self.amount.is_none()
            && self.dates.is_none()
            && !self.invalid_dates
    }
}

/// Decides whether records match a query.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchFilter {
    options: SearchOptions,
}

impl SearchFilter {
    pub fn new(options: SearchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn normalize(query: &str) -> NormalizedQuery {
        NormalizedQuery::new(query)
    }

    /// Whether `field` contains the whole query or, per token mode, its tokens.
    pub fn matches_text(&self, field: &str, query: &NormalizedQuery) -> bool {
        if query.is_empty() {
            return true;
        }
        let field = field.to_lowercase();
        if field.contains(query.as_str()) {
            return true;
        }
        match self.options.token_mode {
            TokenMode::Any => query.tokens().iter().any(|t| field.contains(t.as_str())),
            TokenMode::All => query.tokens().iter().all(|t| field.contains(t.as_str())),
        }
    }

    /// Keep records where at least one of `fields` matches. Order is preserved.
    pub fn filter_records<R: Searchable>(
        &self,
        records: Vec<R>,
        query: &NormalizedQuery,
        fields: &[SearchField],
    ) -> Vec<R> {
        if query.is_empty() {
            return records;
        }
        records
            .into_iter()
            .filter(|r| self.matches_fields(r, query, fields))
            .collect()
    }

    /// Whether `amount` is within tolerance of the first number in `query_text`.
    ///
    /// No number, an unparsable number, or a zero target all yield `false`.
    pub fn match_amount_range(&self, amount: Decimal, query_text: &str) -> bool {
        let Some(target) = parse_amount_token(query_text) else {
            return false;
        };
        if target.is_zero() {
            return false;
        }
        let tolerance = Decimal::from(self.options.amount_tolerance_pct) / Decimal::ONE_HUNDRED;
        // |amount - target| <= tolerance * |target|; checked so extreme inputs just miss.
        let Some(diff) = amount.checked_sub(target) else {
            return false;
        };
        match target.abs().checked_mul(tolerance) {
            Some(allowed) => diff.abs() <= allowed,
            None => false,
        }
    }

    pub fn matches<R: Searchable>(
        &self,
        record: &R,
        query: &SearchQuery,
        fields: &[SearchField],
    ) -> bool {
        if query.invalid_dates {
            return false;
        }
        if !self.matches_fields(record, &query.text, fields) {
            return false;
        }
        if let Some(cat) = &query.category {
            let Some(rc) = record.search_category() else {
                return false;
            };
            if rc.to_lowercase() != *cat {
                return false;
            }
        }
        if let Some(filter) = &query.amount {
            let Some(amount) = record.search_amount() else {
                return false;
            };
            let ok = match filter {
                AmountFilter::Around(text) => self.match_amount_range(amount, text),
                AmountFilter::Range { min, max } => {
                    min.map_or(true, |m| amount >= m) && max.map_or(true, |m| amount <= m)
                }
                AmountFilter::Unmatchable => false,
            };
            if !ok {
                return false;
            }
        }
        if let Some(range) = &query.dates {
            let Some(date) = record.search_date() else {
                return false;
            };
            if !range.contains(date) {
                return false;
            }
        }
        true
    }

    /// Text filter plus structured predicates. Order is preserved.
    pub fn apply<R: Searchable>(
        &self,
        records: Vec<R>,
        query: &SearchQuery,
        fields: &[SearchField],
    ) -> Vec<R> {
        if query.is_empty() {
            return records;
        }
        records
            .into_iter()
            .filter(|r| self.matches(r, query, fields))
            .collect()
    }

    fn matches_fields<R: Searchable>(
        &self,
        record: &R,
        query: &NormalizedQuery,
        fields: &[SearchField],
    ) -> bool {
        if query.is_empty() {
            return true;
        }
        fields
            .iter()
            .filter_map(|f| record.search_text(*f))
            .any(|text| self.matches_text(text, query))
    }
}

fn amount_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+[.,]?\d*").expect("valid regex"))
}

/// First number in `text`, accepting `.` or `,` as decimal separator.
pub fn parse_amount_token(text: &str) -> Option<Decimal> {
    let m = amount_token_re().find(text)?;
    let normalized = m.as_str().replace(',', ".");
    Decimal::from_str(normalized.trim_end_matches('.')).ok()
}

fn parse_search_date(s: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
