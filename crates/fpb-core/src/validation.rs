//! Data-entry validators.
//!
//! Unlike search, data entry fails loudly: each validator returns a
//! [`ValidationError`] whose message is shown to the user as-is.

use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{domain::Priority, errors::ValidationError};

const MAX_AMOUNT: i64 = 1_000_000_000;

const FORBIDDEN_FRAGMENTS: &[(&str, &str)] = &[
    (";", "semicolon"),
    ("--", "double dash"),
    ("/*", "comment marker"),
    ("*/", "comment marker"),
    ("xp_", "extended procedure prefix"),
];

type VResult<T> = std::result::Result<T, ValidationError>;

/// Parse a positive money amount, rounded to two decimal places.
pub fn validate_amount(input: &str) -> VResult<Decimal> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let amount = Decimal::from_str(&cleaned)
        .map_err(|_| ValidationError::new("Invalid amount. Example: 1500.50 or 1500,50"))?;

    if amount <= Decimal::ZERO {
        return Err(ValidationError::new("Amount must be greater than 0"));
    }
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err(ValidationError::new("Amount is too large"));
    }

    Ok(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Parse a date that must not lie in the past.
///
/// Returns the date and whether it came from a keyword (`today`, `tomorrow`, ...).
pub fn validate_date(input: &str, today: NaiveDate) -> VResult<(NaiveDate, bool)> {
    let s = input.trim().to_lowercase();

    let keyword = match s.as_str() {
        "today" | "сегодня" => Some(0),
        "tomorrow" | "завтра" => Some(1),
        "day after tomorrow" | "послезавтра" => Some(2),
        _ => None,
    };
    if let Some(days) = keyword {
        return Ok((today + Duration::days(days), true));
    }

    let parsed = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&s, fmt).ok())
        .ok_or_else(|| ValidationError::new("Invalid date format. Use YYYY-MM-DD or DD.MM.YYYY"))?;

    if parsed < today {
        return Err(ValidationError::new("Date cannot be in the past"));
    }
    Ok((parsed, false))
}

/// `-` or empty means "no time".
pub fn validate_time(input: &str) -> VResult<Option<NaiveTime>> {
    let s = input.trim();
    if s.is_empty() || s == "-" {
        return Ok(None);
    }
    NaiveTime::parse_from_str(s, "%H:%M")
        .map(Some)
        .map_err(|_| ValidationError::new("Invalid time format. Use HH:MM"))
}

/// Trimmed free text with a length limit.
///
/// Returns `None` only when `allow_empty` is set and the input is empty or `-`.
pub fn validate_text(
    input: &str,
    field_name: &str,
    max_len: usize,
    allow_empty: bool,
) -> VResult<Option<String>> {
    let text = input.trim();
    if text.is_empty() || (allow_empty && text == "-") {
        if allow_empty {
            return Ok(None);
        }
        return Err(ValidationError::new(format!("{field_name} cannot be empty")));
    }

    if text.chars().count() > max_len {
        return Err(ValidationError::new(format!(
            "{field_name} is too long (maximum {max_len} characters)"
        )));
    }

    let lower = text.to_lowercase();
    for (fragment, description) in FORBIDDEN_FRAGMENTS {
        if lower.contains(fragment) {
            return Err(ValidationError::new(format!(
                "{field_name} contains forbidden characters ({description})"
            )));
        }
    }

    Ok(Some(text.to_string()))
}

/// Case-insensitive membership; returns the canonical spelling from `allowed`.
pub fn validate_category(input: &str, allowed: &[String]) -> VResult<String> {
    let wanted = input.trim().to_lowercase();
    allowed
        .iter()
        .find(|c| c.to_lowercase() == wanted)
        .cloned()
        .ok_or_else(|| {
            ValidationError::new(format!("Category must be one of: {}", allowed.join(", ")))
        })
}

pub fn validate_priority(input: &str) -> VResult<Priority> {
    match input.trim().to_lowercase().as_str() {
        "low" | "l" => Ok(Priority::Low),
        "medium" | "m" => Ok(Priority::Medium),
        "high" | "h" => Ok(Priority::High),
        _ => Err(ValidationError::new("Priority must be: low, medium or high")),
    }
}

pub fn validate_yes_no(input: &str) -> VResult<bool> {
    match input.trim().to_lowercase().as_str() {
        "yes" | "y" | "да" => Ok(true),
        "no" | "n" | "нет" => Ok(false),
        _ => Err(ValidationError::new("Please answer yes or no")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[test]
    fn amount_accepts_comma_and_spaces() {
        assert_eq!(
            validate_amount("1 500,505").unwrap(),
            Decimal::from_str("1500.51").unwrap()
        );
        assert_eq!(validate_amount("42").unwrap(), Decimal::from(42));
    }

    #[test]
    fn amount_rejects_non_positive_and_huge() {
        assert!(validate_amount("0").is_err());
        assert!(validate_amount("-5").is_err());
        assert!(validate_amount("1000000000.01").is_err());
        let err = validate_amount("ten").unwrap_err();
        assert!(err.message().starts_with("Invalid amount"));
    }

    #[test]
    fn date_keywords_roll_over_month_end() {
        let (d, special) = validate_date("Завтра", today()).unwrap();
        assert!(special);
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

        let (d, _) = validate_date("day after tomorrow", today()).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 2, 2).unwrap());
    }

    #[test]
    fn date_formats_and_past_rejection() {
        let (d, special) = validate_date("15.03.2025", today()).unwrap();
        assert!(!special);
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert!(validate_date("2025-02-01", today()).is_ok());
        assert!(validate_date("01/02/2025", today()).is_ok());

        let err = validate_date("2024-12-31", today()).unwrap_err();
        assert_eq!(err.message(), "Date cannot be in the past");
        assert!(validate_date("someday", today()).is_err());
    }

    #[test]
    fn time_is_optional() {
        assert_eq!(validate_time("-").unwrap(), None);
        assert_eq!(
            validate_time("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert!(validate_time("25:00").is_err());
    }

    #[test]
    fn text_limits_and_forbidden_fragments() {
        assert_eq!(
            validate_text("  обед  ", "Description", 10, false).unwrap(),
            Some("обед".to_string())
        );
        assert_eq!(validate_text("-", "Description", 10, true).unwrap(), None);
        assert!(validate_text("", "Title", 10, false).is_err());
        assert!(validate_text("абвгдеёжзий", "Title", 10, false).is_err());
        let err = validate_text("a; drop", "Title", 100, false).unwrap_err();
        assert!(err.message().contains("semicolon"));
    }

    #[test]
    fn category_is_case_insensitive_and_canonical() {
        let allowed = vec!["Еда".to_string(), "Транспорт".to_string()];
        assert_eq!(validate_category("еда", &allowed).unwrap(), "Еда");
        assert!(validate_category("Кино", &allowed).is_err());
    }

    #[test]
    fn priority_and_yes_no() {
        assert_eq!(validate_priority("HIGH").unwrap(), Priority::High);
        assert!(validate_priority("urgent").is_err());
        assert!(validate_yes_no("да").unwrap());
        assert!(!validate_yes_no("no").unwrap());
        assert!(validate_yes_no("maybe").is_err());
    }
}
