use std::{
    env, fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;

use crate::{
    dialog::DialogContext,
    errors::Error,
    pagination::{Paginator, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    search::{SearchFilter, SearchOptions, TokenMode, DEFAULT_AMOUNT_TOLERANCE_PCT},
    Result,
};

const DEFAULT_EXPENSE_CATEGORIES: &[&str] = &[
    "Еда",
    "Транспорт",
    "Развлечения",
    "Одежда",
    "Жилье",
    "Здоровье",
    "Подарки",
    "Другое",
];
const DEFAULT_INCOME_CATEGORIES: &[&str] = &[
    "Зарплата",
    "Подработка",
    "Инвестиции",
    "Подарок",
    "Возврат долга",
    "Прочее",
];
const DEFAULT_PLAN_CATEGORIES: &[&str] = &["личные", "работа", "семья", "отдых", "здоровье", "другое"];

/// Typed configuration, read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub telegram_allowed_users: Vec<i64>,
    pub data_file: PathBuf,

    // Listing / search
    pub page_size: usize,
    pub search: SearchOptions,

    // Data entry
    pub expense_categories: Vec<String>,
    pub income_categories: Vec<String>,
    pub plan_categories: Vec<String>,
    pub max_text_length: usize,

    // Behavior flags
    pub debug: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("BOT_TOKEN"))
            .unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let mut telegram_allowed_users = parse_csv_i64(get("TELEGRAM_ALLOWED_USERS"));
        if telegram_allowed_users.is_empty() {
            // Two-person household setup.
            telegram_allowed_users = ["MY_USER_ID", "PARTNER_USER_ID"]
                .into_iter()
                .filter_map(|k| get(k).and_then(|v| v.trim().parse::<i64>().ok()))
                .collect();
        }
        if telegram_allowed_users.is_empty() {
            return Err(Error::Config(
                "TELEGRAM_ALLOWED_USERS (or MY_USER_ID) environment variable is required"
                    .to_string(),
            ));
        }

        let data_file = PathBuf::from(
            get("DATA_FILE").unwrap_or_else(|| "finance_planner.json".to_string()),
        );

        let page_size = get("PAGE_SIZE")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let token_mode = match get("SEARCH_TOKEN_MODE") {
            Some(raw) => TokenMode::parse(&raw).ok_or_else(|| {
                Error::Config(format!("SEARCH_TOKEN_MODE must be `any` or `all`, got `{raw}`"))
            })?,
            None => TokenMode::default(),
        };
        let amount_tolerance_pct = get("SEARCH_AMOUNT_TOLERANCE_PCT")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_AMOUNT_TOLERANCE_PCT);

        let expense_categories =
            parse_csv(get("EXPENSE_CATEGORIES")).unwrap_or_else(|| owned(DEFAULT_EXPENSE_CATEGORIES));
        let income_categories =
            parse_csv(get("INCOME_CATEGORIES")).unwrap_or_else(|| owned(DEFAULT_INCOME_CATEGORIES));
        let plan_categories =
            parse_csv(get("PLAN_CATEGORIES")).unwrap_or_else(|| owned(DEFAULT_PLAN_CATEGORIES));

        let max_text_length = get("MAX_TEXT_LENGTH")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(500);

        let debug = get("DEBUG").map(|s| parse_bool(&s)).unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            data_file,
            page_size,
            search: SearchOptions {
                token_mode,
                amount_tolerance_pct,
            },
            expense_categories,
            income_categories,
            plan_categories,
            max_text_length,
            debug,
        })
    }

    pub fn paginator(&self) -> Paginator {
        Paginator::new(self.page_size).unwrap_or_default()
    }

    pub fn search_filter(&self) -> SearchFilter {
        SearchFilter::new(self.search)
    }

    pub fn dialog_context(&self, today: NaiveDate) -> DialogContext<'_> {
        DialogContext {
            today,
            expense_categories: &self.expense_categories,
            income_categories: &self.income_categories,
            plan_categories: &self.plan_categories,
            max_text_len: self.max_text_length,
        }
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn parse_csv(v: Option<String>) -> Option<Vec<String>> {
    let out = v?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_ALLOWED_USERS", "1, 2,x"),
        ])
        .unwrap();
        assert_eq!(cfg.telegram_allowed_users, vec![1, 2]);
        assert_eq!(cfg.page_size, 5);
        assert_eq!(cfg.data_file, PathBuf::from("finance_planner.json"));
        assert_eq!(cfg.search, SearchOptions::default());
        assert_eq!(cfg.expense_categories.len(), 8);
        assert_eq!(cfg.max_text_length, 500);
        assert!(!cfg.debug);
    }

    #[test]
    fn missing_token_or_users_is_an_error() {
        assert!(matches!(
            config(&[("TELEGRAM_ALLOWED_USERS", "1")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config(&[("TELEGRAM_BOT_TOKEN", "t")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn household_user_ids_fallback() {
        let cfg = config(&[
            ("BOT_TOKEN", "t"),
            ("MY_USER_ID", "10"),
            ("PARTNER_USER_ID", "20"),
        ])
        .unwrap();
        assert_eq!(cfg.telegram_bot_token, "t");
        assert_eq!(cfg.telegram_allowed_users, vec![10, 20]);
    }

    #[test]
    fn page_size_is_clamped() {
        let base = [("TELEGRAM_BOT_TOKEN", "t"), ("TELEGRAM_ALLOWED_USERS", "1")];
        let big = config(&[base[0], base[1], ("PAGE_SIZE", "50")]).unwrap();
        assert_eq!(big.page_size, MAX_PAGE_SIZE);
        let zero = config(&[base[0], base[1], ("PAGE_SIZE", "0")]).unwrap();
        assert_eq!(zero.page_size, 1);
        assert_eq!(zero.paginator().page_size(), 1);
    }

    #[test]
    fn search_options_and_categories() {
        let cfg = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_ALLOWED_USERS", "1"),
            ("SEARCH_TOKEN_MODE", "ALL"),
            ("SEARCH_AMOUNT_TOLERANCE_PCT", "25"),
            ("EXPENSE_CATEGORIES", "Food, Taxi ,"),
            ("DEBUG", "yes"),
        ])
        .unwrap();
        assert_eq!(cfg.search.token_mode, TokenMode::All);
        assert_eq!(cfg.search.amount_tolerance_pct, 25);
        assert_eq!(cfg.expense_categories, vec!["Food", "Taxi"]);
        assert!(cfg.debug);

        let bad = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_ALLOWED_USERS", "1"),
            ("SEARCH_TOKEN_MODE", "some"),
        ]);
        assert!(matches!(bad, Err(Error::Config(_))));
    }

    #[test]
    fn quotes_are_stripped_from_dotenv_values() {
        assert_eq!(strip_quotes("\"abc\""), "abc");
        assert_eq!(strip_quotes("'abc'"), "abc");
        assert_eq!(strip_quotes("abc"), "abc");
    }
}
