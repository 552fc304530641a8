//! Display titles for enhanced tables.
//!
//! Column headers are matched against common financial and business
//! vocabularies. A meaningful file name wins only when it shares a word with
//! the data-derived title.

use regex::Regex;
use std::sync::LazyLock;

static SPREADSHEET_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(xlsx?|xlsm|csv|tsv)$").expect("valid regex literal"));

static NUMBERED_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^column_?\d+$").expect("valid regex literal"));

static GENERIC_STEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(sheet|book|data|table)\d*$").expect("valid regex literal"));

const GENERIC_WORDS: &[&str] = &[
    "untitled", "sheet", "book", "data", "table", "export", "download",
];

const TIME_WORDS: &[&str] = &["year", "quarter", "month"];

/// (keywords, title) pairs checked when headers mention a time period
const FINANCIAL_PATTERNS: &[(&[&str], &str)] = &[
    (&["sales", "revenue"], "Sales Report"),
    (&["asset", "balance"], "Balance Sheet Data"),
    (&["income", "profit"], "Income Statement"),
    (&["expense", "cost"], "Expense Report"),
];

const BUSINESS_PATTERNS: &[(&[&str], &str)] = &[
    (&["employee", "staff", "name"], "Employee Directory"),
    (&["customer", "client"], "Customer Database"),
    (&["product", "item", "inventory"], "Product Catalog"),
    (&["transaction", "payment"], "Transaction Log"),
    (&["order", "purchase"], "Order History"),
    (&["task", "project"], "Project Tracking"),
];

fn mentions(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|w| haystack.contains(w))
}

fn data_based_title(columns: &[String]) -> Option<String> {
    let headers = columns.join(" ").to_lowercase();

    if mentions(&headers, TIME_WORDS) {
        let title = FINANCIAL_PATTERNS
            .iter()
            .find(|(words, _)| mentions(&headers, words))
            .map(|(_, title)| *title)
            .unwrap_or("Financial Report");
        return Some(title.to_string());
    }

    if let Some((_, title)) = BUSINESS_PATTERNS.iter().find(|(words, _)| mentions(&headers, words)) {
        return Some(title.to_string());
    }

    columns
        .iter()
        .find(|h| h.chars().count() > 2 && !NUMBERED_COLUMN.is_match(h))
        .map(|h| format!("{h} Data"))
}

/// Title for a table with the given headers loaded from `file_name`.
pub fn generate_title_from_data(columns: &[String], file_name: &str) -> String {
    if columns.is_empty() {
        return "Empty Dataset".to_string();
    }

    let stem = SPREADSHEET_EXT.replace(file_name, "").to_string();
    let lower = stem.to_lowercase();
    let generic = lower.chars().count() < 3
        || GENERIC_STEM.is_match(&lower)
        || mentions(&lower, GENERIC_WORDS);
    let readable_stem = stem.replace(['_', '-'], " ");

    match data_based_title(columns) {
        Some(title) if generic => title,
        Some(title) => {
            let title_words: Vec<String> = title.to_lowercase().split_whitespace().map(str::to_string).collect();
            let related = lower
                .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
                .filter(|w| w.chars().count() > 2)
                .any(|w| title_words.iter().any(|t| t.contains(w) || w.contains(t.as_str())));
            if related { readable_stem } else { title }
        }
        None if !generic => readable_stem,
        None => format!("Data Table ({} columns)", columns.len()),
    }
}
