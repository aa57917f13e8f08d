//! Common regex patterns for value normalization and entity lookup.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    // Date patterns
    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_NUMERIC_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    // "31 December 2015", "31st of Dec. 2015", "31-Dec-15"
    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?(?:\s+of)?[\s./\-]+([a-z]{3,9})\.?,?[\s./\-]+(\d{4}|\d{2})\b"
    ).unwrap();

    // "December 31, 2015", "Dec 31st 2015"
    pub static ref DATE_MONTH_NAME_DAY: Regex = Regex::new(
        r"(?i)\b([a-z]{3,9})\.?[\s./\-]+(\d{1,2})(?:st|nd|rd|th)?,?[\s./\-]+(\d{4})\b"
    ).unwrap();

    // "March 2016"
    pub static ref DATE_MONTH_YEAR: Regex = Regex::new(
        r"(?i)\b([a-z]{3,9})\.?,?\s+(\d{4})\b"
    ).unwrap();

    // Amounts with a currency marker: "£1,034,800", "GBP 19.4m", "RM 12.50"
    pub static ref MONEY_WITH_CURRENCY: Regex = Regex::new(
        r"(?i)(?:£|€|\$|\bGBP|\bRM)\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:m|k|million|thousand)\b)?"
    ).unwrap();
}

/// Map an English month name or abbreviation to its number.
pub fn month_to_number(month: &str) -> Option<u32> {
    let number = match month.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(number)
}
