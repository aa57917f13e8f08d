//! Value normalization shared by all parsers.
//!
//! Every function here is pure. Failures are reported as `None`, which the
//! publishing layer treats exactly like a missing key.

use chrono::{Months, NaiveDate};
use regex::Captures;

use super::patterns::{
    month_to_number, DATE_DAY_MONTH_NAME, DATE_ISO, DATE_MONTH_NAME_DAY, DATE_MONTH_YEAR,
    DATE_NUMERIC_DMY, WHITESPACE_RUN,
};

/// Trim, collapse whitespace (newlines included) to single spaces and strip
/// matching `"` / `'` quote layers.
pub fn clean_scalar(raw: &str) -> String {
    let mut value = WHITESPACE_RUN.replace_all(raw.trim(), " ").into_owned();
    while let Some(inner) = strip_quote_layer(&value) {
        value = inner.trim().to_string();
    }
    value
}

fn strip_quote_layer(value: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        (value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote))
            .then(|| &value[1..value.len() - 1])
    })
}

/// Whether a value stands for "not found": empty, `null`, or `null` followed
/// by stray tokens.
pub fn is_null_marker(value: &str) -> bool {
    let value = clean_scalar(value).to_lowercase();
    value.is_empty() || value == "null" || value.starts_with("null ")
}

/// Normalize a money string to a plain decimal, e.g. `"£12 345"` to `"12345.00"`.
///
/// Everything but digits and dots is discarded and leading zeros are
/// stripped. Amounts without a dot get `.00`. The string is never read as a
/// number, so any length survives.
pub fn normalize_money(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let amount = cleaned.trim_start_matches('0');

    if !amount.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    if amount.contains('.') {
        Some(amount.to_string())
    } else {
        Some(format!("{}.00", amount))
    }
}

/// Best-effort parse of a free-form date expression.
///
/// Understands ISO dates, day-first numeric dates, English month names in
/// either order, ordinals, and month-year forms (resolved to the month's last
/// day). Relative expressions are not parsed.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    first_date(&DATE_ISO, text, |caps| {
        NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
    })
    .or_else(|| {
        first_date(&DATE_DAY_MONTH_NAME, text, |caps| {
            let month = month_to_number(&caps[2])?;
            NaiveDate::from_ymd_opt(parse_year(&caps[3])?, month, caps[1].parse().ok()?)
        })
    })
    .or_else(|| {
        first_date(&DATE_MONTH_NAME_DAY, text, |caps| {
            let month = month_to_number(&caps[1])?;
            NaiveDate::from_ymd_opt(parse_year(&caps[3])?, month, caps[2].parse().ok()?)
        })
    })
    .or_else(|| first_date(&DATE_NUMERIC_DMY, text, numeric_date))
    .or_else(|| {
        first_date(&DATE_MONTH_YEAR, text, |caps| {
            let month = month_to_number(&caps[1])?;
            last_day_of_month(caps[2].parse().ok()?, month)
        })
    })
}

/// Normalize a date expression to `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|date| date.format("%Y-%m-%d").to_string())
}

fn first_date<F>(pattern: &regex::Regex, text: &str, build: F) -> Option<NaiveDate>
where
    F: Fn(&Captures<'_>) -> Option<NaiveDate>,
{
    pattern.captures_iter(text).find_map(|caps| build(&caps))
}

// Day-first unless the first number cannot be a month day pairing.
fn numeric_date(caps: &Captures<'_>) -> Option<NaiveDate> {
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = parse_year(&caps[3])?;

    NaiveDate::from_ymd_opt(year, second, first).or_else(|| NaiveDate::from_ymd_opt(year, first, second))
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    if s.len() <= 2 {
        // Two-digit year: 00-50 is the 2000s, 51-99 the 1900s
        Some(if year <= 50 { 2000 + year } else { 1900 + year })
    } else {
        Some(year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_scalar() {
        assert_eq!(clean_scalar("  \n\n  10348000.00\n"), "10348000.00");
        assert_eq!(clean_scalar("47   SECOND\nAVENUE "), "47 SECOND AVENUE");
        assert_eq!(clean_scalar(" \"null\"  "), "null");
        assert_eq!(clean_scalar("'Havens Christian Hospice'"), "Havens Christian Hospice");
        assert_eq!(clean_scalar("\"mismatched'"), "\"mismatched'");
        assert_eq!(clean_scalar("\""), "\"");
    }

    #[test]
    fn test_clean_scalar_idempotent() {
        let samples = [
            "",
            "   ",
            "\" 'a' \"",
            "\" \"x\" \"",
            "a\r\n\tb",
            "''",
            "'\"nested\"'  tail",
            "  Havens \n Christian  Hospice ",
        ];
        for sample in samples {
            let once = clean_scalar(sample);
            assert_eq!(clean_scalar(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_null_markers() {
        assert!(is_null_marker("null"));
        assert!(is_null_marker("  NULL \n"));
        assert!(is_null_marker("\"null\""));
        assert!(is_null_marker(""));
        assert!(is_null_marker("   \n "));
        assert!(is_null_marker("null FOO BAR"));
        assert!(!is_null_marker("nullify"));
        assert!(!is_null_marker("SS0 8HX"));
        // Prefix policy: a leading "null " always wins.
        assert!(is_null_marker("Null Island Trust"));
    }

    #[test]
    fn test_normalize_money() {
        assert_eq!(normalize_money("£12 345").as_deref(), Some("12345.00"));
        assert_eq!(normalize_money("£1,034,800.23").as_deref(), Some("1034800.23"));
        assert_eq!(normalize_money("  10348000.00").as_deref(), Some("10348000.00"));
        assert_eq!(normalize_money("£19.4m").as_deref(), Some("19.4"));
        assert_eq!(normalize_money("007").as_deref(), Some("7.00"));
        assert_eq!(normalize_money("12.").as_deref(), Some("12."));
        assert_eq!(normalize_money(".5").as_deref(), Some(".5"));
        assert_eq!(normalize_money("0.5").as_deref(), Some(".5"));
        assert_eq!(normalize_money("0.00").as_deref(), Some(".00"));
    }

    #[test]
    fn test_normalize_money_long_amounts() {
        let thirty = "123456789012345678901234567890";
        assert_eq!(normalize_money(thirty), Some(format!("{}.00", thirty)));
        assert_eq!(
            normalize_money("£99,999,999,999,999,999,999,999,999,999").as_deref(),
            Some("99999999999999999999999999999.00")
        );
        assert_eq!(
            normalize_money("1234567890123456789012345678").as_deref(),
            Some("1234567890123456789012345678.00")
        );
    }

    #[test]
    fn test_normalize_money_absent() {
        assert_eq!(normalize_money("null"), None);
        assert_eq!(normalize_money(""), None);
        assert_eq!(normalize_money("..."), None);
        assert_eq!(normalize_money("not disclosed"), None);
        assert_eq!(normalize_money("000"), None);
        assert_eq!(normalize_money("£ 0"), None);
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("31 December 2015").as_deref(), Some("2015-12-31"));
        assert_eq!(normalize_date("2016-03-31").as_deref(), Some("2016-03-31"));
        assert_eq!(normalize_date("31st of March 2016").as_deref(), Some("2016-03-31"));
        assert_eq!(normalize_date("31-Mar-16").as_deref(), Some("2016-03-31"));
        assert_eq!(normalize_date("March 31, 2016").as_deref(), Some("2016-03-31"));
        assert_eq!(normalize_date("31/03/2016").as_deref(), Some("2016-03-31"));
        assert_eq!(normalize_date("03/31/2016").as_deref(), Some("2016-03-31"));
        assert_eq!(normalize_date("05.04.16").as_deref(), Some("2016-04-05"));
        assert_eq!(normalize_date("year ended 30 September 2014").as_deref(), Some("2014-09-30"));
    }

    #[test]
    fn test_normalize_date_partial() {
        assert_eq!(normalize_date("March 2016").as_deref(), Some("2016-03-31"));
        assert_eq!(normalize_date("February 2016").as_deref(), Some("2016-02-29"));
        assert_eq!(normalize_date("December 2015").as_deref(), Some("2015-12-31"));
    }

    #[test]
    fn test_normalize_date_failures() {
        assert_eq!(normalize_date("null"), None);
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("yesterday"), None);
        assert_eq!(normalize_date("31 Smarch 2016"), None);
        assert_eq!(normalize_date("2016-13-45"), None);
    }
}
