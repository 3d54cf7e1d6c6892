// Parsing and formatting helpers.
//
// Cell coercion lives here so the loader only has to decide what to do when
// a value does not parse. Unlike a forgiving cleaner, these return `None` for
// anything that is not exactly the expected shape; the caller turns that into
// a fatal error.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a monetary cell. Thousands separators are not accepted, the file
/// format is plain decimals.
pub fn parse_f64(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    // `parse` accepts "NaN" and "inf"; neither is a valid amount.
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

pub fn parse_i64(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    // Dates are expected in `YYYY-MM-DD` format.
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Accepts the literals `true`/`false` in any letter case.
pub fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Round half away from zero to cents.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part * 100.0 / whole
    } else {
        0.0
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g., `5,600 transactions`).
    n.to_formatted_string(&Locale::en)
}

/// KPI card spend: `$12.3M`, `$45.6K`, `$789`.
pub fn format_spend(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.1}K", value / 1_000.0)
    } else {
        format!("${}", format_number(value, 0))
    }
}

/// Chart labels round thousands to whole numbers: `$12.3M`, `$46K`, `$789`.
pub fn format_dollars(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.0}K", value / 1_000.0)
    } else {
        format!("${}", format_number(value, 0))
    }
}

pub fn display_money(v: &f64) -> String {
    format!("${}", format_number(*v, 0))
}

pub fn display_pct(v: &f64) -> String {
    format!("{:.1}%", v)
}
