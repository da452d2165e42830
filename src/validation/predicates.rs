//! Stand-alone value checks shared by validation rules and the admin panel

use regex::Regex;
use std::sync::LazyLock;

/// Thousands separated by dots, optional comma decimals: `25.000`, `1.250,50`
pub const PRICE_PATTERN: &str = r"^\d{1,3}(?:\.\d{3})*(?:,\d{1,2})?$";
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
pub const PHONE_PATTERN: &str = r"^[\+]?[0-9\s\-\(\)]{8,}$";

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PRICE_PATTERN).expect("PRICE_PATTERN must compile"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN must compile"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("PHONE_PATTERN must compile"));

pub fn is_valid_price(value: &str) -> bool {
    !value.is_empty() && PRICE_RE.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && EMAIL_RE.is_match(value)
}

pub fn is_valid_phone(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && PHONE_RE.is_match(value)
}

/// Escape text for safe insertion as markup
pub fn sanitize_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}
