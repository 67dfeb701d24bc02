//! Field normalizer.
//!
//! Pure, total functions: one per scalar domain. None of them panics or
//! returns an error; the worst case is the (trimmed) input or `None`.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use url::Url;

use crate::utils::MAX_TEXT_CHARS;
use crate::utils::string_utils::truncate_with_ellipsis;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("BUG: hardcoded whitespace regex is invalid"));

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("BUG: hardcoded non-word regex is invalid"));

static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:read more|leer más|leer mas|more info(?:rmation)?|más información|ver más|continue reading|seguir leyendo)\s*(?:»|›|→|\.\.\.|…)?\s*$",
    )
    .expect("BUG: hardcoded boilerplate regex is invalid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("BUG: hardcoded email regex is invalid")
});

static EMAIL_OBFUSCATED_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[\[(]\s*at\s*[\])]\s*").expect("BUG: hardcoded at regex is invalid")
});

static EMAIL_OBFUSCATED_DOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[\[(]\s*dot\s*[\])]\s*").expect("BUG: hardcoded dot regex is invalid")
});

static PHONE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\d[\d\s().\-/]{4,}\d").expect("BUG: hardcoded phone regex is invalid")
});

static ORDINAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d)(?:st|nd|rd|th)\b").expect("BUG: hardcoded ordinal regex is invalid")
});

static NUMERIC_YMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})$").expect("BUG: hardcoded ymd regex is invalid")
});

static NUMERIC_DMY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})$")
        .expect("BUG: hardcoded dmy regex is invalid")
});

static TEXT_DMY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}) (?:of )?(\p{L}+)\.? (\d{4})$").expect("BUG: hardcoded text dmy regex is invalid")
});

static TEXT_MDY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\p{L}+)\.? (\d{1,2}) (\d{4})$").expect("BUG: hardcoded text mdy regex is invalid")
});

/// Date-shaped substrings, tried in order by [`extract_date_from_text`].
static DATE_IN_TEXT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d{4}[/.\-]\d{1,2}[/.\-]\d{1,2}\b",
        r"\b\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}\b",
        r"\b\d{1,2}(?:st|nd|rd|th)?\s+(?:of\s+|de\s+)?\p{L}{3,}\.?(?:,|\s+de)?\s+\d{4}\b",
        r"\b\p{L}{3,}\.?\s+\d{1,2}(?:st|nd|rd|th)?\s*,?\s*\d{4}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("BUG: hardcoded date-in-text regex is invalid"))
    .collect()
});

const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("jan", 1),
    ("enero", 1),
    ("ene", 1),
    ("february", 2),
    ("feb", 2),
    ("febrero", 2),
    ("march", 3),
    ("mar", 3),
    ("marzo", 3),
    ("april", 4),
    ("apr", 4),
    ("abril", 4),
    ("abr", 4),
    ("may", 5),
    ("mayo", 5),
    ("june", 6),
    ("jun", 6),
    ("junio", 6),
    ("july", 7),
    ("jul", 7),
    ("julio", 7),
    ("august", 8),
    ("aug", 8),
    ("agosto", 8),
    ("ago", 8),
    ("september", 9),
    ("sep", 9),
    ("sept", 9),
    ("septiembre", 9),
    ("setiembre", 9),
    ("october", 10),
    ("oct", 10),
    ("octubre", 10),
    ("november", 11),
    ("nov", 11),
    ("noviembre", 11),
    ("december", 12),
    ("dec", 12),
    ("diciembre", 12),
    ("dic", 12),
];

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .find(|(candidate, _)| *candidate == lower)
        .map(|(_, n)| *n)
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(match raw.len() {
        2 if year < 70 => 2000 + year,
        2 => 1900 + year,
        _ => year,
    })
}

/// Collapse runs of whitespace to one space and trim.
#[must_use]
pub fn collapse_whitespace(raw: &str) -> String {
    WHITESPACE.replace_all(raw, " ").trim().to_string()
}

/// Parse a date written in one of the locale formats seen on the site.
///
/// Accepted: `YYYY-MM-DD` (also `/` and `.`), `DD/MM/YYYY` (also `-`, `.`,
/// two-digit years), `1 March 2024`, `1st of March, 2024`,
/// `1 de marzo de 2024`, `March 1, 2024`, and RFC 3339 timestamps.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.date_naive());
    }
    // `2024-03-01T10:00` and `2024-03-01 10:00` without an offset
    if trimmed.len() > 10
        && trimmed.is_char_boundary(10)
        && matches!(trimmed.as_bytes()[10], b'T' | b' ')
        && let Some(date) = parse_date(&trimmed[..10])
    {
        return Some(date);
    }

    let cleaned = ORDINAL_SUFFIX.replace_all(trimmed, "$1");
    let cleaned = cleaned.replace(',', " ").replace(" de ", " ");
    let cleaned = collapse_whitespace(&cleaned);

    if let Some(c) = NUMERIC_YMD.captures(&cleaned) {
        return NaiveDate::from_ymd_opt(c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?);
    }
    if let Some(c) = NUMERIC_DMY.captures(&cleaned) {
        let first: u32 = c[1].parse().ok()?;
        let second: u32 = c[2].parse().ok()?;
        let year = expand_year(&c[3])?;
        // Day-first unless that is impossible (US-style 03/15/2024).
        return NaiveDate::from_ymd_opt(year, second, first)
            .or_else(|| NaiveDate::from_ymd_opt(year, first, second));
    }
    if let Some(c) = TEXT_DMY.captures(&cleaned) {
        let month = month_number(&c[2])?;
        return NaiveDate::from_ymd_opt(c[3].parse().ok()?, month, c[1].parse().ok()?);
    }
    if let Some(c) = TEXT_MDY.captures(&cleaned) {
        let month = month_number(&c[1])?;
        return NaiveDate::from_ymd_opt(c[3].parse().ok()?, month, c[2].parse().ok()?);
    }
    None
}

/// ISO-8601 date when parseable, otherwise the original text unchanged
/// (whitespace collapsed). `None` only for empty input.
///
/// ```
/// # use institute_scrape::normalizer::normalize_date;
/// assert_eq!(normalize_date("2024/03/01").as_deref(), Some("2024-03-01"));
/// assert_eq!(normalize_date("Spring term").as_deref(), Some("Spring term"));
/// assert_eq!(normalize_date("   "), None);
/// ```
#[must_use]
pub fn normalize_date(raw: &str) -> Option<String> {
    let text = collapse_whitespace(raw);
    if text.is_empty() {
        return None;
    }
    match parse_date(&text) {
        Some(date) => Some(date.format("%Y-%m-%d").to_string()),
        None => Some(text),
    }
}

/// First date-shaped substring of a longer text.
#[must_use]
pub fn extract_date_from_text(text: &str) -> Option<String> {
    DATE_IN_TEXT
        .iter()
        .filter_map(|re| re.find(text))
        .find(|m| parse_date(m.as_str()).is_some())
        .map(|m| m.as_str().to_string())
}

/// Validated, lowercased email address; `None` when invalid.
///
/// Strips `mailto:` and query strings and undoes `[at]` / `(dot)`
/// obfuscation.
#[must_use]
pub fn normalize_email(raw: &str) -> Option<String> {
    let mut s = raw.trim();
    if s.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("mailto:")) {
        s = &s[7..];
    }
    let s = s.split('?').next().unwrap_or_default();
    let s = EMAIL_OBFUSCATED_AT.replace_all(s, "@");
    let s = EMAIL_OBFUSCATED_DOT.replace_all(&s, ".");
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.trim_end_matches('.').to_lowercase();
    EMAIL.is_match(&compact).then_some(compact)
}

/// Phone number reduced to digits with an optional leading `+`.
///
/// Returns `None` when no run of at least six digits is present.
///
/// ```
/// # use institute_scrape::normalizer::normalize_phone;
/// assert_eq!(normalize_phone("Tel.: +34 (954) 46-66-66").as_deref(), Some("+34954466666"));
/// assert_eq!(normalize_phone("n/a"), None);
/// ```
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<String> {
    let run = PHONE_RUN.find(raw)?.as_str();
    let digits: String = run.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 6 {
        return None;
    }
    if run.starts_with('+') {
        Some(format!("+{digits}"))
    } else {
        Some(digits)
    }
}

/// Absolute URL resolved against `base`; query and fragment preserved.
///
/// `None` for empty input and non-navigational links (`#`, `javascript:`,
/// `mailto:`). Input that cannot be resolved is returned trimmed.
#[must_use]
pub fn normalize_url(raw: &str, base: &Url) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "#" {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("mailto:") {
        return None;
    }
    match base.join(trimmed) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Some(trimmed.to_string()),
    }
}

/// Whitespace-collapsed text without a trailing "Read more"-style link
/// text, capped at [`MAX_TEXT_CHARS`] characters.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let mut text = collapse_whitespace(raw);
    // "Read more » Leer más" loses both.
    while BOILERPLATE.is_match(&text) {
        text = collapse_whitespace(&BOILERPLATE.replace(&text, ""));
    }
    truncate_with_ellipsis(&text, MAX_TEXT_CHARS)
}

/// [`normalize_text`] mapped into an optional field.
#[must_use]
pub fn normalize_optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(normalize_text).filter(|s| !s.is_empty())
}

/// Deterministic identifier derived from a title.
///
/// ```
/// # use institute_scrape::normalizer::slugify;
/// assert_eq!(slugify("Research Groups & Labs"), "research_groups_labs");
/// ```
#[must_use]
pub fn slugify(title: &str) -> String {
    NON_WORD
        .replace_all(&title.trim().to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}

/// Comparison form of an identity field: lowercase, punctuation folded to
/// single spaces.
#[must_use]
pub fn identity_text(raw: &str) -> String {
    NON_WORD
        .replace_all(&raw.to_lowercase(), " ")
        .trim()
        .to_string()
}
