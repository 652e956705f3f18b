use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use callscore_record::{ExtractedEntities, TranscriptSegment};

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)(st|nd|rd|th)\b").unwrap());

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:₹|rs\.?|rupees)?\s*([0-9][0-9.,]{1,10}|[0-9]{3,10})").unwrap());

static NUMERIC_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-3]?\d)[/\-]([0-1]?\d)[/\-](\d{2,4})\b").unwrap());

static NEARBY_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-3]?\d\s*[/\-]\s*[0-1]?\d\s*[/\-]\s*\d{2,4}\b").unwrap()
});

static NEARBY_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)").unwrap());

static DAY_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b([0-3]?\d)(?:st|nd|rd|th)?\s+(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec)\b",
    )
    .unwrap()
});

static RELATIVE_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(next|this)\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday|week|month)\b")
        .unwrap()
});

static DAY_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(tomorrow|today|yesterday)\b").unwrap());

static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b").unwrap()
});

static BARE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2,4}$").unwrap());

const PAYMENT_MODES: &[(&str, &str)] = &[
    ("upi", "UPI"),
    ("bank transfer", "Bank Transfer"),
    ("bank", "Bank Transfer"),
    ("cheque", "Cheque"),
    ("cash", "Cash"),
    ("neft", "NEFT"),
    ("rtgs", "RTGS"),
    ("net banking", "Net Banking"),
    ("wallet", "Wallet"),
    ("card", "Card"),
];

/// Pulls monetary amounts, date mentions, and payment modes out of the
/// joined transcript text. Everything is regex/lexicon driven and
/// deterministic; surface strings are kept, not parsed into values.
pub fn extract_entities(segments: &[TranscriptSegment]) -> ExtractedEntities {
    let text = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    ExtractedEntities {
        amounts: extract_amounts(&text),
        dates: extract_dates(&text),
        payment_modes: extract_payment_modes(&text),
    }
}

/// Candidate numbers with currency-ish context, filtered against years,
/// day-of-month values, and numbers sitting inside date expressions.
pub(crate) fn extract_amounts(text: &str) -> Vec<String> {
    let normalized = text.replace(',', "").replace('\u{200e}', " ");
    let normalized = ORDINAL_RE.replace_all(&normalized, "$1");

    let mut amounts: Vec<String> = Vec::new();
    for caps in AMOUNT_RE.captures_iter(&normalized) {
        let Some(matched) = caps.get(1) else { continue };
        let digits: String = matched
            .as_str()
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        let Ok(value) = digits.parse::<u64>() else {
            continue;
        };

        if (1900..=2099).contains(&value) {
            continue;
        }

        let start = floor_char_boundary(&normalized, matched.start().saturating_sub(10));
        let end = floor_char_boundary(&normalized, (matched.end() + 10).min(normalized.len()));
        let nearby = &normalized[start..end];
        if NEARBY_DATE_RE.is_match(nearby) || NEARBY_MONTH_RE.is_match(nearby) {
            continue;
        }

        // Values this small are day-of-month numbers or counts, not money.
        if value < 100 {
            continue;
        }

        let rendered = value.to_string();
        if !amounts.contains(&rendered) {
            amounts.push(rendered);
        }
    }
    amounts
}

pub(crate) fn extract_dates(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for matched in NUMERIC_DATE_RE.find_iter(text) {
        found.push(matched.as_str().to_string());
    }
    for caps in DAY_MONTH_RE.captures_iter(text) {
        found.push(format!("{} {}", &caps[1], &caps[2]));
    }
    for matched in RELATIVE_DAY_RE.find_iter(text) {
        found.push(matched.as_str().to_string());
    }
    for matched in DAY_WORD_RE.find_iter(text) {
        found.push(matched.as_str().to_string());
    }
    for caps in WEEKDAY_RE.captures_iter(text) {
        found.push(caps[1].to_string());
    }

    // Dedupe case-insensitively, preserving first-mention order.
    let mut seen: HashSet<String> = HashSet::new();
    let mut dates: Vec<String> = Vec::new();
    for date in found {
        let normalized = date.split_whitespace().collect::<Vec<_>>().join(" ");
        if seen.insert(normalized.to_lowercase()) {
            dates.push(normalized);
        }
    }

    // Prefer concrete mentions (digits or month names) over weekday words,
    // and drop anything that is just a bare number.
    let concrete: Vec<String> = dates
        .iter()
        .filter(|d| d.chars().any(|c| c.is_ascii_digit()) || NEARBY_MONTH_RE.is_match(d))
        .cloned()
        .collect();
    let mut dates = if concrete.is_empty() { dates } else { concrete };
    dates.retain(|d| !BARE_NUMBER_RE.is_match(d));
    dates
}

pub(crate) fn extract_payment_modes(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut modes: Vec<String> = Vec::new();
    for (keyword, canonical) in PAYMENT_MODES {
        if lower.contains(keyword) && !modes.iter().any(|m| m == canonical) {
            modes.push((*canonical).to_string());
        }
    }
    modes.sort();
    modes
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index > s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
