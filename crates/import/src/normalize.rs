use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

/// Longest description kept after normalization.
const MAX_DESCRIPTION_LEN: usize = 100;

fn iso_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})").unwrap())
}

fn day_first_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{2,4})$").unwrap())
}

fn year_first_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})[/.\-](\d{1,2})[/.\-](\d{1,2})$").unwrap())
}

/// Normalize a raw statement date cell to a calendar date.
///
/// Attempt order: ISO prefix, slashed day/month forms with the ambiguity
/// heuristic (a first group over 12 must be the day), year-first slashed
/// form, then a generic format sweep. Two-digit years are read as `20xx`.
/// Unparseable cells fall back to `today`: the row is kept rather than
/// rejected, so callers pass the clock in.
pub fn normalize_date(raw: &str, today: NaiveDate) -> NaiveDate {
    let raw = raw.trim();
    parse_iso_prefix(raw)
        .or_else(|| parse_slashed(raw))
        .or_else(|| parse_year_first(raw))
        .or_else(|| parse_generic(raw))
        .unwrap_or(today)
}

fn parse_iso_prefix(raw: &str) -> Option<NaiveDate> {
    let caps = iso_prefix_re().captures(raw)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

fn parse_slashed(raw: &str) -> Option<NaiveDate> {
    let caps = day_first_re().captures(raw)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    // First group over 12 cannot be a month, so the cell is day-first.
    let (month, day) = if first > 12 { (second, first) } else { (first, second) };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_year_first(raw: &str) -> Option<NaiveDate> {
    let caps = year_first_re().captures(raw)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

fn parse_generic(raw: &str) -> Option<NaiveDate> {
    for fmt in &[
        "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y", "%Y-%m-%d",
        "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y",
    ] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    None
}

/// Normalize a raw amount cell to a positive decimal.
///
/// Keeps digits and `.`/`,`/`-`, drops thousands separators (a comma
/// followed by exactly three digits), reads a remaining comma as the decimal
/// point, and takes the absolute value (statements report expenses signed).
/// `None` when nothing parseable remains or the result is not positive;
/// such rows are dropped from the batch and surfaced only as a count delta.
pub fn normalize_amount(raw: &str) -> Option<Decimal> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    let dotted = strip_thousands(&kept).replace(',', ".");
    let amount = Decimal::from_str(&dotted).ok()?.abs();
    (amount > Decimal::ZERO).then_some(amount)
}

fn strip_thousands(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == ',' {
            let following = chars[i + 1..].iter().take_while(|d| d.is_ascii_digit()).count();
            if following == 3 {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Strip stray double quotes, trim, and clip to 100 characters. `None` when
/// nothing is left — the row is dropped.
pub fn normalize_description(raw: &str) -> Option<String> {
    let unquoted: String = raw.chars().filter(|c| *c != '"').collect();
    let trimmed = unquoted.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_DESCRIPTION_LEN).collect())
}
