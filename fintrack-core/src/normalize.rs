//! Locale-aware numeric and date normalization shared by every parser.
//!
//! Amounts follow the pt-BR convention: `.` groups thousands, `,` marks the
//! decimal place. Dates accept the formats Brazilian bank exports actually
//! use (DD/MM/YYYY, ISO, 8-digit runs, DD/MM/YY).

use chrono::NaiveDate;
use regex::Regex;

/// Parse a pt-BR formatted amount token into a plain `f64`.
///
/// Strips everything that is not a digit, sign, `,` or `.`, drops the
/// thousands dots and swaps the decimal comma. Unparseable input yields
/// `0.0` so downstream code never needs to null-check an amount.
pub fn parse_amount(token: &str) -> f64 {
    let kept: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ',' | '.'))
        .collect();
    kept.replace('.', "").replace(',', ".").parse().unwrap_or(0.0)
}

/// Render an amount back into pt-BR notation ("1.234,56").
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!(
        "{}{},{:02}",
        if negative { "-" } else { "" },
        grouped,
        cents % 100
    )
}

/// Fold pt-BR accented characters to their ASCII base so keyword matching
/// works regardless of how the user typed the message.
pub fn strip_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'Ç' => 'C',
            _ => c,
        })
        .collect()
}

/// Pull every numeric token out of a text segment.
///
/// Matches pt-BR grouped decimals ("1.234,56") and plain signed numbers
/// ("50", "23,50", "-10.5"), keeping only finite non-zero values. Sign is
/// preserved; callers decide what to do with it.
pub fn extract_amounts(segment: &str) -> Vec<f64> {
    let re = match Regex::new(
        r"[-+]?\d{1,3}(?:\.\d{3})+(?:,\d{1,2})?|[-+]?\d+(?:[.,]\d{1,2})?",
    ) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    re.find_iter(segment)
        .map(|m| parse_numeric_token(m.as_str()))
        .filter(|v| v.is_finite() && *v != 0.0)
        .collect()
}

fn parse_numeric_token(token: &str) -> f64 {
    if token.contains(',') {
        return parse_amount(token);
    }
    if let Some((whole, frac)) = token.rsplit_once('.') {
        // A lone dot with up to two trailing digits reads as a decimal
        // point; anything else is a thousands separator.
        if frac.len() <= 2 && !whole.contains('.') {
            return token.parse().unwrap_or(0.0);
        }
        return parse_amount(token);
    }
    token.parse().unwrap_or(0.0)
}

/// Parse a date token. Total: returns `None` for anything unrecognized or
/// impossible (callers treat `None` as "unknown date", never as an error).
pub fn parse_date(token: &str) -> Option<NaiveDate> {
    if token.trim().is_empty() {
        return None;
    }
    parse_dmy_full(token)
        .or_else(|| parse_iso(token))
        .or_else(|| parse_digit_run(token))
        .or_else(|| parse_dmy_short(token))
}

fn parse_dmy_full(token: &str) -> Option<NaiveDate> {
    let re = Regex::new(r"(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})").ok()?;
    let caps = re.captures(token)?;
    ymd(caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?)
}

fn parse_iso(token: &str) -> Option<NaiveDate> {
    let re = Regex::new(r"(\d{4})[/\-](\d{2})[/\-](\d{2})").ok()?;
    let caps = re.captures(token)?;
    ymd(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

fn parse_digit_run(token: &str) -> Option<NaiveDate> {
    let re = Regex::new(r"\d{8}").ok()?;
    let run = re.find(token)?.as_str();
    if run.starts_with("20") {
        // YYYYMMDD (OFX DTPOSTED and friends)
        ymd(
            run[0..4].parse().ok()?,
            run[4..6].parse().ok()?,
            run[6..8].parse().ok()?,
        )
    } else {
        // DDMMYYYY
        ymd(
            run[4..8].parse().ok()?,
            run[2..4].parse().ok()?,
            run[0..2].parse().ok()?,
        )
    }
}

fn parse_dmy_short(token: &str) -> Option<NaiveDate> {
    let re = Regex::new(r"(\d{1,2})[/\-](\d{1,2})[/\-](\d{2})\b").ok()?;
    let caps = re.captures(token)?;
    let year: i32 = caps[3].parse().ok()?;
    ymd(2000 + year, caps[2].parse().ok()?, caps[1].parse().ok()?)
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}
