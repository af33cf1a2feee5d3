//! Expansion of WMI range notation into individual codes.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::vin::{alphabet_index, ALPHABET};

/// A three-character range such as `1A4-1A8`.
static FACTORY_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{3}-[A-Z0-9]{3}").expect("static regex"));

/// Why a factory range could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// A range bound uses a character outside the VIN alphabet.
    #[error("invalid character in range '{0}'")]
    InvalidCharacter(String),

    /// A range whose bounds are not both three characters.
    #[error("invalid range format '{0}'")]
    InvalidRange(String),

    /// Neither a range nor a single code.
    #[error("unknown WMI range format: '{0}'")]
    UnknownFormat(String),

    /// A part of a WMI list that is not 2 or 3 characters and not a range.
    #[error("invalid WMI format (not 2 or 3 chars, not a range): '{0}'")]
    InvalidPart(String),
}

/// Codes from `prefix + start` through `prefix + end` in alphabet order.
fn walk(prefix: &str, start: usize, end: usize) -> Vec<String> {
    ALPHABET
        .chars()
        .skip(start)
        .take((end + 1).saturating_sub(start))
        .map(|c| format!("{prefix}{c}"))
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Expand a WMI region range into two-character codes.
///
/// Accepted forms:
/// - `AA-AH`: second character walks the alphabet, first character is
///   taken from the start bound
/// - `A`: all 33 codes beginning with `A`
/// - `AB`: the code itself
/// - comma-separated lists of the above
///
/// Anything else expands to nothing.
#[must_use]
pub fn expand_region_range(range: &str) -> Vec<String> {
    let range = range.trim();

    if range.contains(',') {
        return range.split(',').flat_map(expand_region_range).collect();
    }

    if let Some((start, end)) = range.split_once('-') {
        let (start, end) = (start.trim(), end.trim());
        if char_len(start) != 2 || char_len(end) != 2 || end.contains('-') {
            return Vec::new();
        }
        let mut start_chars = start.chars();
        let (Some(first), Some(from)) = (start_chars.next(), start_chars.next()) else {
            return Vec::new();
        };
        let Some(to) = end.chars().nth(1) else {
            return Vec::new();
        };
        return match (alphabet_index(from), alphabet_index(to)) {
            (Some(s), Some(e)) => walk(&first.to_string(), s, e),
            _ => Vec::new(),
        };
    }

    match char_len(range) {
        1 => walk(range, 0, ALPHABET.len() - 1),
        2 => vec![range.to_string()],
        _ => Vec::new(),
    }
}

/// Expand a single factory range (`JHF-JHG`) or code (`JHZ`).
///
/// # Errors
///
/// Returns a [`RangeError`] if the input is neither a well-formed range
/// nor a three-character code.
pub fn expand_factory_range(range: &str) -> Result<Vec<String>, RangeError> {
    let range = range.trim();

    if let Some((start, end)) = range.split_once('-') {
        let (start, end) = (start.trim(), end.trim());
        if char_len(start) != 3 || char_len(end) != 3 || end.contains('-') {
            return Err(RangeError::InvalidRange(range.to_string()));
        }
        let prefix: String = start.chars().take(2).collect();
        let from = start.chars().nth(2).and_then(alphabet_index);
        let to = end.chars().nth(2).and_then(alphabet_index);
        return match (from, to) {
            (Some(s), Some(e)) => Ok(walk(&prefix, s, e)),
            _ => Err(RangeError::InvalidCharacter(range.to_string())),
        };
    }

    if char_len(range) == 3 {
        Ok(vec![range.to_string()])
    } else {
        Err(RangeError::UnknownFormat(range.to_string()))
    }
}

/// Result of parsing the WMI column of a factory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedWmis {
    /// Three-character codes, in source order.
    pub codes: Vec<String>,
    /// Parts that could not be interpreted.
    pub errors: Vec<RangeError>,
}

/// Parse a free-form WMI list such as `JHF-JHG, JHL-JHN, JHZ / KL`.
///
/// Commas, spaces and slashes all separate parts. Each part is a single
/// code, a three-character range, or a two-character block that stands
/// for every code beginning with it (`KL` → `KLA`..`KL0`).
#[must_use]
pub fn parse_factory_wmis(raw: &str) -> ParsedWmis {
    let mut parsed = ParsedWmis::default();

    let normalized = raw.replace([' ', '/'], ",");
    for part in normalized.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match char_len(part) {
            3 => parsed.codes.push(part.to_string()),
            2 => parsed.codes.extend(walk(part, 0, ALPHABET.len() - 1)),
            _ if FACTORY_RANGE.is_match(part) => match expand_factory_range(part) {
                Ok(codes) => parsed.codes.extend(codes),
                Err(e) => parsed.errors.push(e),
            },
            _ => parsed.errors.push(RangeError::InvalidPart(raw.trim().to_string())),
        }
    }

    parsed
}

/// Every two-character region code, `AA` through `00`.
#[must_use]
pub fn all_region_codes() -> Vec<String> {
    ALPHABET
        .chars()
        .flat_map(|first| ALPHABET.chars().map(move |second| format!("{first}{second}")))
        .collect()
}
