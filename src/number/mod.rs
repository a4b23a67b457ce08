//! Numeral parsing and re-rendering that preserves the source formatting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, RounderError};

/// Largest magnitude that survives a round trip through an IEEE double.
const MAX_SAFE_MAGNITUDE: u64 = 9_007_199_254_740_991;

/// Characters accepted as thousands separators besides `,` and `.`.
const SPACE_SEPARATORS: [char; 3] = [' ', '\u{a0}', '\u{202f}'];
const APOSTROPHE: char = '\'';

/// How the integer digits of a numeral were grouped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GroupingStyle {
    #[default]
    None,
    /// `1,234,567`
    ThreeDigitGroups,
    /// `12,34,567`: a trailing group of three, then groups of two.
    IndianLakh,
}

/// Magnitude of a numeral plus the conventions needed to render it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub magnitude: Decimal,
    pub thousands_separator: Option<char>,
    pub decimal_separator: Option<char>,
    pub decimal_digits: u8,
    pub grouping: GroupingStyle,
}

impl NumberFormat {
    /// Parses a numeral such as `1,234.56`, `1.234,56`, `29,133` or `14,99`.
    ///
    /// When both `,` and `.` appear the rightmost is the decimal separator. A
    /// lone separator kind is decimal only when exactly two digits follow its
    /// last occurrence.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim_matches(|c: char| c.is_whitespace());
        if raw.is_empty() || !raw.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid(raw, "numeral must start with a digit"));
        }
        if let Some(bad) = raw.chars().find(|&c| !c.is_ascii_digit() && !is_separator(c)) {
            return Err(invalid(raw, &format!("unexpected character `{}`", bad)));
        }
        if !raw.ends_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid(raw, "numeral must end with a digit"));
        }

        let decimal = detect_decimal_separator(raw);
        let decimal_separator = decimal.map(|(sep, _)| sep);
        let (int_text, fraction) = match decimal {
            Some((_, pos)) => (&raw[..pos], &raw[pos + 1..]),
            None => (raw, ""),
        };
        if let Some(sep) = decimal_separator {
            if int_text.contains(sep) {
                return Err(invalid(raw, "decimal separator appears more than once"));
            }
        }
        if fraction.chars().any(|c| !c.is_ascii_digit()) {
            return Err(invalid(raw, "fractional part must be digits"));
        }
        if decimal_separator.is_some() && fraction.len() != 2 {
            return Err(invalid(raw, "fractional part must have two digits"));
        }

        let mut group_chars = int_text.chars().filter(|c| !c.is_ascii_digit());
        let thousands_separator = group_chars.next();
        if group_chars.any(|c| Some(c) != thousands_separator) {
            return Err(invalid(raw, "mixed grouping separators"));
        }
        if thousands_separator.is_some() && thousands_separator == decimal_separator {
            return Err(invalid(raw, "grouping and decimal separators collide"));
        }

        let groups: Vec<&str> = match thousands_separator {
            Some(sep) => int_text.split(sep).collect(),
            None => vec![int_text],
        };
        if groups.iter().any(|group| group.is_empty()) {
            return Err(invalid(raw, "empty digit group"));
        }
        let grouping = classify_grouping(&groups);

        let digits: String = groups.concat();
        let significant = digits.trim_start_matches('0');
        if significant.len() > 16
            || significant.parse::<u64>().map_or(!significant.is_empty(), |v| v > MAX_SAFE_MAGNITUDE)
        {
            return Err(invalid(raw, "magnitude exceeds the safe range"));
        }

        let canonical = if fraction.is_empty() {
            digits
        } else {
            format!("{}.{}", digits, fraction)
        };
        let magnitude = canonical
            .parse::<Decimal>()
            .map_err(|err| invalid(raw, &err.to_string()))?;

        Ok(Self {
            magnitude,
            thousands_separator,
            decimal_separator,
            decimal_digits: fraction.len() as u8,
            grouping,
        })
    }

    /// Renders `magnitude` with the grouping and decimal conventions captured
    /// at parse time.
    ///
    /// `zero_decimal` forces whole-unit output for currencies displayed
    /// without a fractional part.
    pub fn render(&self, magnitude: Decimal, zero_decimal: bool) -> String {
        let digits = if zero_decimal { 0 } else { self.decimal_digits };
        let value = magnitude.max(Decimal::ZERO).round_dp(u32::from(digits));
        let fixed = format!("{:.*}", digits as usize, value);
        let (int_part, fraction) = match fixed.split_once('.') {
            Some((int_part, fraction)) => (int_part, fraction),
            None => (fixed.as_str(), ""),
        };

        let mut out = match self.thousands_separator {
            Some(sep) => group_digits(int_part, sep, self.grouping),
            None => int_part.to_string(),
        };
        if digits > 0 {
            out.push(self.decimal_separator.unwrap_or('.'));
            out.push_str(fraction);
        }
        out
    }

    /// True when the numeral carried a fractional part.
    pub fn has_fraction(&self) -> bool {
        self.decimal_digits > 0
    }
}

fn invalid(raw: &str, reason: &str) -> RounderError {
    RounderError::InvalidNumeral(format!("`{}`: {}", raw, reason))
}

fn is_separator(c: char) -> bool {
    matches!(c, ',' | '.' | APOSTROPHE) || SPACE_SEPARATORS.contains(&c)
}

/// Returns the decimal separator and its byte offset, if the numeral has one.
fn detect_decimal_separator(raw: &str) -> Option<(char, usize)> {
    match (raw.rfind(','), raw.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => Some((',', comma)),
        (Some(_), Some(dot)) => Some(('.', dot)),
        (Some(pos), None) | (None, Some(pos)) => {
            let tail = &raw[pos + 1..];
            let sep = if raw.as_bytes()[pos] == b',' { ',' } else { '.' };
            (tail.len() == 2 && tail.chars().all(|c| c.is_ascii_digit())).then_some((sep, pos))
        }
        (None, None) => None,
    }
}

fn classify_grouping(groups: &[&str]) -> GroupingStyle {
    if groups.len() < 2 {
        return GroupingStyle::None;
    }
    let (last, middle) = match groups.split_last() {
        Some((last, rest)) => (*last, &rest[1..]),
        None => return GroupingStyle::None,
    };
    if last.len() == 3 && !middle.is_empty() && middle.iter().all(|group| group.len() == 2) {
        GroupingStyle::IndianLakh
    } else {
        GroupingStyle::ThreeDigitGroups
    }
}

fn group_digits(digits: &str, separator: char, style: GroupingStyle) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut grouped = String::new();
    let mut count = 0;
    let mut next_break = 3;
    for ch in chars.iter().rev() {
        if count != 0 && count == next_break && style != GroupingStyle::None {
            grouped.insert(0, separator);
            next_break += match style {
                GroupingStyle::IndianLakh => 2,
                _ => 3,
            };
        }
        grouped.insert(0, *ch);
        count += 1;
    }
    grouped
}
