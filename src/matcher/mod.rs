//! Scans a text span for prices and resolves overlapping candidates by rank.

use std::ops::Range;

use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{BareNumeralPolicy, IntegerAmountPolicy, MatcherConfig};
use crate::currency::{self, CurrencyToken, Position};
use crate::errors::{Result, RounderError};
use crate::number::NumberFormat;

/// Integer digits: lakh groups, three-digit groups, or no grouping at all.
const INTEGER_NUMERAL: &str =
    r"(?:\d{1,2}(?:,\d{2})+,\d{3}|\d{1,3}(?:[,.\x{a0}\x{202f}']\d{3})+|\d+)";
/// [`INTEGER_NUMERAL`] plus plain-space groups (`1 999`). Only used next to a
/// currency marker, where the marker anchors the whole amount.
const MARKED_INTEGER_NUMERAL: &str =
    r"(?:\d{1,2}(?:,\d{2})+,\d{3}|\d{1,3}(?:[,.\x{a0}\x{202f}']\d{3})+|\d{1,3}(?: \d{3})+|\d+)";
const GAP: &str = r"(?P<gap>\s{0,2})";

/// The pattern that produced a match. Declaration order is checking order;
/// see [`PatternKind::rank`] for priority.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatternKind {
    /// `$39.99`, `EUR 19,95`
    CurrencyPrefix,
    /// `19.95 €`, `9.99 kr`, `4.50 dollars`
    CurrencySuffix,
    /// `₦29,133`, `JPY 1,280`
    WholeUnitPrefix,
    /// `29,133 naira`
    WholeUnitSuffix,
    /// `Price: 45.99`
    Keyword,
    /// Any isolated amount; only with [`BareNumeralPolicy::Broad`].
    Broad,
}

impl PatternKind {
    /// Lower ranks win on overlap. Prefix and suffix readings of one family
    /// share a rank, so the leftmost of them wins.
    pub fn rank(self) -> u8 {
        match self {
            PatternKind::CurrencyPrefix | PatternKind::CurrencySuffix => 0,
            PatternKind::WholeUnitPrefix | PatternKind::WholeUnitSuffix => 1,
            PatternKind::Keyword => 2,
            PatternKind::Broad => 3,
        }
    }

    fn position(self) -> Option<Position> {
        match self {
            PatternKind::CurrencyPrefix | PatternKind::WholeUnitPrefix => Some(Position::Prefix),
            PatternKind::CurrencySuffix | PatternKind::WholeUnitSuffix => Some(Position::Suffix),
            PatternKind::Keyword | PatternKind::Broad => None,
        }
    }

    fn is_bare(self) -> bool {
        self.position().is_none()
    }
}

/// One recognised price inside a text span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceMatch {
    /// Byte range of the whole price, marker and spacing included.
    pub span: Range<usize>,
    /// Byte range of the numeral alone.
    pub numeral: Range<usize>,
    pub token: Option<CurrencyToken>,
    pub number: NumberFormat,
    pub pattern: PatternKind,
    pub pattern_rank: u8,
}

impl PriceMatch {
    pub fn overlaps(&self, other: &PriceMatch) -> bool {
        self.span.start < other.span.end && other.span.start < self.span.end
    }

    /// True when the currency is displayed in whole units.
    pub fn is_zero_decimal(&self) -> bool {
        self.token.as_ref().is_some_and(CurrencyToken::is_zero_decimal)
    }
}

struct Pattern {
    kind: PatternKind,
    regex: Regex,
}

/// Finds every non-overlapping price in a text span.
pub struct PriceMatcher {
    patterns: Vec<Pattern>,
}

impl PriceMatcher {
    pub fn new(config: &MatcherConfig) -> Result<Self> {
        let decimal = format!(r"{}[.,]\d{{2}}", INTEGER_NUMERAL);
        let marked_decimal = format!(r"{}[.,]\d{{2}}", MARKED_INTEGER_NUMERAL);
        let any_prefix = currency::token_alternation(Position::Prefix, false);
        let any_suffix = currency::token_alternation(Position::Suffix, false);
        let (whole_prefix, whole_suffix) = match config.integer_amounts {
            IntegerAmountPolicy::ZeroDecimalOnly => (
                currency::token_alternation(Position::Prefix, true),
                currency::token_alternation(Position::Suffix, true),
            ),
            IntegerAmountPolicy::AnyCurrency => (any_prefix.clone(), any_suffix.clone()),
        };

        let mut sources = vec![
            (
                PatternKind::CurrencyPrefix,
                format!("(?P<tok>{}){}(?P<num>{})", any_prefix, GAP, marked_decimal),
            ),
            (
                PatternKind::CurrencySuffix,
                format!("(?P<num>{}){}(?P<tok>{})", marked_decimal, GAP, any_suffix),
            ),
            (
                PatternKind::WholeUnitPrefix,
                format!("(?P<tok>{}){}(?P<num>{})", whole_prefix, GAP, MARKED_INTEGER_NUMERAL),
            ),
            (
                PatternKind::WholeUnitSuffix,
                format!("(?P<num>{}){}(?P<tok>{})", MARKED_INTEGER_NUMERAL, GAP, whole_suffix),
            ),
        ];

        let keywords: Vec<String> = config
            .keywords
            .iter()
            .map(|word| word.trim())
            .filter(|word| !word.is_empty())
            .map(regex::escape)
            .collect();
        if config.bare_numerals != BareNumeralPolicy::Disabled && !keywords.is_empty() {
            sources.push((
                PatternKind::Keyword,
                format!(
                    r"(?i:\b(?:{})\b)[:\s]{{0,3}}(?P<num>{})",
                    keywords.join("|"),
                    decimal
                ),
            ));
        }
        if config.bare_numerals == BareNumeralPolicy::Broad {
            sources.push((
                PatternKind::Broad,
                format!(r"(?P<num>{}|\d{{2,4}})", decimal),
            ));
        }

        let patterns = sources
            .into_iter()
            .map(|(kind, source)| {
                Regex::new(&source)
                    .map(|regex| Pattern { kind, regex })
                    .map_err(|err| RounderError::Config(format!("{:?} pattern: {}", kind, err)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(&MatcherConfig::default())
    }

    /// Returns the prices in `text`, sorted by start offset and pairwise
    /// disjoint. When candidates overlap the lower rank wins, then the one
    /// starting first, and the other is dropped entirely.
    pub fn find_matches(&self, text: &str) -> Vec<PriceMatch> {
        let mut candidates = Vec::new();
        for pattern in &self.patterns {
            self.collect(pattern, text, &mut candidates);
        }
        candidates.sort_by_key(|candidate| {
            (candidate.pattern_rank, candidate.span.start, candidate.pattern)
        });

        let mut accepted: Vec<PriceMatch> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if let Some(winner) = accepted.iter().find(|kept| kept.overlaps(&candidate)) {
                trace!(
                    dropped = ?candidate.span,
                    kept = ?winner.span,
                    "overlapping candidate dropped"
                );
                continue;
            }
            accepted.push(candidate);
        }
        accepted.sort_by_key(|found| found.span.start);
        accepted
    }

    fn collect(&self, pattern: &Pattern, text: &str, out: &mut Vec<PriceMatch>) {
        let mut pos = 0;
        while pos <= text.len() {
            let Some(caps) = pattern.regex.captures_at(text, pos) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };
            match build_match(pattern.kind, text, &caps) {
                Some(found) => {
                    out.push(found);
                    pos = whole.end().max(whole.start() + 1);
                }
                None => pos = next_char_boundary(text, whole.start()),
            }
        }
    }
}

fn build_match(kind: PatternKind, text: &str, caps: &Captures<'_>) -> Option<PriceMatch> {
    let num = caps.name("num")?;
    let numeral = num.start()..num.end();
    if !numeral_is_isolated(text, &numeral) {
        return None;
    }

    let token = match kind.position() {
        Some(position) => {
            let raw = caps.name("tok")?.as_str();
            let spaced = caps.name("gap").is_some_and(|gap| !gap.as_str().is_empty());
            match CurrencyToken::lookup(raw, position, spaced) {
                Ok(token) => Some(token),
                Err(err) => {
                    debug!(error = %err, "candidate discarded");
                    return None;
                }
            }
        }
        None => {
            if !bare_numeral_allowed(kind, text, &numeral) {
                return None;
            }
            None
        }
    };

    let number = match NumberFormat::parse(num.as_str()) {
        Ok(number) => number,
        Err(err) => {
            debug!(error = %err, pattern = ?kind, "candidate discarded");
            return None;
        }
    };

    let span = if kind.is_bare() {
        numeral.clone()
    } else {
        caps.get(0).map(|m| m.start()..m.end())?
    };
    Some(PriceMatch {
        span,
        numeral,
        token,
        number,
        pattern: kind,
        pattern_rank: kind.rank(),
    })
}

/// Rejects numerals that are really a slice of a longer number, including
/// the tail groups of a space-grouped amount such as `12 345.50`.
fn numeral_is_isolated(text: &str, numeral: &Range<usize>) -> bool {
    let mut before = text[..numeral.start].chars().rev();
    match before.next() {
        Some(c) if c.is_ascii_digit() => return false,
        Some(c) if is_numeral_joiner(c) && before.next().is_some_and(|p| p.is_ascii_digit()) => {
            return false
        }
        Some(' ')
            if before.next().is_some_and(|p| p.is_ascii_digit())
                && leading_group_len(&text[numeral.clone()]) == 3 =>
        {
            return false
        }
        _ => {}
    }
    let mut after = text[numeral.end..].chars();
    match after.next() {
        Some(c) if c.is_ascii_digit() => false,
        Some(c) if is_numeral_joiner(c) => !after.next().is_some_and(|n| n.is_ascii_digit()),
        _ => true,
    }
}

fn leading_group_len(numeral: &str) -> usize {
    numeral.chars().take_while(char::is_ascii_digit).count()
}

fn is_numeral_joiner(c: char) -> bool {
    matches!(c, ',' | '.' | '\'' | '\u{a0}' | '\u{202f}')
}

/// A bare numeral must not touch a currency marker (the currency patterns
/// own those) or look like part of an identifier, date, or percentage.
fn bare_numeral_allowed(kind: PatternKind, text: &str, numeral: &Range<usize>) -> bool {
    let before = &text[..numeral.start];
    let after = &text[numeral.end..];
    if currency::recognize(before, Position::Prefix).is_some()
        || currency::recognize(after, Position::Suffix).is_some()
    {
        return false;
    }
    if after.starts_with(|c: char| c == '%' || c.is_alphanumeric()) {
        return false;
    }
    if kind == PatternKind::Broad {
        let touches = |c: char| c.is_alphanumeric() || matches!(c, '#' | '-' | '/' | ':' | '+');
        if before.chars().next_back().is_some_and(touches)
            || after.chars().next().is_some_and(touches)
        {
            return false;
        }
    }
    true
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    text[from..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| from + c.len_utf8())
}
