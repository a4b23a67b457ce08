//! Currency marker tables and recognition of markers adjacent to a numeral.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, RounderError};

/// Glyph symbols with the ISO code they usually stand for, if unambiguous.
pub const SYMBOLS: &[(&str, Option<&str>)] = &[
    ("US$", Some("USD")),
    ("R$", Some("BRL")),
    ("C$", Some("CAD")),
    ("A$", Some("AUD")),
    ("$", None),
    ("€", Some("EUR")),
    ("£", Some("GBP")),
    ("¥", None),
    ("₹", Some("INR")),
    ("₽", Some("RUB")),
    ("₩", Some("KRW")),
    ("₪", Some("ILS")),
    ("₦", Some("NGN")),
    ("₺", Some("TRY")),
    ("₱", Some("PHP")),
    ("₫", Some("VND")),
    ("฿", Some("THB")),
    ("kr", None),
    ("zł", Some("PLN")),
];

/// ISO-4217 codes recognised next to a numeral.
pub const CODES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "CNY", "SEK", "NOK", "DKK", "ISK", "MXN",
    "INR", "RUB", "KRW", "SGD", "HKD", "NZD", "ZAR", "BRL", "PLN", "CZK", "HUF", "ILS", "TRY",
    "THB", "MYR", "PHP", "IDR", "VND", "AED", "SAR", "EGP", "NGN", "KES", "GHS", "UGX", "TZS",
    "ZMW", "BWP", "NAD", "MWK", "RWF", "BIF", "DJF", "ETB", "MUR", "NPR", "LKR", "PKR", "BDT",
    "IQD", "JOD", "KWD", "LBP", "OMR", "QAR", "BHD", "AMD", "AZN", "GEL", "KZT", "UZS", "UAH",
    "RON", "BGN", "RSD", "BAM", "MKD", "ALL", "FJD", "XPF", "VUV", "CLP", "PYG", "COP", "ARS",
    "PEN", "TWD",
];

/// Spelled-out names, matched case-insensitively, with their ISO code.
pub const NAMES: &[(&str, &str)] = &[
    ("dollars", "USD"),
    ("dollar", "USD"),
    ("euros", "EUR"),
    ("euro", "EUR"),
    ("pounds", "GBP"),
    ("pound", "GBP"),
    ("yen", "JPY"),
    ("yuan", "CNY"),
    ("rupees", "INR"),
    ("rupee", "INR"),
    ("roubles", "RUB"),
    ("rouble", "RUB"),
    ("rubles", "RUB"),
    ("ruble", "RUB"),
    ("naira", "NGN"),
    ("pesos", "MXN"),
    ("peso", "MXN"),
    ("francs", "CHF"),
    ("franc", "CHF"),
    ("rand", "ZAR"),
    ("shekels", "ILS"),
    ("shekel", "ILS"),
    ("kronor", "SEK"),
    ("krona", "SEK"),
    ("kroner", "NOK"),
    ("krone", "NOK"),
    ("zloty", "PLN"),
    ("lira", "TRY"),
    ("baht", "THB"),
];

/// Currencies displayed in whole units. Naira follows the observed page
/// convention; the rest have no minor unit in ISO-4217.
pub const ZERO_DECIMAL_CODES: &[&str] = &[
    "NGN", "JPY", "KRW", "VND", "ISK", "UGX", "RWF", "BIF", "DJF", "XPF", "VUV", "CLP", "PYG",
];

/// Which side of the numeral the marker sits on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Position {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Symbol,
    Code,
    Name,
}

/// A recognised currency marker next to a numeral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyToken {
    /// The marker exactly as it appeared in the text.
    pub symbol_or_code: String,
    pub kind: TokenKind,
    /// ISO code the marker resolves to, when it is unambiguous.
    pub code: Option<String>,
    pub position: Position,
    pub spaced: bool,
}

impl CurrencyToken {
    /// Resolves `raw` against the symbol, code, then name tables.
    pub fn lookup(raw: &str, position: Position, spaced: bool) -> Result<Self> {
        let (kind, code) = classify(raw)
            .ok_or_else(|| RounderError::UnknownCurrencyToken(raw.to_string()))?;
        Ok(Self {
            symbol_or_code: raw.to_string(),
            kind,
            code: code.map(str::to_string),
            position,
            spaced,
        })
    }

    /// True for currencies shown without a fractional part.
    pub fn is_zero_decimal(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|code| ZERO_DECIMAL_CODES.contains(&code))
    }
}

fn classify(raw: &str) -> Option<(TokenKind, Option<&'static str>)> {
    if let Some((_, code)) = SYMBOLS.iter().find(|(symbol, _)| *symbol == raw) {
        return Some((TokenKind::Symbol, *code));
    }
    if let Some(code) = CODES.iter().find(|code| **code == raw) {
        return Some((TokenKind::Code, Some(*code)));
    }
    let lowered = raw.to_lowercase();
    NAMES
        .iter()
        .find(|(name, _)| *name == lowered)
        .map(|(_, code)| (TokenKind::Name, Some(*code)))
}

/// Builds a regex alternation over the marker tables for one side of a
/// numeral.
///
/// A marker that begins or ends with a letter gets a word boundary on the
/// side facing away from the numeral, so codes never match inside words while
/// `19.99EUR` and `EUR19.99` are still recognised. Names are only offered in
/// [`Position::Suffix`].
pub fn token_alternation(position: Position, zero_decimal_only: bool) -> String {
    let mut markers: Vec<(String, bool)> = Vec::new();
    for (symbol, code) in SYMBOLS {
        if !zero_decimal_only || code.is_some_and(|code| ZERO_DECIMAL_CODES.contains(&code)) {
            markers.push((symbol.to_string(), false));
        }
    }
    for code in CODES {
        if !zero_decimal_only || ZERO_DECIMAL_CODES.contains(code) {
            markers.push((code.to_string(), false));
        }
    }
    if position == Position::Suffix {
        for (name, code) in NAMES {
            if !zero_decimal_only || ZERO_DECIMAL_CODES.contains(code) {
                markers.push((name.to_string(), true));
            }
        }
    }
    markers.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));

    let parts: Vec<String> = markers
        .iter()
        .map(|(marker, case_insensitive)| {
            let mut part = String::new();
            if position == Position::Prefix && marker.starts_with(char::is_alphanumeric) {
                part.push_str(r"\b");
            }
            part.push_str(&regex::escape(marker));
            if position == Position::Suffix && marker.ends_with(char::is_alphanumeric) {
                part.push_str(r"\b");
            }
            if *case_insensitive {
                format!("(?i:{})", part)
            } else {
                part
            }
        })
        .collect();
    format!("(?:{})", parts.join("|"))
}

static PREFIX_TOKEN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(&format!(r"(?P<tok>{})(?P<gap>\s*)$", token_alternation(Position::Prefix, false))).ok()
});

static SUFFIX_TOKEN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(&format!(r"^(?P<gap>\s*)(?P<tok>{})", token_alternation(Position::Suffix, false))).ok()
});

/// Recognises a marker adjacent to a numeral.
///
/// For [`Position::Prefix`] `text` is whatever precedes the numeral and the
/// marker must end it; for [`Position::Suffix`] `text` follows the numeral and
/// the marker must start it. Whitespace between marker and numeral is allowed
/// and recorded in `spaced`.
pub fn recognize(text: &str, position: Position) -> Option<CurrencyToken> {
    let pattern = match position {
        Position::Prefix => PREFIX_TOKEN.as_ref(),
        Position::Suffix => SUFFIX_TOKEN.as_ref(),
    }?;
    let caps = pattern.captures(text)?;
    let token = caps.name("tok")?.as_str();
    let spaced = caps.name("gap").is_some_and(|gap| !gap.as_str().is_empty());
    CurrencyToken::lookup(token, position, spaced).ok()
}
