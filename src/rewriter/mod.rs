//! Splices rounded prices back into text and structured widgets.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::config::RoundingMode;
use crate::ledger::{ContainerState, FieldMap, WidgetKind};
use crate::matcher::{PriceMatch, PriceMatcher};
use crate::number::NumberFormat;
use crate::rounding;

/// Field names understood by the split-price widget rewrite.
pub mod fields {
    pub const WHOLE: &str = "whole";
    pub const FRACTION: &str = "fraction";
    pub const SYMBOL: &str = "symbol";
    /// Plain-text copy of the price kept for screen readers.
    pub const MIRROR: &str = "offscreen";
}

const DEFAULT_SYMBOL: &str = "$";

/// Result of rewriting one text span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRewrite {
    pub text: String,
    /// Number of prices whose rendering actually changed.
    pub applied: usize,
}

impl TextRewrite {
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Result of rewriting one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRewrite {
    pub state: ContainerState,
    pub applied: usize,
}

impl ContainerRewrite {
    pub fn changed(&self) -> bool {
        self.applied > 0
    }

    fn unchanged(state: &ContainerState) -> Self {
        Self {
            state: state.clone(),
            applied: 0,
        }
    }
}

pub struct TextRewriter;

impl TextRewriter {
    /// Replaces the numeral of every match with its rounded rendering.
    ///
    /// Markers and spacing are copied through untouched and the output is
    /// never re-scanned, so one call rounds each price exactly once.
    pub fn rewrite(text: &str, matches: &[PriceMatch], mode: RoundingMode) -> TextRewrite {
        let mut out = String::with_capacity(text.len() + 8);
        let mut cursor = 0;
        let mut applied = 0;
        for found in matches {
            let numeral = found.numeral.clone();
            if numeral.start < cursor || numeral.end > text.len() {
                debug!(span = ?found.span, "match out of order for this text, skipped");
                continue;
            }
            let original = &text[numeral.clone()];
            let rendered = Self::render_match(found, mode);
            out.push_str(&text[cursor..numeral.start]);
            if rendered != original {
                trace!(from = original, to = %rendered, "price rounded");
                applied += 1;
            }
            out.push_str(&rendered);
            cursor = numeral.end;
        }
        out.push_str(&text[cursor..]);
        TextRewrite { text: out, applied }
    }

    /// Rounds the match's magnitude and renders it in the match's own format.
    pub fn render_match(found: &PriceMatch, mode: RoundingMode) -> String {
        let rounded = rounding::apply(found.number.magnitude, mode);
        found.number.render(rounded, found.is_zero_decimal())
    }

    /// Finds and rewrites every price in `text`.
    pub fn rewrite_text(text: &str, matcher: &PriceMatcher, mode: RoundingMode) -> TextRewrite {
        let matches = matcher.find_matches(text);
        Self::rewrite(text, &matches, mode)
    }
}

/// Rewrites a container with the strategy its [`WidgetKind`] calls for.
pub fn rewrite_container(
    content: &ContainerState,
    matcher: &PriceMatcher,
    mode: RoundingMode,
) -> ContainerRewrite {
    match (content.kind(), content) {
        (WidgetKind::Generic, ContainerState::Plain(text)) => {
            let rewrite = TextRewriter::rewrite_text(text, matcher, mode);
            ContainerRewrite {
                state: ContainerState::Plain(rewrite.text),
                applied: rewrite.applied,
            }
        }
        (WidgetKind::MultiFieldStructured, ContainerState::Structured(widget)) => {
            if widget.contains_key(fields::WHOLE) && widget.contains_key(fields::FRACTION) {
                rewrite_split_price(widget, matcher, mode)
                    .unwrap_or_else(|| ContainerRewrite::unchanged(content))
            } else {
                rewrite_each_field(widget, matcher, mode)
            }
        }
        _ => ContainerRewrite::unchanged(content),
    }
}

/// Widget with separate whole-unit and fractional-unit fields.
fn rewrite_split_price(
    widget: &FieldMap,
    matcher: &PriceMatcher,
    mode: RoundingMode,
) -> Option<ContainerRewrite> {
    let whole_raw = widget.get(fields::WHOLE)?;
    let fraction_raw = widget.get(fields::FRACTION)?;

    let whole_text = whole_raw.trim();
    let (whole_body, marker) = match whole_text.char_indices().next_back() {
        Some((pos, c)) if c == '.' || c == ',' => (&whole_text[..pos], &whole_text[pos..]),
        _ => (whole_text, ""),
    };
    let whole = match NumberFormat::parse(whole_body) {
        Ok(number) if !number.has_fraction() => number,
        Ok(_) | Err(_) => {
            debug!(whole = %whole_raw, "whole field is not an integer numeral");
            return None;
        }
    };

    let fraction_digits: String = fraction_raw.chars().filter(char::is_ascii_digit).collect();
    if fraction_digits.is_empty() || fraction_digits.len() > 2 {
        debug!(fraction = %fraction_raw, "fraction field is not a two-digit numeral");
        return None;
    }
    let scale = fraction_digits.len() as u32;
    let fraction = Decimal::new(fraction_digits.parse::<i64>().ok()?, scale);
    let magnitude = whole.magnitude + fraction;

    let rounded = rounding::apply(magnitude, mode);
    let rounded_whole = rounded.trunc();
    let minor_units = ((rounded - rounded_whole) * Decimal::from(10i64.pow(scale))).round();
    let new_whole = format!("{}{}", whole.render(rounded_whole, true), marker);
    let new_fraction = format!("{:0>width$}", minor_units.to_string(), width = scale as usize);

    let mut updated = widget.clone();
    updated.insert(fields::WHOLE.to_string(), new_whole);
    updated.insert(fields::FRACTION.to_string(), new_fraction.clone());

    if let Some(mirror) = widget.get(fields::MIRROR) {
        let plain_whole = rounded_whole.normalize().to_string();
        let mirrored = sync_mirror(mirror, widget, &plain_whole, &new_fraction, rounded, matcher);
        updated.insert(fields::MIRROR.to_string(), mirrored);
    }

    let applied = usize::from(&updated != widget);
    Some(ContainerRewrite {
        state: ContainerState::Structured(updated),
        applied,
    })
}

/// Keeps the accessible copy showing the same value as the visual fields.
fn sync_mirror(
    mirror: &str,
    widget: &FieldMap,
    plain_whole: &str,
    fraction: &str,
    rounded: Decimal,
    matcher: &PriceMatcher,
) -> String {
    if let Some(found) = matcher.find_matches(mirror).into_iter().next() {
        let rendered = found.number.render(rounded, found.is_zero_decimal());
        let mut text = String::with_capacity(mirror.len());
        text.push_str(&mirror[..found.numeral.start]);
        text.push_str(&rendered);
        text.push_str(&mirror[found.numeral.end..]);
        return text;
    }
    let symbol = widget
        .get(fields::SYMBOL)
        .map(|symbol| symbol.trim())
        .filter(|symbol| !symbol.is_empty())
        .unwrap_or(DEFAULT_SYMBOL);
    format!("{}{}.{}", symbol, plain_whole, fraction)
}

/// Widget whose fields each hold a full price string.
fn rewrite_each_field(widget: &FieldMap, matcher: &PriceMatcher, mode: RoundingMode) -> ContainerRewrite {
    let mut updated = FieldMap::new();
    let mut applied = 0;
    for (name, value) in widget {
        let rewrite = TextRewriter::rewrite_text(value, matcher, mode);
        applied += rewrite.applied;
        updated.insert(name.clone(), rewrite.text);
    }
    ContainerRewrite {
        state: ContainerState::Structured(updated),
        applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PriceMatcher {
        PriceMatcher::with_defaults().unwrap()
    }

    fn rewrite(text: &str, mode: RoundingMode) -> TextRewrite {
        TextRewriter::rewrite_text(text, &matcher(), mode)
    }

    fn widget(pairs: &[(&str, &str)]) -> ContainerState {
        ContainerState::Structured(
            pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }

    #[test]
    fn keeps_marker_position_and_spacing() {
        let out = rewrite("Now 19,95 € or kr 49.50, was €\u{a0}12.10", RoundingMode::Nearest);
        assert_eq!(out.text, "Now 20,00 € or kr 50.00, was €\u{a0}13.00");
        assert_eq!(out.applied, 3);
    }

    #[test]
    fn already_rounded_prices_do_not_count() {
        let out = rewrite("₦29,133 and $40.00", RoundingMode::Nearest);
        assert_eq!(out.text, "₦29,133 and $40.00");
        assert!(!out.changed());
    }

    #[test]
    fn zero_decimal_currency_drops_fraction() {
        let out = rewrite("₦29,133.50", RoundingMode::Multiple10);
        assert_eq!(out.text, "₦29,140");
    }

    #[test]
    fn grouping_is_preserved_when_rounding_crosses_a_group() {
        assert_eq!(rewrite("$1,999.99", RoundingMode::Nearest).text, "$2,000.00");
        assert_eq!(rewrite("999,99 EUR", RoundingMode::Multiple5).text, "1000,00 EUR");
    }

    #[test]
    fn rewriting_twice_is_stable() {
        for mode in RoundingMode::ALL {
            let once = rewrite("$39.99 | 12.34 zł | ₩9,999 | Price 7.25", mode);
            let twice = rewrite(&once.text, mode);
            assert_eq!(twice.text, once.text, "{mode}");
            assert_eq!(twice.applied, 0, "{mode}");
        }
    }

    #[test]
    fn split_price_widget_rounds_whole_and_fraction() {
        let content = widget(&[("whole", "14"), ("fraction", "99")]);
        let out = rewrite_container(&content, &matcher(), RoundingMode::Nearest);
        assert_eq!(out.state, widget(&[("whole", "15"), ("fraction", "00")]));
        assert_eq!(out.applied, 1);
    }

    #[test]
    fn split_price_widget_keeps_decimal_marker_and_mirror() {
        let content = widget(&[
            ("whole", "1,234."),
            ("fraction", "50"),
            ("symbol", "$"),
            ("offscreen", "$1,234.50"),
        ]);
        let out = rewrite_container(&content, &matcher(), RoundingMode::Multiple10);
        assert_eq!(
            out.state,
            widget(&[
                ("whole", "1,240."),
                ("fraction", "00"),
                ("symbol", "$"),
                ("offscreen", "$1,240.00"),
            ])
        );
    }

    #[test]
    fn split_price_mirror_without_price_is_rebuilt() {
        let content = widget(&[("whole", "8"), ("fraction", "10"), ("offscreen", "")]);
        let out = rewrite_container(&content, &matcher(), RoundingMode::Multiple5);
        let fields = out.state.as_fields().unwrap();
        assert_eq!(fields["offscreen"], "$10.00");
        assert_eq!(fields["whole"], "10");
    }

    #[test]
    fn split_price_on_grid_is_unchanged() {
        let content = widget(&[("whole", "20"), ("fraction", "00")]);
        let out = rewrite_container(&content, &matcher(), RoundingMode::Multiple10);
        assert!(!out.changed());
        assert_eq!(out.state, content);
    }

    #[test]
    fn malformed_split_price_is_left_alone() {
        let content = widget(&[("whole", "abc"), ("fraction", "99")]);
        let out = rewrite_container(&content, &matcher(), RoundingMode::Nearest);
        assert!(!out.changed());
        assert_eq!(out.state, content);
    }

    #[test]
    fn text_fields_widget_rewrites_every_field() {
        let content = widget(&[("amount", "₦4,567"), ("priceText", "Now ₦4,567.20")]);
        let out = rewrite_container(&content, &matcher(), RoundingMode::Multiple10);
        assert_eq!(
            out.state,
            widget(&[("amount", "₦4,570"), ("priceText", "Now ₦4,570")])
        );
        assert_eq!(out.applied, 2);
    }
}
