mod common;

use common::fields_of;
use price_rounder::{PriceEngine, RoundingMode, Settings};

fn round_text(text: &str, mode: RoundingMode) -> (bool, String) {
    let mut engine: PriceEngine<u32> = PriceEngine::with_defaults().unwrap();
    let mut ctx = engine.begin_pass(Settings::with_mode(mode));
    let out = engine.process_span(&mut ctx, 1, text);
    (out.changed, out.new_content)
}

#[test]
fn dollar_price_rounds_up_to_next_unit() {
    assert_eq!(
        round_text("$39.99", RoundingMode::Nearest),
        (true, "$40.00".to_string())
    );
}

#[test]
fn whole_naira_amount_is_already_rounded() {
    assert_eq!(
        round_text("₦29,133", RoundingMode::Nearest),
        (false, "₦29,133".to_string())
    );
}

#[test]
fn euro_price_rounds_to_multiple_of_ten() {
    assert_eq!(
        round_text("€19.95", RoundingMode::Multiple10),
        (true, "€20.00".to_string())
    );
}

#[test]
fn split_widget_carries_into_whole_field() {
    let mut engine: PriceEngine<u32> = PriceEngine::with_defaults().unwrap();
    let mut ctx = engine.begin_pass(Settings::default());
    let out = engine.process_structured_widget(
        &mut ctx,
        7,
        &fields_of(&[("whole", "14"), ("fraction", "99")]),
    );
    assert!(out.changed);
    assert_eq!(out.new_content, fields_of(&[("whole", "15"), ("fraction", "00")]));
}

#[test]
fn order_number_is_not_a_price() {
    let engine: PriceEngine<u32> = PriceEngine::with_defaults().unwrap();
    assert!(engine.matcher().find_matches("Order #4599 shipped").is_empty());
    assert_eq!(
        round_text("Order #4599 shipped", RoundingMode::Multiple10),
        (false, "Order #4599 shipped".to_string())
    );
}

#[test]
fn mixed_listing_snapshot() {
    let (changed, text) = round_text(
        "Was $39.99, now 19,95 € or kr 49.00 (USD 1,299.00)",
        RoundingMode::Multiple10,
    );
    assert!(changed);
    insta::assert_snapshot!(text, @"Was $40.00, now 20,00 € or kr 50.00 (USD 1,300.00)");
}

#[test]
fn regional_formats_keep_their_separators() {
    assert_eq!(
        round_text("Preis: 1.234,56 €", RoundingMode::Nearest).1,
        "Preis: 1.235,00 €"
    );
    assert_eq!(
        round_text("₹12,34,567.40", RoundingMode::Nearest).1,
        "₹12,34,568.00"
    );
    assert_eq!(
        round_text("CHF 1'299.95", RoundingMode::Multiple5).1,
        "CHF 1'300.00"
    );
}

#[test]
fn keyword_gated_bare_numerals() {
    assert_eq!(
        round_text("Sale price 45.99 today", RoundingMode::Nearest).1,
        "Sale price 46.00 today"
    );
    assert_eq!(
        round_text("Version 45.99 released", RoundingMode::Nearest).1,
        "Version 45.99 released"
    );
}

#[test]
fn space_grouped_amounts_round_as_one_price() {
    assert_eq!(
        round_text("1 999,99 €", RoundingMode::Multiple10),
        (true, "2 000,00 €".to_string())
    );
    assert_eq!(
        round_text("Total 12 345.50 USD", RoundingMode::Nearest).1,
        "Total 12 346.00 USD"
    );
}

#[test]
fn adjacent_suffix_prices_are_both_rounded() {
    assert_eq!(
        round_text("19.99 € 29.99 €", RoundingMode::Nearest).1,
        "20.00 € 30.00 €"
    );
}

#[test]
fn malformed_amount_is_left_while_later_prices_round() {
    assert_eq!(
        round_text("$1,234,56 then $5.50", RoundingMode::Nearest),
        (true, "$1,234,56 then $6.00".to_string())
    );
    assert_eq!(
        round_text("USD 12345678901234567.00 or USD 9.99", RoundingMode::Nearest).1,
        "USD 12345678901234567.00 or USD 10.00"
    );
}
