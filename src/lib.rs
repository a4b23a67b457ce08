#![doc(test(attr(deny(warnings))))]

//! Price Rounder finds monetary amounts in loosely structured page text,
//! rounds them up according to a [`config::Settings`] snapshot, and keeps
//! enough state to put every original string back.
//!
//! The pipeline is [`matcher::PriceMatcher`] → [`rewriter::TextRewriter`]
//! (backed by [`number::NumberFormat`] and [`rounding::apply`]) →
//! [`ledger::RevertLedger`], driven by [`engine::PriceEngine`].

pub mod config;
pub mod currency;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod matcher;
pub mod number;
pub mod rewriter;
pub mod rounding;
pub mod utils;

pub use config::{EngineConfig, RoundingMode, Settings};
pub use engine::{Command, ContentHost, EngineStatus, PriceEngine, ProcessingContext, RewriteResult};
pub use errors::{Result, RounderError};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Price Rounder tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
