use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::RounderError;

/// Granularity a price is rounded up to.
///
/// `Nearest` is a round-up policy too: it goes to the next whole unit and
/// never down.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    #[default]
    Nearest,
    Multiple5,
    Multiple10,
}

impl RoundingMode {
    pub const ALL: [RoundingMode; 3] = [
        RoundingMode::Nearest,
        RoundingMode::Multiple5,
        RoundingMode::Multiple10,
    ];

    /// Returns the step every rounded value is a multiple of.
    pub fn granularity(self) -> Decimal {
        match self {
            RoundingMode::Nearest => Decimal::ONE,
            RoundingMode::Multiple5 => Decimal::from(5),
            RoundingMode::Multiple10 => Decimal::TEN,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoundingMode::Nearest => "nearest",
            RoundingMode::Multiple5 => "multiple5",
            RoundingMode::Multiple10 => "multiple10",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundingMode {
    type Err = RounderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(RoundingMode::Nearest),
            "multiple5" => Ok(RoundingMode::Multiple5),
            "multiple10" => Ok(RoundingMode::Multiple10),
            other => Err(RounderError::Config(format!(
                "unknown rounding mode `{}`",
                other
            ))),
        }
    }
}

/// Rounds `magnitude` up to the next multiple of the mode's granularity.
///
/// Values already on a multiple are returned unchanged. Negative inputs are
/// clamped to zero; the matcher never captures a sign.
pub fn apply(magnitude: Decimal, mode: RoundingMode) -> Decimal {
    let magnitude = magnitude.max(Decimal::ZERO);
    let step = mode.granularity();
    let rounded = (magnitude / step).ceil() * step;
    rounded.normalize()
}

/// Returns true when `magnitude` is already on the mode's grid.
pub fn is_rounded(magnitude: Decimal, mode: RoundingMode) -> bool {
    (magnitude % mode.granularity()).is_zero()
}
