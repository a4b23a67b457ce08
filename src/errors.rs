use thiserror::Error;

/// Error type that captures price recognition and restore failures.
///
/// None of these are fatal to a pass: the engine logs them and leaves the
/// affected price untouched.
#[derive(Debug, Error)]
pub enum RounderError {
    #[error("Invalid numeral: {0}")]
    InvalidNumeral(String),
    #[error("Unknown currency token: {0}")]
    UnknownCurrencyToken(String),
    #[error("Stale container: {0}")]
    StaleContainer(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RounderError>;
