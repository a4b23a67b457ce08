use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::Result;

pub use crate::rounding::RoundingMode;

const CONFIG_FILE_NAME: &str = "price_rounder.json";
const TMP_SUFFIX: &str = "tmp";

/// Keywords that make a bare numeral count as a price.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "price", "prices", "priced", "save", "saving", "only", "now", "was", "from", "sale", "cost",
    "costs", "total", "subtotal",
];

/// Read-only snapshot of the user's choices for one processing pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "Settings::default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub mode: RoundingMode,
    /// Rewrite multi-field storefront widgets in addition to plain text.
    #[serde(default = "Settings::default_structured_widgets")]
    pub structured_widgets: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            mode: RoundingMode::default(),
            structured_widgets: Self::default_structured_widgets(),
        }
    }
}

impl Settings {
    pub fn default_enabled() -> bool {
        true
    }

    pub fn default_structured_widgets() -> bool {
        true
    }

    pub fn with_mode(mode: RoundingMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// How numerals without an adjacent currency marker are treated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BareNumeralPolicy {
    /// Only numerals next to a currency marker are prices.
    Disabled,
    /// A decimal numeral right after a keyword such as "price" or "only".
    #[default]
    KeywordGated,
    /// Any isolated two to four digit amount, with or without decimals.
    /// Higher recall; will also touch years, counts and stock levels.
    Broad,
}

/// Which currencies may be matched with a whole-unit amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntegerAmountPolicy {
    #[default]
    ZeroDecimalOnly,
    AnyCurrency,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatcherConfig {
    #[serde(default)]
    pub bare_numerals: BareNumeralPolicy,
    #[serde(default = "MatcherConfig::default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub integer_amounts: IntegerAmountPolicy,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            bare_numerals: BareNumeralPolicy::default(),
            keywords: Self::default_keywords(),
            integer_amounts: IntegerAmountPolicy::default(),
        }
    }
}

impl MatcherConfig {
    pub fn default_keywords() -> Vec<String> {
        DEFAULT_KEYWORDS.iter().map(|word| word.to_string()).collect()
    }
}

/// Tuning knobs for the recognition engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default)]
    pub matcher: MatcherConfig,
}

/// Everything persisted to disk: the last settings plus engine tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Handles persistence for [`ConfigFile`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn with_base_dir(base: &Path) -> Result<Self> {
        fs::create_dir_all(base)?;
        Ok(Self::new(base.join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored configuration, or the defaults when none exists yet.
    pub fn load(&self) -> Result<ConfigFile> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(ConfigFile::default())
        }
    }

    pub fn save(&self, config: &ConfigFile) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
