//! Report formatting configuration
//!
//! Everything that used to be process-wide state in a ledger session
//! (elision policy, ANSI colouring, the output date format and the
//! amount/total expressions) is carried by [`FormatConfig`] and handed to
//! the renderer explicitly.

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::format::Truncator;

/// Strategy used to shorten text that does not fit its column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElisionStyle {
    /// Drop text from the front, marking the cut with `..`
    TruncateLeading,
    /// Drop text from the middle
    TruncateMiddle,
    /// Drop text from the end
    TruncateTrailing,
    /// Shorten account path segments before falling back to leading cuts
    #[default]
    Abbreviate,
}

impl ElisionStyle {
    /// Parse an option value such as `truncate_leading` or `abbreviate`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "truncate_leading" | "leading" => Some(ElisionStyle::TruncateLeading),
            "truncate_middle" | "middle" => Some(ElisionStyle::TruncateMiddle),
            "truncate_trailing" | "trailing" => Some(ElisionStyle::TruncateTrailing),
            "abbreviate" => Some(ElisionStyle::Abbreviate),
            _ => None,
        }
    }
}

/// Formatting options shared by every element of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// How over-wide fields are shortened
    pub elision_style: ElisionStyle,
    /// Characters kept per abbreviated account segment
    pub abbrev_length: usize,
    /// Colour negative values red when an element asks for highlighting
    pub ansi_codes: bool,
    /// Colour positive values instead of negative ones
    pub ansi_invert: bool,
    /// strftime-style format used by `%D`, `%d` and date values
    pub date_format: String,
    /// Value expression behind `%t`
    pub amount_expr: String,
    /// Value expression behind `%T` and account total comparisons
    pub total_expr: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            elision_style: ElisionStyle::default(),
            abbrev_length: 2,
            ansi_codes: false,
            ansi_invert: false,
            date_format: "%Y/%m/%d".to_string(),
            amount_expr: "amount".to_string(),
            total_expr: "total".to_string(),
        }
    }
}

impl FormatConfig {
    /// Build a configuration from string options, starting from defaults
    ///
    /// Unknown keys are ignored with a warning so that a session can pass
    /// its whole option map through.
    pub fn from_options(options: &HashMap<String, String>) -> ConfigResult<Self> {
        let mut config = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "elision_style" => {
                    config.elision_style =
                        ElisionStyle::parse(value).ok_or_else(|| invalid(key, value))?;
                }
                "abbrev_length" => {
                    config.abbrev_length = value.trim().parse().map_err(|_| invalid(key, value))?;
                }
                "ansi_codes" => config.ansi_codes = parse_flag(key, value)?,
                "ansi_invert" => config.ansi_invert = parse_flag(key, value)?,
                "date_format" => config.date_format = value.clone(),
                "amount_expr" => config.amount_expr = value.clone(),
                "total_expr" => config.total_expr = value.clone(),
                _ => warn!("Ignoring unknown format option '{}'", key),
            }
        }
        Ok(config)
    }

    /// The truncator matching this configuration's elision settings
    pub fn truncator(&self) -> Truncator {
        Truncator::new(self.elision_style, self.abbrev_length)
    }
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue { key: key.to_string(), value: value.to_string() }
}
