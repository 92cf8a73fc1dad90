//! Error types shared across the formatting layer

use std::fmt;

use thiserror::Error;

use crate::expr::ExprError;

/// Field widths must stay strictly below this bound
pub const MAX_WIDTH: usize = 4095;

/// Errors raised while compiling a format string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A `%(` or `%[` directive was never closed
    #[error("Missing '{0}'")]
    MissingDelimiter(char),

    /// A min or max width at or above [`MAX_WIDTH`]
    #[error("Field width {0} is too large (must be below {MAX_WIDTH})")]
    WidthTooLarge(usize),
}

/// Result type for format compilation
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised while building a configuration from options
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An option carried a value of the wrong shape
    #[error("Invalid value '{value}' for option '{key}'")]
    InvalidValue {
        /// Option name
        key: String,
        /// Rejected value
        value: String,
    },
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that abort a report pass
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    /// A format string failed to compile
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A value expression failed to parse or evaluate
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// The output sink rejected a write
    #[error("Failed to write report output")]
    Write(#[from] fmt::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;
