//! Error types for the link simulator

use thiserror::Error;

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised while configuring or running the link
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// A link parameter is out of range or inconsistent with the others
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },

    /// The LFSR pair does not yield a usable spreading code set
    #[error("invalid code configuration: {0}")]
    InvalidCodeConfiguration(String),

    /// A power or rate computation would produce NaN or divide by zero
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// A sweep parameter is out of range
    #[error("invalid sweep: {field}: {reason}")]
    InvalidSweep { field: &'static str, reason: String },

    /// A symbol outside 0..=3 reached the spreader
    #[error("symbol {0} has no spreading code")]
    InvalidSymbol(u8),

    /// Buffer size mismatch
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

impl SimError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn sweep(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidSweep {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field for validation errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            SimError::InvalidConfiguration { field, .. }
            | SimError::InvalidSweep { field, .. } => Some(field),
            _ => None,
        }
    }
}
