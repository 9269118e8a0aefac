use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Enum for the various recoverable failures of series operations.
pub enum SeriesError {
    #[error("unknown {kind} '{value}', valid values are [{expected}]")]
    UnknownOption {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("operation needs a value but the series is empty with no default")]
    FloatingSeries,

    #[error("no measurement at {0}")]
    NoSuchMeasurement(String),

    #[error("invalid boundaries. {0}")]
    InvalidBounds(String),

    #[error("invalid sampling period. {0}")]
    InvalidPeriod(String),
}

impl SeriesError {
    pub(crate) fn unknown_option(
        kind: &'static str,
        value: &str,
        expected: &'static str,
    ) -> Self {
        SeriesError::UnknownOption {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

pub type SeriesResult<T> = Result<T, SeriesError>;
