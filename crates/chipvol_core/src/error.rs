use std::fmt;

use crate::model::{Period, Variant};

/// Errors caused by malformed caller-supplied data
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// Share weights summed to zero (or the map was empty)
    AllZeroWeights,
    /// A share weight was negative or not finite
    InvalidWeight { variant: Variant, weight: f64 },
    /// Share weights are individually finite but their sum is not
    WeightTotalOverflow,
    /// Percentile requested on an empty sample sequence
    EmptySamples,
    /// Percentile point outside [0, 100]
    InvalidPercentile(f64),
    /// A percentile is NaN or infinite and has no whole-unit count
    NonFiniteCount { point: f64, value: f64 },
    /// Simulation requested with zero trials
    ZeroTrials,
    DuplicatePeriod(Period),
    DuplicateVariant(Variant),
    /// Sample arrays of different lengths passed to an elementwise operation
    LengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::AllZeroWeights => write!(f, "share weights sum to zero"),
            InputError::InvalidWeight { variant, weight } => {
                write!(f, "invalid share weight {weight} for variant {variant}")
            }
            InputError::WeightTotalOverflow => {
                write!(f, "share weights overflow when summed")
            }
            InputError::EmptySamples => write!(f, "cannot take percentiles of an empty sample"),
            InputError::InvalidPercentile(p) => {
                write!(f, "percentile {p} is outside the range [0, 100]")
            }
            InputError::NonFiniteCount { point, value } => {
                write!(f, "percentile p{point} is {value}, not a finite count")
            }
            InputError::ZeroTrials => write!(f, "trial count must be at least 1"),
            InputError::DuplicatePeriod(period) => write!(f, "period {period} declared twice"),
            InputError::DuplicateVariant(variant) => {
                write!(f, "variant {variant} declared twice")
            }
            InputError::LengthMismatch { expected, actual } => {
                write!(f, "sample length mismatch (expected {expected}, got {actual})")
            }
        }
    }
}

impl std::error::Error for InputError {}

/// Errors related to lookups across companion maps
#[derive(Debug, Clone, PartialEq)]
pub enum LookupError {
    ChipSpecNotFound(Variant),
    VariantNotFound(Variant),
    CellNotFound { period: Period, variant: Variant },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::ChipSpecNotFound(variant) => {
                write!(f, "no chip spec for variant {variant}")
            }
            LookupError::VariantNotFound(variant) => write!(f, "no samples for variant {variant}"),
            LookupError::CellNotFound { period, variant } => {
                write!(f, "no samples for variant {variant} in period {period}")
            }
        }
    }
}

impl std::error::Error for LookupError {}

/// Any error surfaced by the summary and export layer
#[derive(Debug, Clone, PartialEq)]
pub enum EstimateError {
    Input(InputError),
    Lookup(LookupError),
}

impl fmt::Display for EstimateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimateError::Input(e) => write!(f, "{e}"),
            EstimateError::Lookup(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EstimateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EstimateError::Input(e) => Some(e),
            EstimateError::Lookup(e) => Some(e),
        }
    }
}

impl From<InputError> for EstimateError {
    fn from(err: InputError) -> Self {
        EstimateError::Input(err)
    }
}

impl From<LookupError> for EstimateError {
    fn from(err: LookupError) -> Self {
        EstimateError::Lookup(err)
    }
}

pub type Result<T> = std::result::Result<T, EstimateError>;
