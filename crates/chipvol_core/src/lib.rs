//! Accelerator unit-volume estimation library
//!
//! This crate provides a Monte Carlo engine for estimating how many units of
//! each accelerator variant a vendor sold per period, given uncertain revenue,
//! market share and price. The three inputs are supplied as sampling
//! callbacks; the engine turns them into one sample distribution per
//! (period, variant) cell.
//!
//! Around the engine sit small helpers:
//! - share normalization (raw weights -> fractions summing to 1)
//! - percentile summaries with linear interpolation
//! - compute-equivalent conversion against a reference device
//! - per-period, total and cumulative summaries for reporting
//!
//! ```ignore
//! use chipvol_core::{FnSampler, Period, ShareMap, Variant, estimate_chip_sales};
//!
//! let periods = vec![Period::from("Q1")];
//! let variants = vec![Variant::from("A"), Variant::from("B")];
//! let mut sampler = FnSampler::new(
//!     |_| 1000.0,
//!     |_| ShareMap::from([(Variant::from("A"), 0.6), (Variant::from("B"), 0.4)]),
//!     |_, v| if v.as_str() == "A" { 10.0 } else { 20.0 },
//! );
//! let estimate = estimate_chip_sales(&periods, &variants, &mut sampler, 1)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod equivalence;
pub mod error;
pub mod normalize;
pub mod sampling;
pub mod simulation;
pub mod stats;
pub mod summary;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use equivalence::{Scale, to_reference_equivalents};
pub use error::{EstimateError, InputError, LookupError};
pub use model::{
    ChipSpec, ChipSpecs, H100_TOPS, Period, SalesEstimate, SampleDistribution, ShareMap, Variant,
};
pub use normalize::normalize_shares;
pub use sampling::{FnSampler, SalesSampler};
pub use simulation::estimate_chip_sales;
#[cfg(feature = "parallel")]
pub use simulation::estimate_chip_sales_parallel;
pub use stats::{DEFAULT_PERCENTILES, PercentileSet, percentile, percentiles};
