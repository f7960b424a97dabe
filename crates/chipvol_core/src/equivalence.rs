//! Compute-equivalent conversion
//!
//! Unit counts of different accelerators are not comparable directly. They
//! are rescaled to a reference device by the ratio of throughputs, so that
//! e.g. 1000 chips at half an H100's TOPS count as 500 H100-equivalents.

use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::error::LookupError;
use crate::model::{ChipSpecs, SampleDistribution, Variant};

/// Quantities that can be rescaled elementwise
pub trait Scale {
    #[must_use]
    fn scale(&self, factor: f64) -> Self;
}

impl Scale for f64 {
    fn scale(&self, factor: f64) -> Self {
        self * factor
    }
}

impl Scale for Vec<f64> {
    fn scale(&self, factor: f64) -> Self {
        self.iter().map(|v| v * factor).collect()
    }
}

impl Scale for SampleDistribution {
    fn scale(&self, factor: f64) -> Self {
        self.scaled(factor)
    }
}

/// Convert per-variant counts to reference-device equivalents.
///
/// Each entry is multiplied by `spec.tops / reference_tops`. A variant with
/// no entry in `specs` is a configuration bug and fails the whole conversion.
pub fn to_reference_equivalents<T: Scale, H: BuildHasher>(
    counts: &HashMap<Variant, T, H>,
    specs: &ChipSpecs,
    reference_tops: f64,
) -> Result<HashMap<Variant, T>, LookupError> {
    counts
        .iter()
        .map(|(variant, count)| {
            let spec = specs
                .get(variant)
                .ok_or_else(|| LookupError::ChipSpecNotFound(variant.clone()))?;
            Ok((variant.clone(), count.scale(spec.equivalence_ratio(reference_tops))))
        })
        .collect()
}
