use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ids::Variant;

/// 8-bit dense TOPS of an H100, the default reference device for compute equivalents
pub const H100_TOPS: f64 = 1979.0;

/// Static per-variant metadata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChipSpec {
    /// Throughput figure used for compute-equivalent conversion (8-bit TOPS)
    pub tops: f64,
}

impl ChipSpec {
    pub fn new(tops: f64) -> Self {
        Self { tops }
    }

    /// Ratio of this chip's throughput to the reference device
    #[must_use]
    pub fn equivalence_ratio(&self, reference_tops: f64) -> f64 {
        self.tops / reference_tops
    }
}

pub type ChipSpecs = HashMap<Variant, ChipSpec>;
