//! Engine output types
//!
//! A [`SalesEstimate`] holds one [`SampleDistribution`] per declared
//! (period, variant) cell. Cells are allocated up front, so lookups for a
//! declared pair never fail and every cell ends up with exactly one entry
//! per trial.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::ids::{Period, Variant};
use crate::error::{InputError, LookupError};

/// Empirical distribution of unit counts for one cell, one entry per trial
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleDistribution(Vec<f64>);

impl SampleDistribution {
    pub fn from_vec(samples: Vec<f64>) -> Self {
        Self(samples)
    }

    pub(crate) fn with_capacity(n: usize) -> Self {
        Self(Vec::with_capacity(n))
    }

    pub(crate) fn push(&mut self, value: f64) {
        self.0.push(value);
    }

    pub(crate) fn append(&mut self, other: &mut SampleDistribution) {
        self.0.append(&mut other.0);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Whether the cell carries any volume at all.
    ///
    /// Cells whose samples sum to zero (or less) are reported as placeholders
    /// rather than numeric summaries.
    pub fn has_volume(&self) -> bool {
        self.sum() > 0.0
    }

    /// Elementwise multiply by a constant
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|v| v * factor).collect())
    }

    /// Elementwise add another distribution of the same length
    pub fn add_assign(&mut self, other: &SampleDistribution) -> Result<(), InputError> {
        if self.len() != other.len() {
            return Err(InputError::LengthMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a += b;
        }
        Ok(())
    }
}

impl AsRef<[f64]> for SampleDistribution {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for SampleDistribution {
    fn from(samples: Vec<f64>) -> Self {
        Self(samples)
    }
}

/// Result table: period -> variant -> sample distribution
///
/// Periods and variants keep the order the caller declared them in.
#[derive(Debug, Clone)]
pub struct SalesEstimate {
    periods: Vec<Period>,
    variants: Vec<Variant>,
    /// Period-major: `cells[period_idx][variant_idx]`
    cells: Vec<Vec<SampleDistribution>>,
    period_index: FxHashMap<Period, usize>,
    variant_index: FxHashMap<Variant, usize>,
}

impl SalesEstimate {
    /// Allocate an empty table with room for `capacity` samples per cell
    pub(crate) fn allocate(
        periods: &[Period],
        variants: &[Variant],
        capacity: usize,
    ) -> Result<Self, InputError> {
        let mut period_index = FxHashMap::default();
        for (i, period) in periods.iter().enumerate() {
            if period_index.insert(period.clone(), i).is_some() {
                return Err(InputError::DuplicatePeriod(period.clone()));
            }
        }

        let mut variant_index = FxHashMap::default();
        for (i, variant) in variants.iter().enumerate() {
            if variant_index.insert(variant.clone(), i).is_some() {
                return Err(InputError::DuplicateVariant(variant.clone()));
            }
        }

        let cells = periods
            .iter()
            .map(|_| {
                variants
                    .iter()
                    .map(|_| SampleDistribution::with_capacity(capacity))
                    .collect()
            })
            .collect();

        Ok(Self {
            periods: periods.to_vec(),
            variants: variants.to_vec(),
            cells,
            period_index,
            variant_index,
        })
    }

    /// Empty table over the same periods and variants
    pub(crate) fn empty_like(&self, capacity: usize) -> Self {
        Self {
            periods: self.periods.clone(),
            variants: self.variants.clone(),
            cells: self
                .cells
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|_| SampleDistribution::with_capacity(capacity))
                        .collect()
                })
                .collect(),
            period_index: self.period_index.clone(),
            variant_index: self.variant_index.clone(),
        }
    }

    pub(crate) fn record(&mut self, period_idx: usize, variant_idx: usize, value: f64) {
        self.cells[period_idx][variant_idx].push(value);
    }

    /// Move every cell of `other` onto the end of the matching cell here.
    ///
    /// Both tables must have been allocated from the same period and variant lists.
    pub(crate) fn absorb(&mut self, mut other: SalesEstimate) {
        for (row, other_row) in self.cells.iter_mut().zip(other.cells.iter_mut()) {
            for (cell, other_cell) in row.iter_mut().zip(other_row.iter_mut()) {
                cell.append(other_cell);
            }
        }
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Samples per cell (identical for every cell)
    pub fn n_samples(&self) -> usize {
        self.cells
            .first()
            .and_then(|row| row.first())
            .map(SampleDistribution::len)
            .unwrap_or(0)
    }

    pub fn get(&self, period: &Period, variant: &Variant) -> Option<&SampleDistribution> {
        let p = *self.period_index.get(period)?;
        let v = *self.variant_index.get(variant)?;
        Some(&self.cells[p][v])
    }

    /// Like [`SalesEstimate::get`], but an undeclared pair is a lookup error
    pub fn cell(
        &self,
        period: &Period,
        variant: &Variant,
    ) -> Result<&SampleDistribution, LookupError> {
        self.get(period, variant)
            .ok_or_else(|| LookupError::CellNotFound {
                period: period.clone(),
                variant: variant.clone(),
            })
    }

    /// Every cell as `(period, variant, samples)`, period-major
    pub fn iter(&self) -> impl Iterator<Item = (&Period, &Variant, &SampleDistribution)> {
        self.periods.iter().zip(self.cells.iter()).flat_map(|(period, row)| {
            self.variants
                .iter()
                .zip(row.iter())
                .map(move |(variant, samples)| (period, variant, samples))
        })
    }
}
