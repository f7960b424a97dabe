//! Summaries and export rows derived from a [`SalesEstimate`]
//!
//! Everything here is reporting: percentiles of the raw cell distributions,
//! their compute-equivalent transforms, period totals and cumulative totals.
//! Totals are always taken by summing the sample arrays elementwise first and
//! computing percentiles of the sum afterward. Summing per-variant
//! percentiles would give a different (and wrong) answer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{InputError, LookupError, Result};
use crate::model::{ChipSpecs, Period, SalesEstimate, SampleDistribution, Variant};
use crate::stats::{DEFAULT_PERCENTILES, PercentileSet, percentiles};

/// Placeholder shown for cells with no volume
pub const EMPTY_CELL: &str = "-";

/// Percentiles of `samples` keyed `p{point}`, truncated toward zero.
///
/// A NaN or infinite percentile is an error rather than a count.
pub fn samples_to_percentile_dict(
    samples: &[f64],
    points: &[f64],
) -> std::result::Result<Vec<(String, i64)>, InputError> {
    percentiles(samples, points)?
        .into_iter()
        .map(|(p, v)| Ok((percentile_label(p), whole_count(p, v)?)))
        .collect()
}

/// [`samples_to_percentile_dict`] at [`DEFAULT_PERCENTILES`]
pub fn samples_to_default_percentile_dict(
    samples: &[f64],
) -> std::result::Result<Vec<(String, i64)>, InputError> {
    samples_to_percentile_dict(samples, &DEFAULT_PERCENTILES)
}

/// Truncate a percentile toward zero. Finite values beyond the `i64` range
/// saturate.
fn whole_count(point: f64, value: f64) -> std::result::Result<i64, InputError> {
    if value.is_finite() {
        Ok(value as i64)
    } else {
        Err(InputError::NonFiniteCount { point, value })
    }
}

fn percentile_label(point: f64) -> String {
    if point.fract() == 0.0 {
        format!("p{}", point as i64)
    } else {
        format!("p{point}")
    }
}

/// Format a count as whole thousands, e.g. `12_400.0` -> `"12k"`.
///
/// Halves round to the nearest even thousand. NaN and infinities are shown
/// as-is (`"NaN"`, `"inf"`).
pub fn format_thousands(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    format!("{}k", (n / 1000.0).round_ties_even() as i64)
}

/// "median (p5-p95)"
fn format_interval(set: &PercentileSet, format_fn: &dyn Fn(f64) -> String) -> String {
    format!(
        "{} ({}-{})",
        format_fn(set.p50),
        format_fn(set.p5),
        format_fn(set.p95)
    )
}

/// One exported (period, variant) row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantExportRow {
    pub period: Period,
    pub variant: Variant,
    pub chips_p5: i64,
    pub chips_p50: i64,
    pub chips_p95: i64,
    /// Compute-equivalent percentiles
    pub equiv_p5: i64,
    pub equiv_p50: i64,
    pub equiv_p95: i64,
}

/// Per-(period, variant) percentile rows for unit counts and compute equivalents.
///
/// Variants are visited in the order given. Cells without volume are
/// skipped. A variant absent from the estimate or from `specs` is an error.
pub fn export_rows_by_variant(
    estimate: &SalesEstimate,
    variants: &[Variant],
    specs: &ChipSpecs,
    reference_tops: f64,
) -> Result<Vec<VariantExportRow>> {
    let mut rows = Vec::new();

    for period in estimate.periods() {
        for variant in variants {
            let samples = estimate.cell(period, variant)?;
            if !samples.has_volume() {
                continue;
            }

            let spec = specs
                .get(variant)
                .ok_or_else(|| LookupError::ChipSpecNotFound(variant.clone()))?;
            let equivalents = samples.scaled(spec.equivalence_ratio(reference_tops));

            let chips = PercentileSet::from_samples(samples.as_slice())?;
            let equiv = PercentileSet::from_samples(equivalents.as_slice())?;

            rows.push(VariantExportRow {
                period: period.clone(),
                variant: variant.clone(),
                chips_p5: whole_count(5.0, chips.p5)?,
                chips_p50: whole_count(50.0, chips.p50)?,
                chips_p95: whole_count(95.0, chips.p95)?,
                equiv_p5: whole_count(5.0, equiv.p5)?,
                equiv_p50: whole_count(50.0, equiv.p50)?,
                equiv_p95: whole_count(95.0, equiv.p95)?,
            });
        }
    }

    Ok(rows)
}

/// One row of the per-period summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummaryRow {
    pub period: Period,
    /// One formatted cell per variant, in estimate order. [`EMPTY_CELL`] when
    /// the variant has no volume in this period.
    pub cells: Vec<(Variant, String)>,
    /// Summary of the elementwise sum over all variants
    pub total: String,
}

/// Per-period "median (p5-p95)" table with a Total column.
pub fn summarize_by_variant(
    estimate: &SalesEstimate,
    format_fn: &dyn Fn(f64) -> String,
) -> Result<Vec<PeriodSummaryRow>> {
    let n_samples = estimate.n_samples();
    let mut rows = Vec::with_capacity(estimate.periods().len());

    for period in estimate.periods() {
        let mut total = SampleDistribution::from_vec(vec![0.0; n_samples]);
        let mut cells = Vec::with_capacity(estimate.variants().len());

        for variant in estimate.variants() {
            let samples = estimate.cell(period, variant)?;
            total.add_assign(samples)?;

            let cell = if samples.has_volume() {
                format_interval(&PercentileSet::from_samples(samples.as_slice())?, format_fn)
            } else {
                EMPTY_CELL.to_string()
            };
            cells.push((variant.clone(), cell));
        }

        let total = format_interval(&PercentileSet::from_samples(total.as_slice())?, format_fn);
        rows.push(PeriodSummaryRow {
            period: period.clone(),
            cells,
            total,
        });
    }

    Ok(rows)
}

/// Sum each variant's samples across `periods`, elementwise.
///
/// Every variant of the estimate gets an entry, zero-filled when `periods`
/// is empty.
pub fn cumulative_by_variant(
    estimate: &SalesEstimate,
    periods: &[Period],
) -> Result<HashMap<Variant, SampleDistribution>> {
    let n_samples = estimate.n_samples();
    let mut cumulative = HashMap::with_capacity(estimate.variants().len());

    for variant in estimate.variants() {
        let mut sum = SampleDistribution::from_vec(vec![0.0; n_samples]);
        for period in periods {
            sum.add_assign(estimate.cell(period, variant)?)?;
        }
        cumulative.insert(variant.clone(), sum);
    }

    Ok(cumulative)
}

/// Percentile summary of cumulative volumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeSummary {
    /// Variants with volume, in the requested order
    pub rows: Vec<(Variant, PercentileSet)>,
    /// Percentiles of the elementwise sum of the listed variants; `None` when
    /// no variant had volume
    pub total: Option<PercentileSet>,
}

/// Summarize cumulative arrays for `variant_order`, skipping variants without volume.
pub fn summarize_cumulative(
    cumulative: &HashMap<Variant, SampleDistribution>,
    variant_order: &[Variant],
) -> Result<CumulativeSummary> {
    let mut rows = Vec::new();
    let mut grand_total: Option<SampleDistribution> = None;

    for variant in variant_order {
        let samples = cumulative
            .get(variant)
            .ok_or_else(|| LookupError::VariantNotFound(variant.clone()))?;
        if !samples.has_volume() {
            continue;
        }

        match grand_total.as_mut() {
            Some(total) => total.add_assign(samples)?,
            None => grand_total = Some(samples.clone()),
        }
        rows.push((
            variant.clone(),
            PercentileSet::from_samples(samples.as_slice())?,
        ));
    }

    let total = grand_total
        .map(|total| PercentileSet::from_samples(total.as_slice()))
        .transpose()?;

    Ok(CumulativeSummary { rows, total })
}
