//! Percentile summaries of sample distributions
//!
//! Percentile points are expressed on a 0-100 scale. Values are computed by
//! linear interpolation between order statistics: for point `p` over `n`
//! sorted samples the fractional index is `p / 100 * (n - 1)`, and the result
//! lies between the samples at its floor and ceiling. The interpolation step
//! is evaluated the same way numpy's default `percentile` does, so results
//! match reference outputs bit for bit.
//!
//! A sample containing NaN has no meaningful order, so every percentile of it
//! is NaN.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Percentile points reported when the caller does not ask for others
pub const DEFAULT_PERCENTILES: [f64; 3] = [standard::P5, standard::P50, standard::P95];

/// Standard percentile points
pub mod standard {
    pub const P5: f64 = 5.0;
    pub const P50: f64 = 50.0;
    pub const P95: f64 = 95.0;
}

/// Single percentile of `samples`
pub fn percentile(samples: &[f64], point: f64) -> Result<f64, InputError> {
    let sorted = sorted_samples(samples)?;
    percentile_of_sorted(&sorted, point)
}

/// Several percentiles of `samples` as `(point, value)` pairs, in the order requested
pub fn percentiles(samples: &[f64], points: &[f64]) -> Result<Vec<(f64, f64)>, InputError> {
    let sorted = sorted_samples(samples)?;
    points
        .iter()
        .map(|&p| percentile_of_sorted(&sorted, p).map(|v| (p, v)))
        .collect()
}

fn sorted_samples(samples: &[f64]) -> Result<Vec<f64>, InputError> {
    if samples.is_empty() {
        return Err(InputError::EmptySamples);
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

fn percentile_of_sorted(sorted: &[f64], point: f64) -> Result<f64, InputError> {
    if !(0.0..=100.0).contains(&point) {
        return Err(InputError::InvalidPercentile(point));
    }

    // total_cmp sorts negative NaN first and positive NaN last
    let is_nan = |x: Option<&f64>| x.is_some_and(|x| x.is_nan());
    if is_nan(sorted.first()) || is_nan(sorted.last()) {
        return Ok(f64::NAN);
    }

    let index = point / 100.0 * (sorted.len() - 1) as f64;
    let lo = index.floor() as usize;
    let hi = index.ceil() as usize;
    let t = index - lo as f64;

    Ok(lerp(sorted[lo], sorted[hi], t))
}

/// Interpolate from `a` to `b`, anchoring on whichever end is nearer.
/// Equal ends (including equal infinities) interpolate to themselves.
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    if a == b {
        return a;
    }
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}

/// Standard percentile set (P5, P50, P95)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileSet {
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
}

impl PercentileSet {
    /// Compute P5, P50 and P95 of a non-empty sample
    pub fn from_samples(samples: &[f64]) -> Result<Self, InputError> {
        let sorted = sorted_samples(samples)?;
        let [p5, p50, p95] = DEFAULT_PERCENTILES.map(|p| percentile_of_sorted(&sorted, p));
        Ok(Self {
            p5: p5?,
            p50: p50?,
            p95: p95?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_between_order_statistics() {
        let samples = [4.0, 1.0, 3.0, 2.0];

        // index = 0.5 * 3 = 1.5 -> halfway between 2 and 3
        assert_eq!(percentile(&samples, 50.0).unwrap(), 2.5);
        assert_eq!(percentile(&samples, 0.0).unwrap(), 1.0);
        assert_eq!(percentile(&samples, 100.0).unwrap(), 4.0);
        // index = 0.05 * 3 = 0.15
        assert!((percentile(&samples, 5.0).unwrap() - 1.15).abs() < 1e-12);
    }

    #[test]
    fn test_constant_sequence() {
        let samples = vec![7.5; 101];
        for (_, v) in percentiles(&samples, &[0.0, 5.0, 33.3, 50.0, 95.0, 100.0]).unwrap() {
            assert_eq!(v, 7.5);
        }
    }

    #[test]
    fn test_single_sample() {
        assert_eq!(percentile(&[42.0], 95.0).unwrap(), 42.0);
    }

    #[test]
    fn test_monotonic() {
        let samples: Vec<f64> = (0..500).map(|i| ((i * 7919) % 1000) as f64 / 3.0).collect();
        let set = PercentileSet::from_samples(&samples).unwrap();
        assert!(set.p5 <= set.p50);
        assert!(set.p50 <= set.p95);
    }

    #[test]
    fn test_errors() {
        assert_eq!(percentile(&[], 50.0), Err(InputError::EmptySamples));
        assert_eq!(
            percentile(&[1.0], 101.0),
            Err(InputError::InvalidPercentile(101.0))
        );
        assert!(matches!(
            percentile(&[1.0], f64::NAN),
            Err(InputError::InvalidPercentile(_))
        ));
    }

    #[test]
    fn test_percentiles_keep_requested_order() {
        let samples: Vec<f64> = (1..=11).map(f64::from).collect();
        let values = percentiles(&samples, &[95.0, 5.0]).unwrap();
        assert_eq!(values[0].0, 95.0);
        assert_eq!(values[1].0, 5.0);
        assert!((values[0].1 - 10.5).abs() < 1e-12);
        assert!((values[1].1 - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_nan_sample_yields_nan() {
        let negative_nan = -f64::NAN;
        assert!(percentile(&[1.0, f64::NAN, 3.0], 50.0).unwrap().is_nan());
        assert!(percentile(&[1.0, negative_nan, 3.0], 50.0).unwrap().is_nan());
        assert!(percentile(&[1.0, f64::NAN, 3.0], 0.0).unwrap().is_nan());

        let set = PercentileSet::from_samples(&[2.0, negative_nan, 5.0, 7.0]).unwrap();
        assert!(set.p5.is_nan() && set.p50.is_nan() && set.p95.is_nan());

        for (_, v) in percentiles(&[f64::NAN, 1.0], &[5.0, 95.0]).unwrap() {
            assert!(v.is_nan());
        }
    }

    #[test]
    fn test_infinity_is_ordered() {
        let samples = [1.0, f64::INFINITY, 3.0];
        assert_eq!(percentile(&samples, 100.0).unwrap(), f64::INFINITY);
        assert_eq!(percentile(&samples, 0.0).unwrap(), 1.0);
    }
}
