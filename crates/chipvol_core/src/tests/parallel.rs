//! Tests for the batch-parallel engine
//!
//! The parallel engine must keep the per-trial callback sequence, fill every
//! cell with exactly N samples, and (for samplers that depend only on the
//! trial index) reproduce the sequential engine's output exactly.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::InputError;
use crate::model::{Period, ShareMap, Variant};
use crate::sampling::SalesSampler;
use crate::simulation::{estimate_chip_sales, estimate_chip_sales_parallel};

/// Sampler whose draws depend only on (trial, period, variant)
struct TrialSeededSampler {
    rng: SmallRng,
}

impl TrialSeededSampler {
    fn new() -> Self {
        Self {
            rng: SmallRng::seed_from_u64(0),
        }
    }
}

impl SalesSampler for TrialSeededSampler {
    fn begin_trial(&mut self, trial: usize) {
        self.rng = SmallRng::seed_from_u64(trial as u64);
    }

    fn revenue(&mut self, _period: &Period) -> f64 {
        self.rng.random_range(1.0e9..5.0e9)
    }

    fn shares(&mut self, _period: &Period) -> ShareMap {
        let a: f64 = self.rng.random_range(0.0..1.0);
        ShareMap::from([(Variant::from("A"), a), (Variant::from("B"), 1.0 - a)])
    }

    fn price(&mut self, _period: &Period, _variant: &Variant) -> f64 {
        self.rng.random_range(15_000.0..35_000.0)
    }
}

fn axes() -> (Vec<Period>, Vec<Variant>) {
    (
        vec![Period::from("Q1"), Period::from("Q2"), Period::from("Q3")],
        vec![Variant::from("A"), Variant::from("B"), Variant::from("Unused")],
    )
}

#[test]
fn test_parallel_fills_every_cell() {
    let (periods, variants) = axes();
    let n = 250;

    let estimate =
        estimate_chip_sales_parallel(&periods, &variants, |_| TrialSeededSampler::new(), n)
            .unwrap();

    for (_, variant, samples) in estimate.iter() {
        assert_eq!(samples.len(), n);
        if variant.as_str() == "Unused" {
            assert!(samples.iter().all(|&x| x == 0.0));
        }
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let (periods, variants) = axes();
    let n = 333;

    let mut sampler = TrialSeededSampler::new();
    let sequential = estimate_chip_sales(&periods, &variants, &mut sampler, n).unwrap();
    let parallel =
        estimate_chip_sales_parallel(&periods, &variants, |_| TrialSeededSampler::new(), n)
            .unwrap();

    for (period, variant, samples) in sequential.iter() {
        assert_eq!(parallel.get(period, variant).unwrap(), samples);
    }
}

#[test]
fn test_one_sampler_per_batch() {
    let (periods, variants) = axes();
    let created = AtomicUsize::new(0);

    estimate_chip_sales_parallel(
        &periods,
        &variants,
        |_| {
            created.fetch_add(1, Ordering::SeqCst);
            TrialSeededSampler::new()
        },
        250,
    )
    .unwrap();

    assert_eq!(created.load(Ordering::SeqCst), 3);
}

#[test]
fn test_parallel_rejects_zero_trials() {
    let (periods, variants) = axes();
    let err = estimate_chip_sales_parallel(&periods, &variants, |_| TrialSeededSampler::new(), 0)
        .unwrap_err();
    assert_eq!(err, InputError::ZeroTrials);
}
