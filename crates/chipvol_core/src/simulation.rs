use std::ops::Range;

use crate::error::InputError;
use crate::model::{Period, SalesEstimate, Variant};
use crate::sampling::SalesSampler;

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Run the Monte Carlo estimate of unit volumes.
///
/// Each of the `n_samples` trials walks `periods` in order. Per period the
/// sampler is asked for one revenue draw and one share map, which every
/// variant of that period shares. Each variant with a positive share then
/// gets its own price draw and records `revenue * share / price`. Variants
/// with no share (absent from the map, or not positive) record 0 without a
/// price call. Share-map entries for undeclared variants are ignored.
///
/// Non-positive prices or negative revenue are not guarded against; the
/// resulting infinities, NaNs or negative counts are recorded as-is.
///
/// Every declared (period, variant) cell of the result holds exactly
/// `n_samples` values.
pub fn estimate_chip_sales<S: SalesSampler + ?Sized>(
    periods: &[Period],
    variants: &[Variant],
    sampler: &mut S,
    n_samples: usize,
) -> Result<SalesEstimate, InputError> {
    if n_samples == 0 {
        return Err(InputError::ZeroTrials);
    }
    let mut estimate = SalesEstimate::allocate(periods, variants, n_samples)?;

    tracing::debug!(
        periods = periods.len(),
        variants = variants.len(),
        n_samples,
        "starting chip sales estimate"
    );

    run_trials(&mut estimate, periods, variants, sampler, 0..n_samples);

    tracing::debug!("chip sales estimate complete");
    Ok(estimate)
}

/// Parallel form of [`estimate_chip_sales`].
///
/// Trials are split into batches of up to 100. Each batch asks `make_sampler`
/// for its own sampler (passing the batch index, so seeded samplers can
/// derive independent streams), runs its trials sequentially into a private
/// buffer, and the buffers are concatenated in batch order afterward. Within
/// a trial the callback sequence is identical to the sequential engine.
///
/// `make_sampler` is shared between worker threads and so must be `Sync`;
/// each sampler it returns is used by a single thread.
#[cfg(feature = "parallel")]
pub fn estimate_chip_sales_parallel<F, S>(
    periods: &[Period],
    variants: &[Variant],
    make_sampler: F,
    n_samples: usize,
) -> Result<SalesEstimate, InputError>
where
    F: Fn(usize) -> S + Sync,
    S: SalesSampler,
{
    const MAX_BATCH_SIZE: usize = 100;

    if n_samples == 0 {
        return Err(InputError::ZeroTrials);
    }
    let mut estimate = SalesEstimate::allocate(periods, variants, n_samples)?;
    let num_batches = n_samples.div_ceil(MAX_BATCH_SIZE);

    tracing::debug!(
        periods = periods.len(),
        variants = variants.len(),
        n_samples,
        num_batches,
        "starting parallel chip sales estimate"
    );

    let template = estimate.empty_like(0);
    let batches: Vec<SalesEstimate> = (0..num_batches)
        .into_par_iter()
        .map(|i| {
            let start = i * MAX_BATCH_SIZE;
            let end = (start + MAX_BATCH_SIZE).min(n_samples);

            let mut sampler = make_sampler(i);
            let mut batch = template.empty_like(end - start);
            run_trials(&mut batch, periods, variants, &mut sampler, start..end);
            batch
        })
        .collect();

    for batch in batches {
        estimate.absorb(batch);
    }

    tracing::debug!("parallel chip sales estimate complete");
    Ok(estimate)
}

fn run_trials<S: SalesSampler + ?Sized>(
    estimate: &mut SalesEstimate,
    periods: &[Period],
    variants: &[Variant],
    sampler: &mut S,
    trials: Range<usize>,
) {
    for trial in trials {
        sampler.begin_trial(trial);

        for (period_idx, period) in periods.iter().enumerate() {
            let revenue = sampler.revenue(period);
            let shares = sampler.shares(period);

            for (variant_idx, variant) in variants.iter().enumerate() {
                let share = shares.get(variant).copied().unwrap_or(0.0);
                let units = if share > 0.0 {
                    let price = sampler.price(period, variant);
                    (revenue * share) / price
                } else {
                    0.0
                };
                estimate.record(period_idx, variant_idx, units);
            }
        }
    }
}
