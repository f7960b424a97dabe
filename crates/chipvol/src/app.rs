//! End-to-end run: scenario -> estimate -> reports

use std::io::Write;
use std::path::PathBuf;

use chipvol_core::summary::{
    cumulative_by_variant, export_rows_by_variant, format_thousands, summarize_by_variant,
    summarize_cumulative,
};
use chipvol_core::{Period, SalesEstimate, Variant, to_reference_equivalents};

use crate::report::{
    render_cumulative, render_period_table, write_by_variant_csv, write_summary_csv,
};
use crate::sampler::{CompiledScenario, ScenarioSampler};
use crate::scenario::Scenario;

/// Trial count used when neither the command line nor the scenario sets one
pub const DEFAULT_SAMPLES: usize = 5000;

/// Options for one run, as given on the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub scenario: PathBuf,
    pub samples: Option<usize>,
    pub seed: Option<u64>,
    pub by_variant_csv: Option<PathBuf>,
    pub summary_csv: Option<PathBuf>,
    pub sequential: bool,
}

/// Effective settings after layering command line, scenario and defaults
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub samples: usize,
    pub seed: u64,
    pub reference_tops: f64,
    pub parallel: bool,
}

impl Settings {
    pub fn resolve(options: &RunOptions, scenario: &Scenario) -> Self {
        let seed = options
            .seed
            .or(scenario.seed)
            .unwrap_or_else(rand::random::<u64>);

        Self {
            samples: options.samples.or(scenario.samples).unwrap_or(DEFAULT_SAMPLES),
            seed,
            reference_tops: scenario.reference_tops(),
            parallel: cfg!(feature = "parallel") && !options.sequential,
        }
    }
}

/// Run the engine over a validated scenario
pub fn estimate(scenario: &Scenario, settings: &Settings) -> color_eyre::Result<SalesEstimate> {
    let model = CompiledScenario::new(scenario)?;
    let periods = scenario.period_ids();
    let variants = scenario.variant_ids();

    tracing::info!(
        samples = settings.samples,
        seed = settings.seed,
        parallel = settings.parallel,
        "running estimate"
    );

    let estimate = run_engine(&model, &periods, &variants, settings)?;

    let dropped = model.dropped_share_draws();
    if dropped > 0 {
        tracing::warn!(
            dropped,
            "share draws could not be normalized and were recorded as zero volume"
        );
    }
    Ok(estimate)
}

fn run_engine(
    model: &CompiledScenario,
    periods: &[Period],
    variants: &[Variant],
    settings: &Settings,
) -> color_eyre::Result<SalesEstimate> {
    #[cfg(feature = "parallel")]
    if settings.parallel {
        let estimate = chipvol_core::estimate_chip_sales_parallel(
            periods,
            variants,
            |batch| ScenarioSampler::for_batch(model, settings.seed, batch),
            settings.samples,
        )?;
        return Ok(estimate);
    }

    let mut sampler = ScenarioSampler::new(model, settings.seed);
    let estimate =
        chipvol_core::estimate_chip_sales(periods, variants, &mut sampler, settings.samples)?;
    Ok(estimate)
}

/// Load the scenario, estimate, print the summaries to `out` and write any
/// requested CSV exports.
pub fn run(options: &RunOptions, out: &mut impl Write) -> color_eyre::Result<()> {
    let scenario = Scenario::load(&options.scenario)?;
    let settings = Settings::resolve(options, &scenario);
    let estimate = estimate(&scenario, &settings)?;

    let variants = scenario.variant_ids();
    let specs = scenario.chip_specs();

    let rows = summarize_by_variant(&estimate, &format_thousands)?;
    writeln!(
        out,
        "{} ({} samples, seed {})",
        scenario.name, settings.samples, settings.seed
    )?;
    writeln!(out)?;
    write!(out, "{}", render_period_table(&rows))?;

    let cumulative = cumulative_by_variant(&estimate, estimate.periods())?;
    let equivalents = to_reference_equivalents(&cumulative, &specs, settings.reference_tops)?;
    let units_summary = summarize_cumulative(&cumulative, &variants)?;
    let equiv_summary = summarize_cumulative(&equivalents, &variants)?;
    writeln!(out)?;
    writeln!(out, "Cumulative over {} periods", estimate.periods().len())?;
    write!(out, "{}", render_cumulative(&units_summary, &equiv_summary))?;

    if let Some(path) = &options.by_variant_csv {
        let export =
            export_rows_by_variant(&estimate, &variants, &specs, settings.reference_tops)?;
        write_by_variant_csv(path, &export, &scenario)?;
    }
    if let Some(path) = &options.summary_csv {
        write_summary_csv(path, &rows)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::tests::example;

    #[test]
    fn test_settings_layering() {
        let scenario = example();

        let defaults = Settings::resolve(&RunOptions::default(), &scenario);
        assert_eq!(defaults.samples, 200);
        assert_eq!(defaults.seed, 9);
        assert_eq!(defaults.reference_tops, chipvol_core::H100_TOPS);

        let options = RunOptions {
            samples: Some(10),
            seed: Some(1),
            sequential: true,
            ..RunOptions::default()
        };
        let overridden = Settings::resolve(&options, &scenario);
        assert_eq!(overridden.samples, 10);
        assert_eq!(overridden.seed, 1);
        assert!(!overridden.parallel);

        let mut bare = example();
        bare.samples = None;
        assert_eq!(
            Settings::resolve(&RunOptions::default(), &bare).samples,
            DEFAULT_SAMPLES
        );
    }

    #[test]
    fn test_estimate_is_reproducible_for_a_seed() {
        let scenario = example();
        let settings = Settings::resolve(&RunOptions::default(), &scenario);

        let first = estimate(&scenario, &settings).unwrap();
        let second = estimate(&scenario, &settings).unwrap();
        let q2 = Period::from("Q2_FY24");
        let h100 = Variant::from("H100");
        assert_eq!(first.get(&q2, &h100), second.get(&q2, &h100));
        assert_eq!(first.n_samples(), 200);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_adjacent_seeds_give_unrelated_parallel_runs() {
        let scenario = example();
        let settings = |seed| Settings {
            samples: 1000,
            seed,
            reference_tops: chipvol_core::H100_TOPS,
            parallel: true,
        };

        let first = estimate(&scenario, &settings(42)).unwrap();
        let second = estimate(&scenario, &settings(43)).unwrap();
        let q2 = Period::from("Q2_FY24");
        let h100 = Variant::from("H100");
        let a = first.get(&q2, &h100).unwrap().as_slice();
        let b = second.get(&q2, &h100).unwrap().as_slice();

        // No batch of one run reappears in the other, shifted or not
        let shared = a.iter().filter(|x| b.contains(*x)).count();
        assert_eq!(shared, 0);
        assert_ne!(&a[100..], &b[..900]);
    }

    #[test]
    fn test_run_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let scenario_path = dir.path().join("scenario.yaml");
        std::fs::write(&scenario_path, example().to_yaml().unwrap()).unwrap();

        let options = RunOptions {
            scenario: scenario_path,
            samples: Some(150),
            seed: Some(4),
            by_variant_csv: Some(dir.path().join("by_variant.csv")),
            summary_csv: Some(dir.path().join("summary.csv")),
            sequential: false,
        };
        let mut out = Vec::new();
        run(&options, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Test scenario (150 samples, seed 4)"));
        assert!(printed.contains("Q1_FY24"));
        assert!(printed.contains("Cumulative over 2 periods"));

        // A100: 1e9 * 0.75 / 10_000 in Q1, no share in Q2
        let by_variant = std::fs::read_to_string(dir.path().join("by_variant.csv")).unwrap();
        let lines: Vec<&str> = by_variant.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("Q1_FY24,2023-01-30,2023-04-30,A100,75000,75000,75000,"));
        assert!(lines.iter().all(|l| !l.starts_with("Q2_FY24,,,A100")));

        let summary = std::fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        assert!(summary.starts_with("quarter,A100,H100,total\n"));
        assert!(summary.contains("Q2_FY24,-,"));
    }
}
