use std::path::PathBuf;

use chipvol::{RunOptions, init_logging, run};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chipvol")]
#[command(about = "Monte Carlo estimates of accelerator unit volumes per quarter")]
struct Args {
    /// Scenario file (YAML)
    scenario: PathBuf,

    /// Number of Monte Carlo trials (overrides the scenario)
    #[arg(short = 'n', long)]
    samples: Option<usize>,

    /// RNG seed (overrides the scenario; random when unset)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write per-quarter, per-variant percentiles to this CSV file
    #[arg(long)]
    by_variant_csv: Option<PathBuf>,

    /// Write the per-quarter summary table to this CSV file
    #[arg(long)]
    summary_csv: Option<PathBuf>,

    /// Run trials on a single thread
    #[arg(long)]
    sequential: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level, args.log_file.as_deref())?;

    let options = RunOptions {
        scenario: args.scenario,
        samples: args.samples,
        seed: args.seed,
        by_variant_csv: args.by_variant_csv,
        summary_csv: args.summary_csv,
        sequential: args.sequential,
    };

    let stdout = std::io::stdout();
    run(&options, &mut stdout.lock())?;

    tracing::info!("done");
    Ok(())
}
