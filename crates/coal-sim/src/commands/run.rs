use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use coal_mcmc::SamplerConfig;
use coal_model::{SwitchpointModel, SwitchpointPosterior};

use crate::data;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// CSV file with a header and `year,count` rows.
    #[arg(long)]
    pub data: PathBuf,
    /// Optional YAML sampler configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// First year of the range; defaults to the earliest year in the data.
    #[arg(long)]
    pub start: Option<i64>,
    /// Last year of the range, inclusive; defaults to the latest year.
    #[arg(long)]
    pub end: Option<i64>,
    /// Master seed overriding the configuration.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Number of iterations overriding the configuration.
    #[arg(long)]
    pub samples: Option<usize>,
    /// Number of independent chains overriding the configuration.
    #[arg(long)]
    pub chains: Option<usize>,
    /// Print the posterior summary as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(args)?;
    let data = data::load_counts(&args.data, args.start, args.end)?;
    let model = SwitchpointModel::new(&data)?;
    let posterior = model.run(&config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &posterior)?;
        writeln!(out)?;
    } else {
        write_report(&mut out, &posterior)?;
    }
    Ok(())
}

fn resolve_config(args: &RunArgs) -> Result<SamplerConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => SamplerConfig::load(path)?,
        None => SamplerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed_policy.master_seed = seed;
    }
    if let Some(samples) = args.samples {
        config.num_samples = samples;
    }
    if let Some(chains) = args.chains {
        config.chains = chains;
    }
    config.validate()?;
    Ok(config)
}

fn write_report(out: &mut impl Write, posterior: &SwitchpointPosterior) -> io::Result<()> {
    writeln!(out, "Switch year found: {}", posterior.switch_year)?;
    writeln!(out, "Early rate mean: {:.4}", posterior.early_rate_mean)?;
    writeln!(out, "Late rate mean: {:.4}", posterior.late_rate_mean)?;
    writeln!(
        out,
        "Retained samples: {} of {} iterations x {} chain(s)",
        posterior.summary.retained, posterior.summary.iterations, posterior.summary.chains
    )
}
