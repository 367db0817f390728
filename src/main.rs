use anyhow::{Context, Result};
use clap::Parser;
use shade_benefit::io::{read_model, read_series, write_result};
use shade_benefit::{ShadeBenefitConfig, ShadeBenefitSimulation};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shade-benefit")]
#[command(about = "Scores shading device faces by cooling avoided and solar gain lost", long_about = None)]
struct Cli {
    /// Model JSON with rooms, apertures, shades and optional context
    model: PathBuf,

    /// Cooling, heating and transmitted solar series JSON
    series: PathBuf,

    /// Where to write the result JSON
    output: PathBuf,

    /// Analysis config JSON (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Log filter from the environment variable `var`, or `info` when unset or invalid.
fn log_filter(var: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(EnvFilter::DEFAULT_ENV))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            ShadeBenefitConfig::from_json(&json)?
        }
        None => ShadeBenefitConfig::default(),
    };

    let model = read_model(&cli.model)?;
    let series = read_series(&cli.series)?;

    let sim = ShadeBenefitSimulation::new(&model.rooms, &model.context, config)?;
    let result = sim.run(&series)?;
    write_result(&cli.output, &result)?;

    println!(
        "{} faces, help {:.1}, harm {:.1}, net {:.1}",
        result.face_count(),
        result.total_help(),
        result.total_harm(),
        result.total_net()
    );
    Ok(())
}
