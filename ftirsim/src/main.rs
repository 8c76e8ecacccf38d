use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::Serialize;

use ftircore::algorithm::peaks::PeakExtractor;
use ftirsim::sim::calculator::{RawSpectrumRecord, TabulatedCalculator};
use ftirsim::sim::config::{validate, PipelineConfig, SimulationRequest};
use ftirsim::sim::io::{FailureResponse, PeaksInput, PeaksResponse, SpectrumResponse};
use ftirsim::sim::pipeline::{simulate, Measurement};

#[derive(Parser)]
#[command(name = "ftirsim")]
#[command(version, about = "Virtual FTIR spectrometer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the measured spectrum of a gas sample
    Sample(SimulationArgs),

    /// Simulate the measured spectrum of an empty cell
    Background(SimulationArgs),

    /// Find emission peaks in an absorbance spectrum
    Peaks {
        /// JSON file with parallel "x" and "y" arrays
        #[arg(short, long)]
        input: PathBuf,

        /// Minimum peak height
        #[arg(short, long)]
        threshold: f64,

        /// Lowest reported wavenumber
        #[arg(long, requires = "upper")]
        lower: Option<f64>,

        /// Highest reported wavenumber
        #[arg(long, requires = "lower")]
        upper: Option<f64>,

        /// Detection limit in units of the estimated noise level
        #[arg(long, default_value = "1.0")]
        noise_factor: f64,
    },
}

#[derive(Args)]
struct SimulationArgs {
    /// JSON request with the instrument and sample parameters
    #[arg(short, long)]
    request: PathBuf,

    /// JSON file with the tabulated raw transmittance {molecule, x, y}
    #[arg(long)]
    raw: PathBuf,

    /// JSON file overriding the pipeline defaults
    #[arg(short, long)]
    pipeline: Option<PathBuf>,

    /// Seed of the noise generator, random if absent
    #[arg(short, long)]
    seed: Option<u64>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("could not parse {}", path.display()))
}

fn emit<T: Serialize>(response: &T) -> Result<()> {
    println!("{}", serde_json::to_string(response)?);
    Ok(())
}

fn fail(text: impl Into<String>) -> Result<ExitCode> {
    let failure = FailureResponse::new(text);
    error!("{}", failure.text);
    emit(&failure)?;
    Ok(ExitCode::FAILURE)
}

fn cmd_simulate(measurement: Measurement, args: SimulationArgs) -> Result<ExitCode> {
    let request: SimulationRequest = read_json(&args.request)?;
    let record: RawSpectrumRecord = read_json(&args.raw)?;
    let pipeline: PipelineConfig = match &args.pipeline {
        Some(path) => read_json(path)?,
        None => PipelineConfig::default(),
    };

    let config = match validate(request) {
        Ok(config) => config,
        Err(e) => return fail(e.to_string()),
    };
    let calculator = TabulatedCalculator::from_record(record).context("invalid raw spectrum")?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match simulate(measurement, &config, &pipeline, &calculator, &mut rng) {
        Ok(spectrum) => {
            info!("simulated {}", spectrum);
            emit(&SpectrumResponse::from(&spectrum))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => fail(e.to_string()),
    }
}

fn cmd_peaks(
    input: PathBuf,
    threshold: f64,
    bounds: Option<(f64, f64)>,
    noise_factor: f64,
) -> Result<ExitCode> {
    let data: PeaksInput = read_json(&input)?;

    let mut extractor = PeakExtractor::new().with_noise_factor(noise_factor);
    if let Some((lower, upper)) = bounds {
        extractor = extractor.with_bounds(lower, upper);
    }

    match extractor.extract(&data.x, &data.y, threshold) {
        Ok(peaks) => {
            info!("found {} peaks above {}", peaks.len(), threshold);
            emit(&PeaksResponse::from(&peaks))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => fail(format!("peak detection failed: {}", e)),
    }
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sample(args) => cmd_simulate(Measurement::Sample, args),
        Commands::Background(args) => cmd_simulate(Measurement::Background, args),
        Commands::Peaks { input, threshold, lower, upper, noise_factor } => {
            cmd_peaks(input, threshold, lower.zip(upper), noise_factor)
        }
    }
}
