use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ftircore::algorithm::noise::NoiseError;
use ftircore::data::spectrum::{Spectrum, SpectrumError};

use crate::sim::calculator::{CalculatorError, CalculatorRequest, LineByLineCalculator};
use crate::sim::config::{ConfigError, InstrumentConfig, PipelineConfig};

/// Anything that stops a simulation. Calculator failures keep their own messages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Calculator(#[from] CalculatorError),

    #[error("spectrum composition failed: {0}")]
    Composition(#[from] SpectrumError),

    #[error("noise simulation failed: {0}")]
    Noise(#[from] NoiseError),

    #[error("could not start worker pool: {0}")]
    WorkerPool(String),
}

/// What is placed in the gas cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    /// the calculated transmittance of the gas
    Sample,
    /// an empty cell, transmittance 1 everywhere
    Background,
}

/// Runs one measurement through the virtual spectrometer.
///
/// # Description
///
/// Requests the raw transmittance from `calculator` on the grid implied by the configured
/// resolution and zero fill, replaces it by the all-ones curve for a background, composes it with
/// the optical path, adds the noise of `config.scans` averaged scans drawn from `rng` and finally
/// crops to the requested range when `pipeline.crop` is set.
pub fn simulate<C, R>(
    measurement: Measurement,
    config: &InstrumentConfig,
    pipeline: &PipelineConfig,
    calculator: &C,
    rng: &mut R,
) -> Result<Spectrum, SimulationError>
where
    C: LineByLineCalculator + ?Sized,
    R: Rng + ?Sized,
{
    let request = CalculatorRequest::new(config, pipeline);
    info!(
        "simulating {:?} of {} in [{}, {}] cm-1 with {} scans",
        measurement, config.molecule, config.wavenumber_min, config.wavenumber_max, config.scans
    );

    let raw = calculator.calculate(&request)?;
    debug!("calculator returned {}", raw);

    let gas = match measurement {
        Measurement::Sample => raw,
        Measurement::Background => raw.ones_like(),
    };

    let mut measured = config.optical_path(pipeline.normalization).transmit(&gas)?;
    config.noise(pipeline)?.apply_in_place(&mut measured, rng)?;

    if pipeline.crop {
        measured = measured.crop(config.wavenumber_min, config.wavenumber_max)?;
    }
    Ok(measured)
}

pub fn simulate_sample<C, R>(
    config: &InstrumentConfig,
    pipeline: &PipelineConfig,
    calculator: &C,
    rng: &mut R,
) -> Result<Spectrum, SimulationError>
where
    C: LineByLineCalculator + ?Sized,
    R: Rng + ?Sized,
{
    simulate(Measurement::Sample, config, pipeline, calculator, rng)
}

pub fn simulate_background<C, R>(
    config: &InstrumentConfig,
    pipeline: &PipelineConfig,
    calculator: &C,
    rng: &mut R,
) -> Result<Spectrum, SimulationError>
where
    C: LineByLineCalculator + ?Sized,
    R: Rng + ?Sized,
{
    simulate(Measurement::Background, config, pipeline, calculator, rng)
}

/// Simulates independent configurations in parallel.
///
/// Configuration `i` draws its noise from its own generator seeded with `seed + i`, so the
/// output does not depend on `num_threads`. Results come back in input order; one failing
/// configuration does not affect the others.
pub fn simulate_batch<C>(
    measurement: Measurement,
    configs: &[InstrumentConfig],
    pipeline: &PipelineConfig,
    calculator: &C,
    seed: u64,
    num_threads: usize,
) -> Result<Vec<Result<Spectrum, SimulationError>>, SimulationError>
where
    C: LineByLineCalculator + ?Sized,
{
    let thread_pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| SimulationError::WorkerPool(e.to_string()))?;

    info!("simulating {} configurations on {} threads", configs.len(), num_threads);

    let results = thread_pool.install(|| {
        configs
            .par_iter()
            .enumerate()
            .map(|(i, config)| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                simulate(measurement, config, pipeline, calculator, &mut rng)
            })
            .collect()
    });

    Ok(results)
}
