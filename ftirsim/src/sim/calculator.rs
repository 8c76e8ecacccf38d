use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ftircore::data::spectrum::{Spectrum, SpectrumError};

use crate::sim::config::{InstrumentConfig, PipelineConfig};

/// Failures reported by a line-by-line calculator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalculatorError {
    #[error("No line in the specified wavenumber range")]
    EmptyRange,

    #[error("HITRAN data does not exist for requested molecule.")]
    LookupFailure { molecule: String },

    #[error("{0}")]
    Other(String),
}

/// Parameters of one line-by-line calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculatorRequest {
    pub wavenumber_min: f64,
    pub wavenumber_max: f64,
    pub molecule: String,
    pub isotopes: String,
    /// bar
    pub pressure: f64,
    pub mole_fraction: f64,
    /// K
    pub temperature: f64,
    /// cm
    pub path_length: f64,
    pub wavenumber_step: f64,
    pub databank: String,
}

impl CalculatorRequest {
    pub fn new(config: &InstrumentConfig, pipeline: &PipelineConfig) -> Self {
        CalculatorRequest {
            wavenumber_min: config.wavenumber_min,
            wavenumber_max: config.wavenumber_max,
            molecule: config.molecule.clone(),
            isotopes: pipeline.isotopes.clone(),
            pressure: config.pressure,
            mole_fraction: config.mole_fraction,
            temperature: config.gas_cell.temperature,
            path_length: config.gas_cell.path_length,
            wavenumber_step: config.wavenumber_step(),
            databank: pipeline.databank.clone(),
        }
    }
}

/// Computes the raw transmittance of a gas sample.
///
/// Implementations may block for a long time; the pipeline calls them synchronously and
/// propagates any failure without retrying.
pub trait LineByLineCalculator: Send + Sync {
    fn calculate(&self, request: &CalculatorRequest) -> Result<Spectrum, CalculatorError>;
}

/// A precomputed transmittance spectrum of one molecule, as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSpectrumRecord {
    pub molecule: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Serves calculations from a tabulated spectrum instead of computing lines.
///
/// Requests for another molecule are lookup failures; the served spectrum is the part of the
/// table inside the requested range, on the table's own grid.
#[derive(Clone, Debug)]
pub struct TabulatedCalculator {
    molecule: String,
    spectrum: Spectrum,
}

impl TabulatedCalculator {
    pub fn new(molecule: impl Into<String>, spectrum: Spectrum) -> Self {
        TabulatedCalculator { molecule: molecule.into(), spectrum }
    }

    pub fn from_record(record: RawSpectrumRecord) -> Result<Self, SpectrumError> {
        let spectrum = Spectrum::new(record.x, record.y)?;
        info!("loaded tabulated {} spectrum with {} points", record.molecule, spectrum.len());
        Ok(TabulatedCalculator::new(record.molecule, spectrum))
    }
}

impl LineByLineCalculator for TabulatedCalculator {
    fn calculate(&self, request: &CalculatorRequest) -> Result<Spectrum, CalculatorError> {
        debug!(
            "calculating {} in [{}, {}] cm-1, step {}, {} bar, {} K, {} cm",
            request.molecule,
            request.wavenumber_min,
            request.wavenumber_max,
            request.wavenumber_step,
            request.pressure,
            request.temperature,
            request.path_length
        );

        if request.molecule != self.molecule {
            return Err(CalculatorError::LookupFailure { molecule: request.molecule.clone() });
        }

        self.spectrum
            .crop(request.wavenumber_min, request.wavenumber_max)
            .map_err(|e| match e {
                SpectrumError::Empty => CalculatorError::EmptyRange,
                other => CalculatorError::Other(other.to_string()),
            })
    }
}
