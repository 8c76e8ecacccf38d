use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ftircore::algorithm::composition::OpticalPath;
use ftircore::algorithm::noise::{MultiScanNoise, NoiseError};
use ftircore::algorithm::utility::wavelength_range_to_wavenumber;
use ftircore::data::instrument::{Beamsplitter, CellWindow, Detector, InstrumentError, Resolution, ZeroFill};
use ftircore::data::spectrum::Normalization;
use ftircore::optics::constants::{DEFAULT_GAS_TEMPERATURE, DEFAULT_PATH_LENGTH, SCAN_NOISE_CHUNK, SCAN_NOISE_STD_DEV};
use ftircore::optics::grid::wavenumber_step;

/// HITRAN molecule identifiers the calculator is asked for.
pub const MOLECULES: [&str; 49] = [
    "C2H2", "C2H4", "C2H6", "C2N2", "C4H2", "CF4", "CH3Br", "CH3Cl", "CH3CN", "CH3OH", "CH4", "ClO", "ClONO2",
    "CO", "CO2", "COCl2", "COF2", "CS", "H2", "H2CO", "H2O", "H2O2", "H2S", "HBr", "HC3N", "HCl", "HCN",
    "HCOOH", "HF", "HI", "HNO3", "HO2", "HOBr", "HOCl", "N2", "N2O", "NH3", "NO", "NO+", "NO2", "O", "O2",
    "O3", "OCS", "OH", "PH3", "SF6", "SO2", "SO3",
];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing required parameter '{0}'")]
    MissingField(&'static str),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error(transparent)]
    Instrument(#[from] InstrumentError),
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::MissingField(field))
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue { field, reason: reason.into() }
}

/// Unit of the requested spectral range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveUnit {
    /// cm⁻¹
    #[default]
    #[serde(alias = "cm-1")]
    Wavenumber,
    /// µm
    #[serde(alias = "um")]
    Wavelength,
}

/// The loosely typed record a client sends, one optional field per request key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimulationRequest {
    pub molecule: Option<String>,
    pub pressure: Option<f64>,
    #[serde(rename = "mole", alias = "moleFraction")]
    pub mole_fraction: Option<f64>,
    #[serde(alias = "minWave")]
    pub wave_min: Option<f64>,
    #[serde(alias = "maxWave")]
    pub wave_max: Option<f64>,
    pub unit: Option<WaveUnit>,
    pub resolution: Option<f64>,
    pub zero_fill: Option<i64>,
    #[serde(alias = "scan")]
    pub num_scan: Option<u32>,
    pub beamsplitter: Option<String>,
    #[serde(alias = "window")]
    pub cell_window: Option<String>,
    pub detector: Option<String>,
    /// source temperature in K
    pub source: Option<f64>,
    pub gas_temperature: Option<f64>,
    pub path_length: Option<f64>,
    /// medium surrounding the optical path, accepted but not used by the simulation
    pub medium: Option<String>,
}

/// Gas cell conditions handed to the line-by-line calculator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GasCell {
    /// K
    pub temperature: f64,
    /// cm
    pub path_length: f64,
}

impl Default for GasCell {
    fn default() -> Self {
        GasCell {
            temperature: DEFAULT_GAS_TEMPERATURE,
            path_length: DEFAULT_PATH_LENGTH,
        }
    }
}

/// A validated instrument and sample configuration.
///
/// # Description
///
/// Built from a [`SimulationRequest`] with `InstrumentConfig::try_from`. Every selector is an
/// enumerated value, the spectral range is stored in wavenumber and satisfies `0 < min < max`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub molecule: String,
    /// bar
    pub pressure: f64,
    pub mole_fraction: f64,
    pub wavenumber_min: f64,
    pub wavenumber_max: f64,
    pub resolution: Resolution,
    pub zero_fill: ZeroFill,
    pub scans: u32,
    pub beamsplitter: Beamsplitter,
    pub cell_window: CellWindow,
    pub detector: Detector,
    pub source_temperature: f64,
    pub gas_cell: GasCell,
}

impl InstrumentConfig {
    pub fn wavenumber_step(&self) -> f64 {
        wavenumber_step(self.resolution, self.zero_fill)
    }

    pub fn optical_path(&self, normalization: Normalization) -> OpticalPath {
        OpticalPath::new(
            self.beamsplitter,
            self.cell_window,
            self.detector,
            self.source_temperature,
            normalization,
        )
    }

    pub fn noise(&self, pipeline: &PipelineConfig) -> Result<MultiScanNoise, NoiseError> {
        MultiScanNoise::new(self.scans, pipeline.noise_std_dev, pipeline.noise_chunk_size)
    }
}

impl TryFrom<SimulationRequest> for InstrumentConfig {
    type Error = ConfigError;

    fn try_from(request: SimulationRequest) -> Result<Self, Self::Error> {
        let molecule = required(request.molecule, "molecule")?;
        let pressure = required(request.pressure, "pressure")?;
        let wave_min = required(request.wave_min, "waveMin")?;
        let wave_max = required(request.wave_max, "waveMax")?;
        let resolution = Resolution::try_from(required(request.resolution, "resolution")?)?;
        let zero_fill = ZeroFill::try_from(required(request.zero_fill, "zeroFill")?)?;
        let scans = required(request.num_scan, "numScan")?;
        let beamsplitter = required(request.beamsplitter, "beamsplitter")?.parse::<Beamsplitter>()?;
        let cell_window = required(request.cell_window, "cellWindow")?.parse::<CellWindow>()?;
        let detector = required(request.detector, "detector")?.parse::<Detector>()?;
        let source_temperature = required(request.source, "source")?;

        if !MOLECULES.contains(&molecule.as_str()) {
            return Err(invalid("molecule", format!("'{}' is not a supported molecule", molecule)));
        }
        if !(pressure.is_finite() && pressure > 0.0) {
            return Err(invalid("pressure", format!("{} must be positive", pressure)));
        }
        let mole_fraction = request.mole_fraction.unwrap_or(1.0);
        if !(mole_fraction > 0.0 && mole_fraction <= 1.0) {
            return Err(invalid("mole", format!("{} must lie in (0, 1]", mole_fraction)));
        }
        if !(source_temperature.is_finite() && source_temperature > 0.0) {
            return Err(invalid("source", format!("{} K must be positive", source_temperature)));
        }
        if !(wave_min.is_finite() && wave_max.is_finite() && wave_min > 0.0 && wave_min < wave_max) {
            return Err(invalid("waveMin", format!("range [{}, {}] must satisfy 0 < min < max", wave_min, wave_max)));
        }

        let (wavenumber_min, wavenumber_max) = match request.unit.unwrap_or_default() {
            WaveUnit::Wavenumber => (wave_min, wave_max),
            WaveUnit::Wavelength => wavelength_range_to_wavenumber(wave_min, wave_max),
        };

        let defaults = GasCell::default();
        let gas_cell = GasCell {
            temperature: request.gas_temperature.unwrap_or(defaults.temperature),
            path_length: request.path_length.unwrap_or(defaults.path_length),
        };
        if !(gas_cell.temperature > 0.0 && gas_cell.temperature.is_finite()) {
            return Err(invalid("gasTemperature", format!("{} K must be positive", gas_cell.temperature)));
        }
        if !(gas_cell.path_length > 0.0 && gas_cell.path_length.is_finite()) {
            return Err(invalid("pathLength", format!("{} cm must be positive", gas_cell.path_length)));
        }

        Ok(InstrumentConfig {
            molecule,
            pressure,
            mole_fraction,
            wavenumber_min,
            wavenumber_max,
            resolution,
            zero_fill,
            scans,
            beamsplitter,
            cell_window,
            detector,
            source_temperature,
            gas_cell,
        })
    }
}

/// Parses and validates a request, logging the reason a request was turned down.
pub fn validate(request: SimulationRequest) -> Result<InstrumentConfig, ConfigError> {
    InstrumentConfig::try_from(request).inspect_err(|e| warn!("rejected simulation request: {}", e))
}

/// Tunables of the simulation pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Policy applied to the source and detector curves (default: max)
    pub normalization: Normalization,
    /// Crop the result to the requested range (default: true)
    pub crop: bool,
    /// Single-scan noise standard deviation (default: 0.005)
    pub noise_std_dev: f64,
    /// Scans materialized per noise chunk (default: 10)
    pub noise_chunk_size: usize,
    /// HITRAN isotopologue numbers (default: "1,2,3")
    pub isotopes: String,
    /// Line database identifier (default: "hitran")
    pub databank: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            normalization: Normalization::Max,
            crop: true,
            noise_std_dev: SCAN_NOISE_STD_DEV,
            noise_chunk_size: SCAN_NOISE_CHUNK,
            isotopes: "1,2,3".to_string(),
            databank: "hitran".to_string(),
        }
    }
}
