// Purpose: To store the physical constants and instrument calibration used by the optics model
pub const PLANCK: f64 = 6.62606957e-34; // J s
pub const SPEED_OF_LIGHT: f64 = 2.99792458e8; // m/s
pub const K_BOLTZMANN: f64 = 1.3806488e-23; // J/K

pub const CM_INV_TO_M_INV: f64 = 1e2; // wavenumber cm^-1 -> m^-1
pub const CM_INV_TO_UM: f64 = 1e4; // wavelength (um) = 1e4 / wavenumber (cm^-1)

// Gas cell defaults
pub const DEFAULT_GAS_TEMPERATURE: f64 = 294.15; // Kelvin
pub const DEFAULT_PATH_LENGTH: f64 = 10.0; // cm

// Scan noise calibration
pub const SCAN_NOISE_STD_DEV: f64 = 0.005; // transmittance units, single scan
pub const SCAN_NOISE_CHUNK: usize = 10; // scans materialized per noise group
