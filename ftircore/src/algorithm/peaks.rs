//! Threshold based line detection on absorbance spectra.
//!
//! The noise level is the standard deviation of the response over the searched range. A sample
//! whose magnitude exceeds `noise_factor` noise levels is emission when positive and absorption
//! when negative; each contiguous run of one kind is a single line centered on its largest value.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use thiserror::Error;

use crate::algorithm::utility::RoundDecimals;
use crate::data::spectrum::{Spectrum, SpectrumError};

/// Peaks are reported with this many decimals on both axes.
pub const PEAK_DECIMALS: u32 = 4;

/// Detected peaks: rounded wavenumber -> rounded height.
pub type PeakSet = BTreeMap<OrderedFloat<f64>, f64>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PeakError {
    #[error("malformed spectrum: {0}")]
    Malformed(#[from] SpectrumError),

    #[error("line detection needs at least 3 samples, got {0}")]
    TooFewSamples(usize),

    #[error("non-finite {axis} value at index {index}")]
    NonFinite { axis: Axis, index: usize },

    #[error("lower bound {lower} exceeds upper bound {upper}")]
    InvertedBounds { lower: f64, upper: f64 },

    #[error("noise factor must be finite and positive, got {0}")]
    InvalidNoiseFactor(f64),
}

/// The two input arrays of a peak search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Wavenumber,
    Response,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Wavenumber => write!(f, "x"),
            Axis::Response => write!(f, "y"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Emission,
    Absorption,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectralLine {
    pub index: usize,
    pub wavenumber: f64,
    pub kind: LineKind,
    /// signed response at the line center
    pub excursion: f64,
}

/// Noise estimate of a response array: its population standard deviation.
pub fn noise_level(response: &[f64]) -> f64 {
    response.iter().population_std_dev()
}

#[derive(Clone, Debug, PartialEq)]
pub struct PeakExtractor {
    noise_factor: f64,
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
}

impl Default for PeakExtractor {
    fn default() -> Self {
        Self {
            noise_factor: 1.0,
            lower_bound: None,
            upper_bound: None,
        }
    }
}

impl PeakExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many noise levels a sample must reach, in magnitude, to be flagged.
    pub fn with_noise_factor(mut self, noise_factor: f64) -> Self {
        self.noise_factor = noise_factor;
        self
    }

    /// Only report peaks with `lower <= wavenumber <= upper`.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = Some(lower);
        self.upper_bound = Some(upper);
        self
    }

    fn check_settings(&self) -> Result<(), PeakError> {
        if !(self.noise_factor.is_finite() && self.noise_factor > 0.0) {
            return Err(PeakError::InvalidNoiseFactor(self.noise_factor));
        }
        if let (Some(lower), Some(upper)) = (self.lower_bound, self.upper_bound) {
            if lower > upper {
                return Err(PeakError::InvertedBounds { lower, upper });
            }
        }
        Ok(())
    }

    fn in_bounds(&self, wavenumber: f64) -> bool {
        self.lower_bound.map_or(true, |lower| wavenumber >= lower)
            && self.upper_bound.map_or(true, |upper| wavenumber <= upper)
    }

    /// Flags every line of `spectrum`, emission and absorption alike, in wavenumber order.
    ///
    /// The kind of a line is the sign of the response itself, so a band keeps its kind whatever
    /// the level of the rest of the spectrum. A constant response has no lines.
    pub fn detect_lines(&self, spectrum: &Spectrum) -> Vec<SpectralLine> {
        let response = &spectrum.response;
        let noise = noise_level(response);
        if noise.is_nan() || noise <= 0.0 {
            debug!("constant response, no lines");
            return Vec::new();
        }
        let limit = self.noise_factor * noise;

        let flags = response.iter().map(|&y| {
            if y > limit {
                Some(LineKind::Emission)
            } else if y < -limit {
                Some(LineKind::Absorption)
            } else {
                None
            }
        });

        let mut lines = Vec::new();
        let runs = flags.enumerate().chunk_by(|(_, kind)| *kind);

        for (kind, run) in &runs {
            let Some(kind) = kind else { continue };
            // first sample of largest magnitude
            let center = run
                .map(|(index, _)| index)
                .min_by(|&a, &b| response[b].abs().partial_cmp(&response[a].abs()).unwrap_or(Ordering::Equal));

            if let Some(index) = center {
                lines.push(SpectralLine {
                    index,
                    wavenumber: spectrum.wavenumber[index],
                    kind,
                    excursion: response[index],
                });
            }
        }

        debug!("detected {} lines (noise {:.3e}, limit {:.3e})", lines.len(), noise, limit);
        lines
    }

    /// Extracts the emission peaks of an absorbance array whose height is at least `threshold`.
    ///
    /// # Arguments
    ///
    /// * `x` - wavenumbers, strictly increasing
    /// * `y` - absorbance at each wavenumber
    /// * `threshold` - minimum reported height
    ///
    /// # Errors
    ///
    /// Any malformed input is an error; an empty `PeakSet` always means detection ran and found
    /// nothing that qualifies.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use ftircore::algorithm::peaks::PeakExtractor;
    /// # use ordered_float::OrderedFloat;
    /// let x: Vec<f64> = (0..101).map(|i| 1950.0 + i as f64).collect();
    /// let y: Vec<f64> = x.iter().map(|w| 0.5 * (-(w - 2000.0f64).powi(2) / 8.0).exp()).collect();
    /// let peaks = PeakExtractor::new().extract(&x, &y, 0.3).unwrap();
    /// assert_eq!(peaks.get(&OrderedFloat(2000.0)), Some(&0.5));
    /// ```
    pub fn extract(&self, x: &[f64], y: &[f64], threshold: f64) -> Result<PeakSet, PeakError> {
        self.check_settings()?;

        for (axis, values) in [(Axis::Wavenumber, x), (Axis::Response, y)] {
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(PeakError::NonFinite { axis, index });
            }
        }
        let spectrum = Spectrum::new(x.to_vec(), y.to_vec())?;
        if spectrum.len() < 3 {
            return Err(PeakError::TooFewSamples(spectrum.len()));
        }

        let peaks: PeakSet = self
            .detect_lines(&spectrum)
            .into_iter()
            .filter(|line| line.kind == LineKind::Emission)
            .filter(|line| y[line.index] >= threshold && self.in_bounds(line.wavenumber))
            .map(|line| {
                (
                    OrderedFloat(line.wavenumber.round_decimals(PEAK_DECIMALS)),
                    y[line.index].round_decimals(PEAK_DECIMALS),
                )
            })
            .collect();

        debug!("kept {} peaks at threshold {}", peaks.len(), threshold);
        Ok(peaks)
    }
}
