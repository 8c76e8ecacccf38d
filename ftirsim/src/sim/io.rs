use serde::{Deserialize, Serialize};

use ftircore::algorithm::peaks::PeakSet;
use ftircore::data::spectrum::Spectrum;

/// A successful simulation as returned to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectrumResponse {
    pub success: bool,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl From<&Spectrum> for SpectrumResponse {
    fn from(spectrum: &Spectrum) -> Self {
        SpectrumResponse {
            success: true,
            x: spectrum.wavenumber.to_vec(),
            y: spectrum.response.to_vec(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakEntry {
    pub wavenumber: f64,
    pub height: f64,
}

/// Peaks found by a successful extraction; an empty list is a valid answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeaksResponse {
    pub success: bool,
    pub peaks: Vec<PeakEntry>,
    pub text: Option<String>,
}

impl From<&PeakSet> for PeaksResponse {
    fn from(peaks: &PeakSet) -> Self {
        PeaksResponse {
            success: true,
            peaks: peaks
                .iter()
                .map(|(wavenumber, height)| PeakEntry { wavenumber: wavenumber.0, height: *height })
                .collect(),
            text: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub text: String,
}

impl FailureResponse {
    pub fn new(text: impl Into<String>) -> Self {
        FailureResponse { success: false, text: text.into() }
    }
}

/// Input of a peak search: parallel wavenumber and absorbance arrays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeaksInput {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}
