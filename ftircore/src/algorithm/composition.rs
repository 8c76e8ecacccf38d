use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::instrument::{Beamsplitter, CellWindow, Detector};
use crate::data::spectrum::{Normalization, Spectrum, SpectrumError};
use crate::optics::curves::blackbody_spectrum;

/// One element of the optical path together with its transfer spectrum.
#[derive(Clone, Debug)]
pub struct Slab {
    pub label: &'static str,
    pub spectrum: Spectrum,
}

impl Slab {
    pub fn new(label: &'static str, spectrum: Spectrum) -> Self {
        Slab { label, spectrum }
    }
}

/// The optical train light crosses between the source and the detector element.
///
/// # Description
///
/// Light leaves a blackbody source, passes the beamsplitter, crosses the gas cell window twice
/// (double pass), then the window protecting the detector, and is finally weighted by the detector
/// response. The source and detector curves are rescaled with `normalization`; beamsplitter and
/// window curves are transmittances and enter as they are.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpticalPath {
    pub beamsplitter: Beamsplitter,
    pub cell_window: CellWindow,
    pub detector: Detector,
    pub source_temperature: f64,
    pub normalization: Normalization,
}

impl OpticalPath {
    pub fn new(
        beamsplitter: Beamsplitter,
        cell_window: CellWindow,
        detector: Detector,
        source_temperature: f64,
        normalization: Normalization,
    ) -> Self {
        OpticalPath { beamsplitter, cell_window, detector, source_temperature, normalization }
    }

    /// Builds the ordered chain of slabs for `sample`, all sampled on the sample's grid.
    ///
    /// The chain is: sample, source, beamsplitter, cell window (twice), detector window, detector.
    pub fn slabs(&self, sample: &Spectrum) -> Result<Vec<Slab>, SpectrumError> {
        let source = blackbody_spectrum(sample, self.source_temperature).normalized(self.normalization)?;
        let window = self.cell_window.curve().evaluate(sample);
        let detector = self.detector.curve().evaluate(sample).normalized(self.normalization)?;

        Ok(vec![
            Slab::new("sample", sample.clone()),
            Slab::new("source", source),
            Slab::new(self.beamsplitter.curve().name, self.beamsplitter.curve().evaluate(sample)),
            Slab::new(self.cell_window.curve().name, window.clone()),
            Slab::new(self.cell_window.curve().name, window),
            Slab::new(self.detector.window().name, self.detector.window().evaluate(sample)),
            Slab::new(self.detector.curve().name, detector),
        ])
    }

    /// Passes `sample` through the optical path and returns what reaches the detector.
    pub fn transmit(&self, sample: &Spectrum) -> Result<Spectrum, SpectrumError> {
        let slabs = self.slabs(sample)?;
        debug!(
            "composing {} slabs: {}",
            slabs.len(),
            slabs.iter().map(|slab| slab.label).collect::<Vec<_>>().join(" x ")
        );
        serial_slabs_in_place(slabs.into_iter().map(|slab| slab.spectrum).collect())
    }
}

fn check_grids(chain: &[Spectrum]) -> Result<(), SpectrumError> {
    let first = chain.first().ok_or(SpectrumError::EmptyChain)?;
    // fields are public, so lengths are not guaranteed by construction
    if let Some(spectrum) = chain.iter().find(|s| s.response.len() != s.wavenumber.len()) {
        return Err(SpectrumError::LengthMismatch {
            grid: spectrum.wavenumber.len(),
            response: spectrum.response.len(),
        });
    }
    match chain.iter().skip(1).position(|spectrum| !spectrum.shares_grid(first)) {
        Some(offset) => Err(SpectrumError::GridMismatch { position: offset + 1 }),
        None => Ok(()),
    }
}

/// Multiplies the responses of a chain of spectra that share one grid.
///
/// Transmittances of slabs in series multiply, so the order of the chain does not matter beyond
/// floating-point rounding. The inputs are left untouched.
///
/// # Example
///
/// ```rust
/// # use ftircore::data::spectrum::Spectrum;
/// # use ftircore::algorithm::composition::serial_slabs;
/// let a = Spectrum::new(vec![1000.0, 1001.0], vec![0.5, 0.8]).unwrap();
/// let b = a.map_grid(|_| 0.5);
/// let product = serial_slabs(&[a.clone(), b]).unwrap();
/// assert_eq!(*product.response, vec![0.25, 0.4]);
/// assert_eq!(*a.response, vec![0.5, 0.8]);
/// ```
pub fn serial_slabs(chain: &[Spectrum]) -> Result<Spectrum, SpectrumError> {
    // cloning only copies the Arc handles, the first buffer is copied on its first write
    serial_slabs_in_place(chain.to_vec())
}

/// Like [`serial_slabs`] but takes ownership of the chain and accumulates into the first
/// member's response buffer, avoiding a copy when that buffer is not shared.
pub fn serial_slabs_in_place(chain: Vec<Spectrum>) -> Result<Spectrum, SpectrumError> {
    check_grids(&chain)?;

    let mut slabs = chain.into_iter();
    let mut product = slabs.next().ok_or(SpectrumError::EmptyChain)?;

    for slab in slabs {
        for (acc, r) in product.response_mut().iter_mut().zip(slab.response.iter()) {
            *acc *= r;
        }
    }

    Ok(product)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::optics::curves::{
        background, AR_ZNSE_BEAMSPLITTER, CAF2_WINDOW, INSB_DETECTOR, MCT_DETECTOR, SAPPHIRE_WINDOW, ZNSE_WINDOW,
    };

    fn grid() -> Spectrum {
        let wavenumber: Vec<f64> = (0..400).map(|i| 1000.0 + i as f64 * 5.0).collect();
        let response: Vec<f64> = wavenumber.iter().map(|w| 0.9 - 0.1 * (w / 1000.0).sin().abs()).collect();
        Spectrum::new(wavenumber, response).unwrap()
    }

    fn path() -> OpticalPath {
        OpticalPath::new(Beamsplitter::ArZnSe, CellWindow::CaF2, Detector::Mct, 1700.0, Normalization::Max)
    }

    fn assert_close(a: &Spectrum, b: &Spectrum) {
        assert!(a.shares_grid(b));
        for (x, y) in a.response.iter().zip(b.response.iter()) {
            assert!((x - y).abs() <= 1e-12 * x.abs().max(y.abs()).max(1.0), "{} != {}", x, y);
        }
    }

    #[test]
    fn test_chain_order_follows_optical_path() {
        let labels: Vec<&str> = path().slabs(&grid()).unwrap().iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["sample", "source", "AR_ZnSe", "CaF2", "CaF2", "ZnSe", "MCT"]);

        let insb = OpticalPath { detector: Detector::InSb, cell_window: CellWindow::ZnSe, ..path() };
        let labels: Vec<&str> = insb.slabs(&grid()).unwrap().iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["sample", "source", "AR_ZnSe", "ZnSe", "ZnSe", "sapphire", "InSb"]);
    }

    #[test]
    fn test_composition_is_order_independent() {
        let chain: Vec<Spectrum> = path().slabs(&grid()).unwrap().into_iter().map(|s| s.spectrum).collect();
        let forward = serial_slabs(&chain).unwrap();

        let mut reversed = chain.clone();
        reversed.reverse();
        assert_close(&forward, &serial_slabs(&reversed).unwrap());

        let mut rotated = chain.clone();
        rotated.rotate_left(3);
        assert_close(&forward, &serial_slabs(&rotated).unwrap());
    }

    #[test]
    fn test_background_reproduces_input() {
        let sample = grid();
        let ones = sample.map_grid(background);
        let product = serial_slabs(&[sample.clone(), ones]).unwrap();
        assert_eq!(*product.response, *sample.response);
    }

    #[test]
    fn test_grid_mismatch_and_empty_chain_fail() {
        let sample = grid();
        let other = Spectrum::new(vec![1.0, 2.0], vec![1.0, 1.0]).unwrap();
        assert_eq!(
            serial_slabs(&[sample.clone(), sample.clone(), other]).unwrap_err(),
            SpectrumError::GridMismatch { position: 2 }
        );
        assert_eq!(serial_slabs(&[]).unwrap_err(), SpectrumError::EmptyChain);
    }

    #[test]
    fn test_short_response_on_shared_grid_fails() {
        let ones = Spectrum::new(vec![1.0, 2.0, 3.0, 4.0], vec![1.0; 4]).unwrap();
        let short = Spectrum { wavenumber: ones.wavenumber.clone(), response: Arc::new(vec![0.5]) };
        assert_eq!(
            serial_slabs(&[ones.clone(), short.clone()]).unwrap_err(),
            SpectrumError::LengthMismatch { grid: 4, response: 1 }
        );
        assert_eq!(
            serial_slabs_in_place(vec![short, ones]).unwrap_err(),
            SpectrumError::LengthMismatch { grid: 4, response: 1 }
        );
    }

    #[test]
    fn test_in_place_leaves_shared_inputs_intact() {
        let sample = grid();
        let halves = sample.map_grid(|_| 0.5);
        let before = sample.response.clone();
        let product = serial_slabs_in_place(vec![sample.clone(), halves]).unwrap();
        assert_eq!(*sample.response, *before);
        assert!((product.response[0] - 0.5 * before[0]).abs() < 1e-15);
    }

    #[test]
    fn test_background_through_mct_path_matches_explicit_product() {
        let sample = grid().ones_like();
        let composed = path().transmit(&sample).unwrap();

        let source = blackbody_spectrum(&sample, 1700.0).normalized(Normalization::Max).unwrap();
        let detector = MCT_DETECTOR.evaluate(&sample).normalized(Normalization::Max).unwrap();
        let expected: Vec<f64> = sample
            .wavenumber
            .iter()
            .zip(source.response.iter().zip(detector.response.iter()))
            .map(|(&w, (s, d))| {
                background(w) * s * AR_ZNSE_BEAMSPLITTER.at(w) * CAF2_WINDOW.at(w).powi(2) * ZNSE_WINDOW.at(w) * d
            })
            .collect();

        for (x, y) in composed.response.iter().zip(expected.iter()) {
            assert!((x - y).abs() <= 1e-12 * y.abs().max(1e-300));
        }
    }

    #[test]
    fn test_insb_path_uses_sapphire_window() {
        let sample = grid().ones_like();
        let insb = OpticalPath { detector: Detector::InSb, ..path() };
        let composed = insb.transmit(&sample).unwrap();

        let w = sample.wavenumber[100];
        let detector = INSB_DETECTOR.evaluate(&sample).normalized(Normalization::Max).unwrap();
        let source = blackbody_spectrum(&sample, 1700.0).normalized(Normalization::Max).unwrap();
        let expected = source.response[100]
            * AR_ZNSE_BEAMSPLITTER.at(w)
            * CAF2_WINDOW.at(w).powi(2)
            * SAPPHIRE_WINDOW.at(w)
            * detector.response[100];
        assert!((composed.response[100] - expected).abs() <= 1e-12 * expected.abs().max(1e-300));
    }
}
