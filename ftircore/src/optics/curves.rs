//! Transfer functions of the optical elements of the spectrometer.
//!
//! Every element curve is an empirical fit on the wavelength axis (micrometres) and is
//! evaluated at `x = 1e4 / wavenumber`. Two shapes are used as baselines: a saturating
//! logistic for windows and beamsplitters, and a logistic band-pass for detectors. Where
//! the baseline alone misses measured dips or bumps, a sum of Gaussian lineshapes is added.
//! The coefficient tables are calibration data and must not be re-fitted here.

use std::f64::consts::{LN_2, PI};

use crate::data::instrument::{Beamsplitter, CellWindow, Detector};
use crate::data::spectrum::Spectrum;
use crate::optics::constants::{CM_INV_TO_M_INV, CM_INV_TO_UM, K_BOLTZMANN, PLANCK, SPEED_OF_LIGHT};

/// Gaussian lineshape with unit-area normalization, parameterized by its FWHM.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianTerm {
    pub amplitude: f64,
    pub center: f64,
    pub fwhm: f64,
}

impl GaussianTerm {
    pub const fn new(amplitude: f64, center: f64, fwhm: f64) -> Self {
        GaussianTerm { amplitude, center, fwhm }
    }

    /// `A / (w·√(π/4ln2)) · exp(−4ln2·(x − c)² / w²)`, so that `A` is the integrated area.
    pub fn at(&self, x_um: f64) -> f64 {
        self.amplitude / (self.fwhm * (PI / (4.0 * LN_2)).sqrt())
            * (-4.0 * LN_2 * (x_um - self.center).powi(2) / self.fwhm.powi(2)).exp()
    }
}

/// The smooth part of an element curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Baseline {
    /// `amplitude / (1 + (cutoff / x)^(-steepness))^power`
    Saturation { amplitude: f64, cutoff: f64, steepness: f64, power: f64 },
    /// `offset + amplitude · s((x − center)/rise) · (1 − s((x − center)/fall))`, s the logistic sigmoid
    BandPass { offset: f64, amplitude: f64, center: f64, rise: f64, fall: f64 },
}

impl Baseline {
    pub fn at(&self, x_um: f64) -> f64 {
        match *self {
            Baseline::Saturation { amplitude, cutoff, steepness, power } => {
                // overflow of the outer power drives the transmittance to 0, which is the physical limit
                amplitude / (1.0 + (cutoff / x_um).powf(-steepness)).powf(power)
            }
            Baseline::BandPass { offset, amplitude, center, rise, fall } => {
                offset + amplitude * sigmoid((x_um - center) / rise) * (1.0 - sigmoid((x_um - center) / fall))
            }
        }
    }
}

#[inline]
fn sigmoid(t: f64) -> f64 {
    1.0 / (1.0 + (-t).exp())
}

/// Empirical response curve of one optical element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResponseCurve {
    pub name: &'static str,
    pub baseline: Baseline,
    pub corrections: &'static [GaussianTerm],
}

impl ResponseCurve {
    /// Response at a single wavenumber (cm⁻¹).
    pub fn at(&self, wavenumber: f64) -> f64 {
        let x_um = CM_INV_TO_UM / wavenumber;
        self.baseline.at(x_um) + self.corrections.iter().map(|term| term.at(x_um)).sum::<f64>()
    }

    /// Evaluates the curve on the grid of `grid`, sharing its wavenumber allocation.
    pub fn evaluate(&self, grid: &Spectrum) -> Spectrum {
        grid.map_grid(|w| self.at(w))
    }
}

/// Spectral radiance of a blackbody source in wavenumber form.
///
/// `2·h·c²·ν³ / (exp(h·c·ν / k·T) − 1)` with ν converted to m⁻¹. Absolute scale is irrelevant
/// to the simulation because the source curve is normalized before composition.
pub fn blackbody(wavenumber: f64, temperature: f64) -> f64 {
    let nu = wavenumber * CM_INV_TO_M_INV;
    2.0 * PLANCK * SPEED_OF_LIGHT.powi(2) * nu.powi(3)
        / (PLANCK * SPEED_OF_LIGHT * nu / (K_BOLTZMANN * temperature)).exp_m1()
}

/// Blackbody curve at `temperature` (K) on the grid of `grid`.
pub fn blackbody_spectrum(grid: &Spectrum, temperature: f64) -> Spectrum {
    grid.map_grid(|w| blackbody(w, temperature))
}

/// Background sample: full transmission everywhere.
pub fn background(_wavenumber: f64) -> f64 {
    1.0
}

pub const CAF2_WINDOW: ResponseCurve = ResponseCurve {
    name: "CaF2",
    baseline: Baseline::Saturation { amplitude: 0.93091, cutoff: 11.12929, steepness: 12.43933, power: 4.32574 },
    corrections: &[],
};

pub const SAPPHIRE_WINDOW: ResponseCurve = ResponseCurve {
    name: "sapphire",
    baseline: Baseline::Saturation { amplitude: 0.78928, cutoff: 11.9544, steepness: 12.07226, power: 6903.57039 },
    corrections: &[],
};

pub const ZNSE_WINDOW: ResponseCurve = ResponseCurve {
    name: "ZnSe",
    baseline: Baseline::Saturation { amplitude: 0.71015, cutoff: 20.99353, steepness: 19.31355, power: 1.44348 },
    corrections: &[GaussianTerm::new(-0.13265, 16.75, 2.25051)],
};

pub const AR_ZNSE_BEAMSPLITTER: ResponseCurve = ResponseCurve {
    name: "AR_ZnSe",
    baseline: Baseline::Saturation { amplitude: 0.82609, cutoff: 34.63971, steepness: 8.56269, power: 186.34792 },
    corrections: &[
        GaussianTerm::new(-0.47, 1.47, 0.55),
        GaussianTerm::new(-0.03456, 2.88, 0.4),
        GaussianTerm::new(-0.009, 6.16, 0.3),
        GaussianTerm::new(-0.09, 16.2, 1.0),
        GaussianTerm::new(-0.08, 17.4, 1.0),
        GaussianTerm::new(1.12, 9.5, 8.0),
        GaussianTerm::new(0.11546, 4.9, 2.0),
        GaussianTerm::new(0.21751, 2.6, 2.0),
        GaussianTerm::new(-0.05, 0.8, 0.07),
    ],
};

pub const AR_CAF2_BEAMSPLITTER: ResponseCurve = ResponseCurve {
    name: "AR_CaF2",
    baseline: Baseline::Saturation { amplitude: 0.9795, cutoff: 18.77617, steepness: 6.94246, power: 91.98745 },
    corrections: &[
        GaussianTerm::new(-0.06, 0.76, 0.08),
        GaussianTerm::new(-0.06, 1.06, 0.2),
        GaussianTerm::new(-0.6, 4.85, 3.0),
        GaussianTerm::new(-0.35, 9.40, 1.0),
        GaussianTerm::new(0.05, 2.60, 0.8),
        GaussianTerm::new(0.04, 7.75, 0.5),
        GaussianTerm::new(-0.01, 6.55, 0.6),
        GaussianTerm::new(0.01, 1.82, 0.5),
    ],
};

pub const MCT_DETECTOR: ResponseCurve = ResponseCurve {
    name: "MCT",
    baseline: Baseline::BandPass { offset: 1.98748e9, amplitude: 2.10252e10, center: 20.15819, rise: 5.73688, fall: 1.11659 },
    corrections: &[GaussianTerm::new(1.3e9, 18.6, 2.0)],
};

pub const INSB_DETECTOR: ResponseCurve = ResponseCurve {
    name: "InSb",
    baseline: Baseline::BandPass { offset: 0.0, amplitude: 1.85314e11, center: 5.39001, rise: 1.80975, fall: 0.116 },
    corrections: &[GaussianTerm::new(3.3e10, 5.0, 1.77143)],
};

impl Beamsplitter {
    pub fn curve(&self) -> &'static ResponseCurve {
        match self {
            Beamsplitter::ArZnSe => &AR_ZNSE_BEAMSPLITTER,
            Beamsplitter::ArCaF2 => &AR_CAF2_BEAMSPLITTER,
        }
    }
}

impl CellWindow {
    pub fn curve(&self) -> &'static ResponseCurve {
        match self {
            CellWindow::CaF2 => &CAF2_WINDOW,
            CellWindow::ZnSe => &ZNSE_WINDOW,
        }
    }
}

impl Detector {
    /// The protective window mounted in front of the detector element.
    pub fn window(&self) -> &'static ResponseCurve {
        match self {
            Detector::Mct => &ZNSE_WINDOW,
            Detector::InSb => &SAPPHIRE_WINDOW,
        }
    }

    pub fn curve(&self) -> &'static ResponseCurve {
        match self {
            Detector::Mct => &MCT_DETECTOR,
            Detector::InSb => &INSB_DETECTOR,
        }
    }
}
