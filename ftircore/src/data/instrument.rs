use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a selector value is outside the set of supported instrument parts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InstrumentError {
    #[error("unknown beamsplitter '{0}', expected one of: AR_ZnSe, AR_CaF2")]
    UnknownBeamsplitter(String),

    #[error("unknown cell window '{0}', expected one of: CaF2, ZnSe")]
    UnknownCellWindow(String),

    #[error("unknown detector '{0}', expected one of: MCT, InSb")]
    UnknownDetector(String),

    #[error("unsupported resolution {0} cm-1, expected one of: 1, 0.5, 0.25, 0.125, 0.0625, 0.03125, 0.015625")]
    UnknownResolution(f64),

    #[error("unsupported zero fill level {0}, expected 0, 1 or 2")]
    UnknownZeroFill(i64),
}

/// Anti-reflection coated beamsplitter of the interferometer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Beamsplitter {
    #[serde(rename = "AR_ZnSe")]
    ArZnSe,
    #[serde(rename = "AR_CaF2")]
    ArCaF2,
}

impl FromStr for Beamsplitter {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AR_ZnSe" => Ok(Beamsplitter::ArZnSe),
            "AR_CaF2" => Ok(Beamsplitter::ArCaF2),
            other => Err(InstrumentError::UnknownBeamsplitter(other.to_string())),
        }
    }
}

impl Display for Beamsplitter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Beamsplitter::ArZnSe => write!(f, "AR_ZnSe"),
            Beamsplitter::ArCaF2 => write!(f, "AR_CaF2"),
        }
    }
}

/// Material of the gas cell windows; light crosses a window twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellWindow {
    CaF2,
    ZnSe,
}

impl FromStr for CellWindow {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CaF2" => Ok(CellWindow::CaF2),
            "ZnSe" => Ok(CellWindow::ZnSe),
            other => Err(InstrumentError::UnknownCellWindow(other.to_string())),
        }
    }
}

impl Display for CellWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CellWindow::CaF2 => write!(f, "CaF2"),
            CellWindow::ZnSe => write!(f, "ZnSe"),
        }
    }
}

/// Infrared detector. Each variant sits behind a fixed protective window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Detector {
    /// Mercury-cadmium-telluride, behind a ZnSe window.
    #[serde(rename = "MCT")]
    Mct,
    /// Indium antimonide, behind a sapphire window.
    InSb,
}

impl FromStr for Detector {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MCT" => Ok(Detector::Mct),
            "InSb" => Ok(Detector::InSb),
            other => Err(InstrumentError::UnknownDetector(other.to_string())),
        }
    }
}

impl Display for Detector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Detector::Mct => write!(f, "MCT"),
            Detector::InSb => write!(f, "InSb"),
        }
    }
}

/// Nominal spectral resolution of the instrument in cm⁻¹.
///
/// # Description
///
/// Only the tiers the instrument supports exist; each tier halves the previous one.
/// Serialized as its numeric value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Resolution {
    One,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
}

impl Resolution {
    pub const ALL: [Resolution; 7] = [
        Resolution::One,
        Resolution::Half,
        Resolution::Quarter,
        Resolution::Eighth,
        Resolution::Sixteenth,
        Resolution::ThirtySecond,
        Resolution::SixtyFourth,
    ];

    /// Returns the resolution in cm⁻¹.
    pub fn cm_inv(&self) -> f64 {
        match self {
            Resolution::One => 1.0,
            Resolution::Half => 0.5,
            Resolution::Quarter => 0.25,
            Resolution::Eighth => 0.125,
            Resolution::Sixteenth => 0.0625,
            Resolution::ThirtySecond => 0.03125,
            Resolution::SixtyFourth => 0.015625,
        }
    }
}

impl TryFrom<f64> for Resolution {
    type Error = InstrumentError;

    // every tier is a power of two, so exact comparison is safe
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Resolution::ALL
            .iter()
            .copied()
            .find(|tier| tier.cm_inv() == value)
            .ok_or(InstrumentError::UnknownResolution(value))
    }
}

impl From<Resolution> for f64 {
    fn from(resolution: Resolution) -> f64 {
        resolution.cm_inv()
    }
}

impl Display for Resolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} cm-1", self.cm_inv())
    }
}

/// Zero-filling level applied to the interferogram before transformation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ZeroFill {
    Zero,
    One,
    Two,
}

impl ZeroFill {
    pub fn level(&self) -> i64 {
        match self {
            ZeroFill::Zero => 0,
            ZeroFill::One => 1,
            ZeroFill::Two => 2,
        }
    }
}

impl TryFrom<i64> for ZeroFill {
    type Error = InstrumentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ZeroFill::Zero),
            1 => Ok(ZeroFill::One),
            2 => Ok(ZeroFill::Two),
            other => Err(InstrumentError::UnknownZeroFill(other)),
        }
    }
}

impl From<ZeroFill> for i64 {
    fn from(zero_fill: ZeroFill) -> i64 {
        zero_fill.level()
    }
}

impl Display for ZeroFill {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}
