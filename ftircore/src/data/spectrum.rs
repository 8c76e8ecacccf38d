use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or combining spectra.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpectrumError {
    #[error("wavenumber grid has {grid} points but response has {response}")]
    LengthMismatch { grid: usize, response: usize },

    #[error("wavenumber grid must be strictly increasing (violated at index {index})")]
    NonMonotonicGrid { index: usize },

    #[error("spectrum must contain at least one point")]
    Empty,

    #[error("spectrum at chain position {position} does not share the wavenumber grid of the first spectrum")]
    GridMismatch { position: usize },

    #[error("cannot compose an empty chain of spectra")]
    EmptyChain,

    #[error("cannot normalize by {policy}: reference value {reference} is not positive and finite")]
    DegenerateNormalization { policy: Normalization, reference: f64 },
}

/// How a curve is rescaled before it enters a composition chain.
///
/// # Description
///
/// `Max` scales the largest response value to 1, `Mean` scales the mean response to 1.
/// A single policy is applied to every normalized curve of one simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    #[default]
    Max,
    Mean,
}

impl Display for Normalization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::Max => write!(f, "max"),
            Normalization::Mean => write!(f, "mean"),
        }
    }
}

/// A response array sampled on a wavenumber grid (cm⁻¹).
///
/// Uses Arc<Vec<f64>> so that every curve evaluated on the same grid shares one
/// allocation; clone is O(1) and grid identity checks can short-circuit on the pointer.
#[derive(Clone, Debug, Serialize)]
pub struct Spectrum {
    pub wavenumber: Arc<Vec<f64>>,
    pub response: Arc<Vec<f64>>,
}

impl Spectrum {
    /// Constructs a new `Spectrum`.
    ///
    /// # Arguments
    ///
    /// * `wavenumber` - A strictly increasing wavenumber grid.
    /// * `response` - A response value for every grid point.
    ///
    /// # Errors
    ///
    /// Fails if the arrays differ in length, are empty, or the grid is not strictly increasing.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use ftircore::data::spectrum::Spectrum;
    /// let spectrum = Spectrum::new(vec![1000.0, 1000.5], vec![0.9, 0.8]).unwrap();
    /// assert_eq!(spectrum.len(), 2);
    /// assert!(Spectrum::new(vec![1000.0, 999.0], vec![0.9, 0.8]).is_err());
    /// ```
    pub fn new(wavenumber: Vec<f64>, response: Vec<f64>) -> Result<Self, SpectrumError> {
        if wavenumber.len() != response.len() {
            return Err(SpectrumError::LengthMismatch { grid: wavenumber.len(), response: response.len() });
        }
        if wavenumber.is_empty() {
            return Err(SpectrumError::Empty);
        }
        if let Some(index) = wavenumber.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(SpectrumError::NonMonotonicGrid { index: index + 1 });
        }

        Ok(Spectrum {
            wavenumber: Arc::new(wavenumber),
            response: Arc::new(response),
        })
    }

    pub fn len(&self) -> usize {
        self.wavenumber.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavenumber.is_empty()
    }

    /// Evaluates `f` at every point of this spectrum's grid, sharing the grid allocation.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use ftircore::data::spectrum::Spectrum;
    /// let raw = Spectrum::new(vec![1000.0, 2000.0], vec![0.5, 0.5]).unwrap();
    /// let doubled = raw.map_grid(|w| w * 2.0);
    /// assert!(doubled.shares_grid(&raw));
    /// assert_eq!(*doubled.response, vec![2000.0, 4000.0]);
    /// ```
    pub fn map_grid<F>(&self, f: F) -> Spectrum
    where
        F: Fn(f64) -> f64,
    {
        let response: Vec<f64> = self.wavenumber.iter().map(|&w| f(w)).collect();
        Spectrum { wavenumber: self.wavenumber.clone(), response: Arc::new(response) }
    }

    /// The background curve on this grid: response 1 everywhere.
    pub fn ones_like(&self) -> Spectrum {
        self.map_grid(|_| 1.0)
    }

    /// True when both spectra are sampled on the identical grid (same length, values and order).
    pub fn shares_grid(&self, other: &Spectrum) -> bool {
        Arc::ptr_eq(&self.wavenumber, &other.wavenumber) || *self.wavenumber == *other.wavenumber
    }

    /// Elementwise product of two spectra on the same grid.
    pub fn multiply(&self, other: &Spectrum) -> Result<Spectrum, SpectrumError> {
        if !self.shares_grid(other) {
            return Err(SpectrumError::GridMismatch { position: 1 });
        }
        let response: Vec<f64> = self.response.iter().zip(other.response.iter()).map(|(a, b)| a * b).collect();
        Ok(Spectrum { wavenumber: self.wavenumber.clone(), response: Arc::new(response) })
    }

    /// Rescales the response so that its maximum (or mean) becomes 1.
    pub fn normalized(&self, policy: Normalization) -> Result<Spectrum, SpectrumError> {
        let reference = match policy {
            Normalization::Max => self.response.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            Normalization::Mean => self.response.iter().sum::<f64>() / self.len() as f64,
        };

        if !(reference.is_finite() && reference > 0.0) {
            return Err(SpectrumError::DegenerateNormalization { policy, reference });
        }

        Ok(self.clone() * (1.0 / reference))
    }

    /// Keeps only the points with `w_min <= wavenumber <= w_max`.
    pub fn crop(&self, w_min: f64, w_max: f64) -> Result<Spectrum, SpectrumError> {
        let mut wavenumber_vec: Vec<f64> = Vec::new();
        let mut response_vec: Vec<f64> = Vec::new();

        for (w, r) in self.wavenumber.iter().zip(self.response.iter()) {
            if w_min <= *w && *w <= w_max {
                wavenumber_vec.push(*w);
                response_vec.push(*r);
            }
        }

        if wavenumber_vec.len() == self.len() {
            return Ok(self.clone());
        }
        Spectrum::new(wavenumber_vec, response_vec)
    }

    /// Mutable access to the response; copies the buffer first if it is shared.
    pub fn response_mut(&mut self) -> &mut Vec<f64> {
        Arc::make_mut(&mut self.response)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavenumber.iter().cloned().zip(self.response.iter().cloned())
    }
}

/// Formats the `Spectrum` for display.
impl Display for Spectrum {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let max = self.iter().max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match (self.wavenumber.first(), self.wavenumber.last(), max) {
            (Some(first), Some(last), Some((w, r))) => write!(
                f,
                "Spectrum(data points: {}, range: [{:.3}, {:.3}] cm-1, max by response:({:.3}, {}))",
                self.len(), first, last, w, r
            ),
            _ => write!(f, "Spectrum(data points: 0)"),
        }
    }
}

impl std::ops::Mul<f64> for Spectrum {
    type Output = Self;
    fn mul(self, scale: f64) -> Self::Output {
        let scaled: Vec<f64> = self.response.iter().map(|r| scale * r).collect();
        // Clone grid Arc (O(1)), wrap new response in Arc
        Self { wavenumber: self.wavenumber.clone(), response: Arc::new(scaled) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Spectrum {
        Spectrum::new(vec![1000.0, 1001.0, 1002.0, 1003.0], vec![1.0, 2.0, 3.0, 2.0]).unwrap()
    }

    #[test]
    fn test_new_rejects_malformed_input() {
        assert_eq!(
            Spectrum::new(vec![1.0, 2.0], vec![1.0]).unwrap_err(),
            SpectrumError::LengthMismatch { grid: 2, response: 1 }
        );
        assert_eq!(Spectrum::new(vec![], vec![]).unwrap_err(), SpectrumError::Empty);
        assert_eq!(
            Spectrum::new(vec![1.0, 2.0, 2.0], vec![1.0, 1.0, 1.0]).unwrap_err(),
            SpectrumError::NonMonotonicGrid { index: 2 }
        );
    }

    #[test]
    fn test_multiply_requires_identical_grid() {
        let a = ramp();
        let shifted = Spectrum::new(vec![1000.0, 1001.0, 1002.0, 1003.5], vec![1.0; 4]).unwrap();
        assert_eq!(a.multiply(&shifted).unwrap_err(), SpectrumError::GridMismatch { position: 1 });

        // equal values on a separate allocation still count as the same grid
        let copy = Spectrum::new(vec![1000.0, 1001.0, 1002.0, 1003.0], vec![2.0; 4]).unwrap();
        let product = a.multiply(&copy).unwrap();
        assert_eq!(*product.response, vec![2.0, 4.0, 6.0, 4.0]);
    }

    #[test]
    fn test_ones_like_is_identity() {
        let a = ramp();
        let product = a.multiply(&a.ones_like()).unwrap();
        assert_eq!(*product.response, *a.response);
        assert!(Arc::ptr_eq(&product.wavenumber, &a.wavenumber));
    }

    #[test]
    fn test_normalization_policies() {
        let a = ramp();
        let by_max = a.normalized(Normalization::Max).unwrap();
        assert!((by_max.response.iter().cloned().fold(f64::MIN, f64::max) - 1.0).abs() < 1e-12);

        let by_mean = a.normalized(Normalization::Mean).unwrap();
        let mean = by_mean.response.iter().sum::<f64>() / by_mean.len() as f64;
        assert!((mean - 1.0).abs() < 1e-12);

        let flat = a.map_grid(|_| 0.0);
        assert!(matches!(
            flat.normalized(Normalization::Max),
            Err(SpectrumError::DegenerateNormalization { .. })
        ));
    }

    #[test]
    fn test_crop() {
        let a = ramp();
        let cropped = a.crop(1000.5, 1002.0).unwrap();
        assert_eq!(*cropped.wavenumber, vec![1001.0, 1002.0]);
        assert_eq!(*cropped.response, vec![2.0, 3.0]);

        assert!(Arc::ptr_eq(&a.crop(0.0, 5000.0).unwrap().wavenumber, &a.wavenumber));
        assert_eq!(a.crop(5000.0, 6000.0).unwrap_err(), SpectrumError::Empty);
    }

    #[test]
    fn test_response_mut_copies_shared_buffer() {
        let a = ramp();
        let mut b = a.clone();
        b.response_mut()[0] = 10.0;
        assert_eq!(a.response[0], 1.0);
        assert_eq!(b.response[0], 10.0);
    }
}
