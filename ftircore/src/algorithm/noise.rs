use log::debug;
use nalgebra::DMatrix;
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use thiserror::Error;

use crate::data::spectrum::Spectrum;
use crate::optics::constants::{SCAN_NOISE_CHUNK, SCAN_NOISE_STD_DEV};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NoiseError {
    #[error("noise standard deviation must be finite and non-negative, got {0}")]
    InvalidStdDev(f64),

    #[error("noise chunk size must be at least 1")]
    ZeroChunk,
}

/// Measurement noise of an average over `scans` independent scans.
///
/// # Description
///
/// Each scan carries zero-mean Gaussian noise with standard deviation `std_dev`. Averaging N
/// scans leaves one noise realization with variance `std_dev² / N` per grid point. The draws are
/// materialized at most `chunk_size` scans at a time and folded into a running sum, so memory
/// stays bounded by `chunk_size × grid length` regardless of N. Zero scans add no noise.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiScanNoise {
    pub scans: u32,
    pub std_dev: f64,
    pub chunk_size: usize,
}

impl MultiScanNoise {
    pub fn new(scans: u32, std_dev: f64, chunk_size: usize) -> Result<Self, NoiseError> {
        if !(std_dev.is_finite() && std_dev >= 0.0) {
            return Err(NoiseError::InvalidStdDev(std_dev));
        }
        if chunk_size == 0 {
            return Err(NoiseError::ZeroChunk);
        }
        Ok(MultiScanNoise { scans, std_dev, chunk_size })
    }

    /// Noise budget with the calibrated single-scan deviation and chunk size.
    pub fn with_scans(scans: u32) -> Self {
        MultiScanNoise { scans, std_dev: SCAN_NOISE_STD_DEV, chunk_size: SCAN_NOISE_CHUNK }
    }

    /// Returns (full groups, scans left over for the last, smaller group).
    pub fn groups(&self) -> (usize, usize) {
        let scans = self.scans as usize;
        (scans / self.chunk_size, scans % self.chunk_size)
    }

    /// Draws the averaged noise term for a grid of `len` points.
    pub fn sample<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Result<Vec<f64>, NoiseError> {
        let mut noise = vec![0.0; len];
        if self.scans == 0 || self.std_dev == 0.0 || len == 0 {
            return Ok(noise);
        }

        let normal = Normal::new(0.0, self.std_dev).map_err(|_| NoiseError::InvalidStdDev(self.std_dev))?;
        let (groups, remainder) = self.groups();
        debug!(
            "adding noise of {} scans: {} groups of {} and {} remaining",
            self.scans, groups, self.chunk_size, remainder
        );

        let chunk_heights = std::iter::repeat(self.chunk_size)
            .take(groups)
            .chain((remainder > 0).then_some(remainder));

        for rows in chunk_heights {
            let draws = DMatrix::<f64>::from_fn(rows, len, |_, _| normal.sample(rng));
            // fold the scan axis: one sum per grid point
            for (acc, column_sum) in noise.iter_mut().zip(draws.row_sum().iter()) {
                *acc += column_sum / self.scans as f64;
            }
        }

        Ok(noise)
    }

    /// Adds the averaged noise term to the response of `spectrum`.
    pub fn apply_in_place<R: Rng + ?Sized>(&self, spectrum: &mut Spectrum, rng: &mut R) -> Result<(), NoiseError> {
        if self.scans == 0 {
            return Ok(());
        }
        let noise = self.sample(spectrum.len(), rng)?;
        for (r, n) in spectrum.response_mut().iter_mut().zip(noise.iter()) {
            *r += n;
        }
        Ok(())
    }

    /// Returns a noisy copy of `spectrum`.
    pub fn apply<R: Rng + ?Sized>(&self, spectrum: &Spectrum, rng: &mut R) -> Result<Spectrum, NoiseError> {
        let mut noisy = spectrum.clone();
        self.apply_in_place(&mut noisy, rng)?;
        Ok(noisy)
    }
}
