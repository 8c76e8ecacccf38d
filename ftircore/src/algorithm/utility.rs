use crate::optics::constants::CM_INV_TO_UM;

pub trait RoundDecimals {
    fn round_decimals(&self, num_decimals: u32) -> f64;
}

impl RoundDecimals for f64 {
    fn round_decimals(&self, num_decimals: u32) -> f64 {
        let multiplier = 10f64.powi(num_decimals as i32);
        (self * multiplier).round() / multiplier
    }
}

/// Converts a wavelength range in micrometres into the matching wavenumber range (cm⁻¹).
///
/// The bounds swap: the short wavelength is the high wavenumber.
///
/// # Example
///
/// ```rust
/// # use ftircore::algorithm::utility::wavelength_range_to_wavenumber;
/// let (low, high) = wavelength_range_to_wavenumber(2.5, 10.0);
/// assert_eq!((low, high), (1000.0, 4000.0));
/// ```
pub fn wavelength_range_to_wavenumber(lambda_min_um: f64, lambda_max_um: f64) -> (f64, f64) {
    (CM_INV_TO_UM / lambda_max_um, CM_INV_TO_UM / lambda_min_um)
}
