use crate::data::instrument::{InstrumentError, Resolution, ZeroFill};

// Wavenumber steps (cm^-1) for the line-by-line calculator by zero-fill level 0, 1, 2.
// A new resolution tier halves the steps of the one above it.
fn steps_for(resolution: Resolution) -> [f64; 3] {
    match resolution {
        Resolution::One => [0.481927711, 0.240963855, 0.120481928],
        Resolution::Half => [0.240963855, 0.120481928, 0.060240964],
        Resolution::Quarter => [0.120481928, 0.060240964, 0.030120482],
        Resolution::Eighth => [0.060240964, 0.030120482, 0.015060241],
        Resolution::Sixteenth => [0.030120482, 0.015060241, 0.00753012],
        Resolution::ThirtySecond => [0.01506, 0.00753, 0.003765],
        Resolution::SixtyFourth => [0.00753, 0.003765, 0.001883],
    }
}

/// Returns the wavenumber step for a resolution tier and zero-fill level.
///
/// # Example
///
/// ```rust
/// # use ftircore::data::instrument::{Resolution, ZeroFill};
/// # use ftircore::optics::grid::wavenumber_step;
/// assert_eq!(wavenumber_step(Resolution::One, ZeroFill::Zero), 0.481927711);
/// assert_eq!(wavenumber_step(Resolution::Sixteenth, ZeroFill::Two), 0.00753012);
/// ```
pub fn wavenumber_step(resolution: Resolution, zero_fill: ZeroFill) -> f64 {
    steps_for(resolution)[zero_fill.level() as usize]
}

/// Looks up the step for raw request values, rejecting anything outside the supported tiers.
pub fn wavenumber_step_for(resolution: f64, zero_fill: i64) -> Result<f64, InstrumentError> {
    let resolution = Resolution::try_from(resolution)?;
    let zero_fill = ZeroFill::try_from(zero_fill)?;
    Ok(wavenumber_step(resolution, zero_fill))
}
