use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::statistics::Statistics;

use ftircore::data::spectrum::{Normalization, Spectrum};
use ftircore::optics::curves::{
    background, blackbody_spectrum, AR_ZNSE_BEAMSPLITTER, CAF2_WINDOW, MCT_DETECTOR, ZNSE_WINDOW,
};
use ftirsim::sim::calculator::{
    CalculatorError, CalculatorRequest, LineByLineCalculator, RawSpectrumRecord, TabulatedCalculator,
};
use ftirsim::sim::config::{ConfigError, InstrumentConfig, PipelineConfig, SimulationRequest};
use ftirsim::sim::pipeline::{
    simulate, simulate_background, simulate_batch, simulate_sample, Measurement, SimulationError,
};

const PADDING: f64 = 10.0;

/// Synthesizes one absorption line at 2143 cm-1 on the requested step, a little beyond the range.
struct StubCalculator {
    failure: Option<CalculatorError>,
}

impl StubCalculator {
    fn working() -> Self {
        StubCalculator { failure: None }
    }

    fn failing(failure: CalculatorError) -> Self {
        StubCalculator { failure: Some(failure) }
    }
}

impl LineByLineCalculator for StubCalculator {
    fn calculate(&self, request: &CalculatorRequest) -> Result<Spectrum, CalculatorError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        let start = request.wavenumber_min - PADDING;
        let span = request.wavenumber_max - request.wavenumber_min + 2.0 * PADDING;
        let points = (span / request.wavenumber_step).floor() as usize + 1;

        let x: Vec<f64> = (0..points).map(|i| start + i as f64 * request.wavenumber_step).collect();
        let y: Vec<f64> = x.iter().map(|w| 1.0 - 0.6 / (1.0 + ((w - 2143.0) / 0.5).powi(2))).collect();
        Spectrum::new(x, y).map_err(|e| CalculatorError::Other(e.to_string()))
    }
}

fn request() -> SimulationRequest {
    serde_json::from_str(
        r#"{
            "molecule": "CO", "pressure": 0.01, "mole": 1.0, "waveMin": 1900, "waveMax": 2300,
            "resolution": 1, "zeroFill": 0, "numScan": 0, "beamsplitter": "AR_ZnSe",
            "cellWindow": "CaF2", "detector": "MCT", "source": 1700
        }"#,
    )
    .unwrap()
}

fn config(scans: u32) -> InstrumentConfig {
    InstrumentConfig::try_from(SimulationRequest { num_scan: Some(scans), ..request() }).unwrap()
}

fn uncropped() -> PipelineConfig {
    PipelineConfig { crop: false, ..PipelineConfig::default() }
}

fn assert_relative_eq(a: &[f64], b: &[f64], tolerance: f64) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() <= tolerance * x.abs().max(y.abs()).max(1e-300), "{} != {}", x, y);
    }
}

#[test]
fn background_through_mct_path_is_the_explicit_product() {
    let mut rng = StdRng::seed_from_u64(0);
    let measured = simulate_background(&config(0), &uncropped(), &StubCalculator::working(), &mut rng).unwrap();

    let grid = measured.ones_like();
    let source = blackbody_spectrum(&grid, 1700.0).normalized(Normalization::Max).unwrap();
    let detector = MCT_DETECTOR.evaluate(&grid).normalized(Normalization::Max).unwrap();
    let expected: Vec<f64> = grid
        .wavenumber
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            background(w)
                * source.response[i]
                * AR_ZNSE_BEAMSPLITTER.at(w)
                * CAF2_WINDOW.at(w)
                * CAF2_WINDOW.at(w)
                * ZNSE_WINDOW.at(w)
                * detector.response[i]
        })
        .collect();

    assert_relative_eq(&measured.response, &expected, 1e-12);
}

#[test]
fn sample_is_background_times_gas_transmittance() {
    let calculator = StubCalculator::working();
    let pipeline = uncropped();
    let mut rng = StdRng::seed_from_u64(0);

    let sample = simulate_sample(&config(0), &pipeline, &calculator, &mut rng).unwrap();
    let empty = simulate_background(&config(0), &pipeline, &calculator, &mut rng).unwrap();
    let gas = calculator.calculate(&CalculatorRequest::new(&config(0), &pipeline)).unwrap();

    let expected: Vec<f64> = empty.response.iter().zip(gas.response.iter()).map(|(b, g)| b * g).collect();
    assert_relative_eq(&sample.response, &expected, 1e-12);
}

#[test]
fn result_is_cropped_to_requested_range() {
    let mut rng = StdRng::seed_from_u64(0);
    let calculator = StubCalculator::working();

    let cropped = simulate_sample(&config(0), &PipelineConfig::default(), &calculator, &mut rng).unwrap();
    assert!(cropped.wavenumber[0] >= 1900.0);
    assert!(*cropped.wavenumber.last().unwrap() <= 2300.0);

    let full = simulate_sample(&config(0), &uncropped(), &calculator, &mut rng).unwrap();
    assert!(full.len() > cropped.len());
    assert!(full.wavenumber[0] < 1900.0);
}

#[test]
fn noise_follows_scan_count() {
    let calculator = StubCalculator::working();
    let pipeline = PipelineConfig::default();

    let clean = simulate_sample(&config(0), &pipeline, &calculator, &mut StdRng::seed_from_u64(1)).unwrap();
    let noisy = simulate_sample(&config(100), &pipeline, &calculator, &mut StdRng::seed_from_u64(1)).unwrap();

    let residual: Vec<f64> = noisy.response.iter().zip(clean.response.iter()).map(|(n, c)| n - c).collect();
    let expected = 0.005f64.powi(2) / 100.0;
    assert!((residual.iter().variance() / expected - 1.0).abs() < 0.25);
}

#[test]
fn seeded_runs_are_reproducible() {
    let calculator = StubCalculator::working();
    let pipeline = PipelineConfig::default();
    let a = simulate_sample(&config(16), &pipeline, &calculator, &mut StdRng::seed_from_u64(9)).unwrap();
    let b = simulate_sample(&config(16), &pipeline, &calculator, &mut StdRng::seed_from_u64(9)).unwrap();
    assert_eq!(*a.response, *b.response);
}

#[test]
fn batch_matches_individual_runs_in_order() {
    let calculator = StubCalculator::working();
    let pipeline = PipelineConfig::default();
    let configs = vec![config(1), config(10), config(25)];

    let serial = simulate_batch(Measurement::Sample, &configs, &pipeline, &calculator, 5, 1).unwrap();
    let parallel = simulate_batch(Measurement::Sample, &configs, &pipeline, &calculator, 5, 4).unwrap();

    for (i, (s, p)) in serial.iter().zip(parallel.iter()).enumerate() {
        let single = simulate(
            Measurement::Sample,
            &configs[i],
            &pipeline,
            &calculator,
            &mut StdRng::seed_from_u64(5 + i as u64),
        )
        .unwrap();
        assert_eq!(*s.as_ref().unwrap().response, *single.response);
        assert_eq!(*p.as_ref().unwrap().response, *single.response);
    }
}

#[test]
fn calculator_failures_map_to_stable_messages() {
    let pipeline = PipelineConfig::default();
    let mut rng = StdRng::seed_from_u64(0);

    let cases = [
        (CalculatorError::EmptyRange, "No line in the specified wavenumber range"),
        (
            CalculatorError::LookupFailure { molecule: "CO".to_string() },
            "HITRAN data does not exist for requested molecule.",
        ),
        (CalculatorError::Other("line database unreachable".to_string()), "line database unreachable"),
    ];

    for (failure, message) in cases {
        let err = simulate_sample(&config(0), &pipeline, &StubCalculator::failing(failure.clone()), &mut rng)
            .unwrap_err();
        assert_eq!(err, SimulationError::Calculator(failure));
        assert_eq!(err.to_string(), message);
    }
}

#[test]
fn tabulated_calculator_serves_the_pipeline() {
    let x: Vec<f64> = (0..1000).map(|i| 1800.0 + i as f64 * 0.5).collect();
    let y = vec![0.95; x.len()];
    let calculator = TabulatedCalculator::from_record(RawSpectrumRecord { molecule: "CO".to_string(), x, y }).unwrap();
    let mut rng = StdRng::seed_from_u64(0);

    let measured = simulate_sample(&config(0), &PipelineConfig::default(), &calculator, &mut rng).unwrap();
    assert_eq!(measured.wavenumber[0], 1900.0);
    assert_eq!(*measured.wavenumber.last().unwrap(), 2299.5);

    let other = InstrumentConfig::try_from(SimulationRequest { molecule: Some("NO".to_string()), ..request() }).unwrap();
    let err = simulate_sample(&other, &PipelineConfig::default(), &calculator, &mut rng).unwrap_err();
    assert_eq!(err.to_string(), "HITRAN data does not exist for requested molecule.");
}

#[test]
fn invalid_request_never_reaches_the_calculator() {
    let err: SimulationError = InstrumentConfig::try_from(SimulationRequest { source: None, ..request() })
        .map_err(SimulationError::from)
        .unwrap_err();
    assert_eq!(err, SimulationError::Config(ConfigError::MissingField("source")));
    assert_eq!(err.to_string(), "missing required parameter 'source'");
}
