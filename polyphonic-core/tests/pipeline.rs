use polyphonic_core::config::EngineConfig;
use polyphonic_core::fft::WindowFunction;
use polyphonic_core::noise::NoiseThreshold;
use polyphonic_core::{PitchClass, PitchEngine, PitchSet};

const SAMPLE_RATE: u32 = 44_100;
const CAPTURE_SIZE: usize = 2048;

/// A continuous signal cut into capture chunks, starting at sample `offset`.
fn tone_chunks(freqs: &[f32], amplitude: f32, offset: usize, chunks: usize) -> Vec<Vec<f32>> {
    (0..chunks)
        .map(|c| {
            (0..CAPTURE_SIZE)
                .map(|i| {
                    let n = (offset + c * CAPTURE_SIZE + i) as f64;
                    freqs
                        .iter()
                        .map(|&f| {
                            amplitude as f64
                                * (2.0 * std::f64::consts::PI * f as f64 * n / SAMPLE_RATE as f64)
                                    .sin()
                        })
                        .sum::<f64>() as f32
                })
                .collect()
        })
        .collect()
}

fn push_all(engine: &mut PitchEngine, chunks: &[Vec<f32>]) {
    for chunk in chunks {
        engine.push(chunk).unwrap();
    }
}

/// Fills the window with near-silence and runs the calibration ticks.
fn calibrated_engine(config: EngineConfig) -> PitchEngine {
    let mut engine = PitchEngine::new(config).unwrap();
    push_all(&mut engine, &tone_chunks(&[1000.0], 1e-4, 0, 4));

    for _ in 0..15 {
        assert_eq!(engine.tick().unwrap(), None);
    }
    assert!(engine.is_calibrated());
    engine
}

/// Replaces the window with `freqs` and runs one full accumulation cycle.
fn detect(engine: &mut PitchEngine, freqs: &[f32]) -> PitchSet {
    push_all(engine, &tone_chunks(freqs, 0.3, 4 * CAPTURE_SIZE, 4));
    for _ in 0..6 {
        assert_eq!(engine.tick().unwrap(), None);
    }
    engine.tick().unwrap().expect("seventh tick completes a detection pass")
}

#[test]
fn silence_then_a440_reports_a() {
    let mut engine = calibrated_engine(EngineConfig::with_sample_rate(SAMPLE_RATE));

    match engine.noise_threshold() {
        NoiseThreshold::Calibrated(threshold) => assert!(threshold > 0.0 && threshold < 0.01),
        other => panic!("expected a calibrated threshold, got {:?}", other),
    }

    let set = detect(&mut engine, &[440.0]);
    assert_eq!(set.labels(), vec!["A"]);
    assert_eq!(engine.pitch_set(), &set);
}

#[test]
fn a_and_e_are_both_reported() {
    let mut engine = calibrated_engine(EngineConfig::with_sample_rate(SAMPLE_RATE));
    let set = detect(&mut engine, &[440.0, 659.3]);
    assert_eq!(set.classes(), &[PitchClass::A, PitchClass::E]);
}

#[test]
fn c_major_triad() {
    let mut engine = calibrated_engine(EngineConfig::with_sample_rate(SAMPLE_RATE));
    let set = detect(&mut engine, &[261.63, 329.63, 392.0]);
    assert_eq!(set.to_string(), "C, E, G");
}

#[test]
fn results_are_replaced_each_cycle() {
    let mut engine = calibrated_engine(EngineConfig::with_sample_rate(SAMPLE_RATE));
    assert_eq!(detect(&mut engine, &[440.0]).labels(), vec!["A"]);

    // The next cycle reports only what is sounding now.
    let set = detect(&mut engine, &[261.63]);
    assert_eq!(set.labels(), vec!["C"]);
    assert_eq!(engine.pitch_set().labels(), vec!["C"]);
}

#[test]
fn silence_after_calibration_is_empty() {
    let mut engine = calibrated_engine(EngineConfig::with_sample_rate(SAMPLE_RATE));
    for _ in 0..6 {
        engine.tick().unwrap();
    }
    let set = engine.tick().unwrap().expect("detection pass");
    assert!(set.is_empty());
    assert_eq!(set.to_string(), "-");
}

#[test]
fn no_detection_before_calibration_completes() {
    let mut engine = PitchEngine::with_sample_rate(SAMPLE_RATE).unwrap();
    push_all(&mut engine, &tone_chunks(&[440.0], 0.3, 0, 4));
    for _ in 0..14 {
        assert_eq!(engine.tick().unwrap(), None);
    }
    assert!(!engine.is_calibrated());
    assert_eq!(engine.calibration_progress(), 14);
    assert_eq!(engine.accumulated_frames(), 0);
}

#[test]
fn shorter_accumulation_scales_the_noise_floor() {
    let config = EngineConfig {
        accumulation_frames: 3,
        calibration_frames: 5,
        ..EngineConfig::with_sample_rate(SAMPLE_RATE)
    };
    let mut engine = PitchEngine::new(config).unwrap();
    push_all(&mut engine, &tone_chunks(&[1000.0], 1e-4, 0, 4));
    for _ in 0..5 {
        engine.tick().unwrap();
    }
    let NoiseThreshold::Calibrated(threshold) = engine.noise_threshold() else {
        panic!("calibration should lock after five frames");
    };

    let single = engine
        .analyzer()
        .analyze(&tone_chunks(&[1000.0], 1e-4, 0, 4).concat())
        .unwrap()
        .max_magnitude();
    assert!((threshold - single * 3.0).abs() <= threshold * 1e-4);

    push_all(&mut engine, &tone_chunks(&[440.0], 0.3, 4 * CAPTURE_SIZE, 4));
    assert_eq!(engine.tick().unwrap(), None);
    assert_eq!(engine.tick().unwrap(), None);
    let set = engine.tick().unwrap().expect("third frame completes a pass");
    assert_eq!(set.labels(), vec!["A"]);
}

#[test]
fn rectangular_window_still_finds_a_bin_centred_tone() {
    let config = EngineConfig {
        window_function: WindowFunction::Rectangular,
        ..EngineConfig::with_sample_rate(SAMPLE_RATE)
    };
    let mut engine = calibrated_engine(config);
    // Bin 82 of an 8192-point transform at 44.1 kHz.
    let freq = 82.0 * SAMPLE_RATE as f32 / 8192.0;
    assert_eq!(detect(&mut engine, &[freq]).labels(), vec!["A"]);
}
