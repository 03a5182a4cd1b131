use mzfeature::detector::{FinderKind, FitterKind};
use mzfeature::extract::SnrFinderConfig;
use mzfeature::signal::LocalMaximumPeakDetector;
use mzfeature::{FeatureDetector, FeatureDetectorConfig, SpectrumData};

const SPACING: f64 = 0.005;
const START_MZ: f64 = 499.6;
const END_MZ: f64 = 502.5;
const SIGMA: f64 = 0.01;

/// The isotopes of a singly charged analyte eluting at 5.0
const ENVELOPE: [(f64, f64); 3] = [(500.0, 10000.0), (501.0, 6000.0), (502.0, 2500.0)];

fn profile_spectrum(scan_id: u64, retention_time: f64) -> SpectrumData {
    let n = ((END_MZ - START_MZ) / SPACING).round() as usize + 1;
    let elution = (-(retention_time - 5.0).powi(2) / 8.0).exp();
    let mz: Vec<f64> = (0..n).map(|i| START_MZ + i as f64 * SPACING).collect();
    let intensity: Vec<f32> = mz
        .iter()
        .map(|x| {
            ENVELOPE
                .iter()
                .map(|(center, height)| {
                    let d = x - center;
                    if d.abs() > 6.0 * SIGMA {
                        0.0
                    } else {
                        height * elution * (-(d * d) / (2.0 * SIGMA * SIGMA)).exp()
                    }
                })
                .sum::<f64>() as f32
        })
        .collect();
    SpectrumData::from_arrays(scan_id, retention_time, &mz, &intensity)
}

fn run() -> Vec<SpectrumData> {
    // acquisition order is shuffled and one spectrum is corrupt
    let mut spectra: Vec<SpectrumData> = [3, 7, 0, 10, 5, 1, 9, 2, 8, 4, 6]
        .iter()
        .map(|i| profile_spectrum(*i as u64, *i as f64))
        .collect();
    spectra.push(SpectrumData::new(
        100,
        5.5,
        vec![500.0, 500.005, 500.01],
        vec![1.0, f64::NAN, 1.0],
    ));
    spectra
}

fn check(detector: &FeatureDetector) {
    let result = detector.detect_features(&run());
    assert_eq!(result.failed_scans, vec![100]);
    assert_eq!(result.peakels.len(), 3, "{:?}", result.peakels.keys().collect::<Vec<_>>());
    assert_eq!(result.sow_summary.ambiguous, 0);

    for (_, peakel) in result.peakels.iter() {
        assert_eq!(peakel.len(), 11);
        let times: Vec<f64> = peakel.iter().map(|p| p.retention_time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        for peak in peakel.iter() {
            assert!((peak.mz - peakel.mz()).abs() <= 0.01);
        }
    }

    assert_eq!(result.features.len(), 1);
    let feature = &result.features[0];
    assert_eq!(feature.charge, 1);
    assert_eq!(feature.len(), ENVELOPE.len());
    assert!((feature.mz - 500.0).abs() < SPACING);
    assert_eq!(feature.retention_time, 5.0);
    for pair in feature.peakels.windows(2) {
        assert!((pair[1].mz() - pair[0].mz() - 1.0).abs() <= 0.01);
    }
    assert!((feature.neutral_mass() - 498.9927).abs() < 0.01);
}

#[test_log::test]
fn test_wavelet_pipeline() {
    check(&FeatureDetector::default());
}

#[test_log::test]
fn test_local_maximum_pipeline() {
    let config = FeatureDetectorConfig {
        finder: FinderKind::Detector(LocalMaximumPeakDetector::default().into()),
        fitter: FitterKind::Apex,
        ..Default::default()
    };
    check(&FeatureDetector::from_config(&config));
}

#[test_log::test]
fn test_snr_window_pipeline() {
    let config = FeatureDetectorConfig {
        finder: FinderKind::SnrWindow(SnrFinderConfig::default()),
        ..Default::default()
    };
    check(&FeatureDetector::from_config(&config));
}
