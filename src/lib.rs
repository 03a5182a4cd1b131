//! `mzfeature` detects isotopic features in LC-MS runs.
//!
//! The pipeline extracts peaks from each profile spectrum, links peaks of
//! consecutive spectra into chromatographic traces ([`Peakel`]s) stored in an
//! [`MZRTField`], and finally groups co-eluting peakels spaced by isotope
//! intervals into charge-state [`Feature`]s.
//!
//! ```
//! use mzfeature::{FeatureDetector, SpectrumData};
//!
//! let spectra = vec![SpectrumData::new(0, 1.0, vec![100.0, 100.01, 100.02], vec![0.0, 10.0, 0.0])];
//! let result = FeatureDetector::default().detect_features(&spectra);
//! assert!(result.features.is_empty());
//! ```
pub mod detector;
pub mod extract;
pub mod field;
pub mod grow;
pub mod mass_error;
pub mod peaks;
pub mod pick;
pub mod signal;

pub use crate::mass_error::MassErrorType;
pub use crate::peaks::{Feature, Peak, Peakel};

pub use crate::field::{EntryId, FieldError, MZRTField, PeakelField};
pub use crate::signal::{
    DetectedPeaks, DetectorKind, LocalMaximumPeakDetector, PeakDetector, SignalError,
    WaveletPeakDetector,
};

pub use crate::extract::{ExtractionError, PeakExtractor, SpectrumData};
pub use crate::grow::{PeakelGrower, ProximityGrower, SowOutcome, SowSummary};
pub use crate::pick::{BasicPeakelPicker, PeakelPicker};

pub use crate::detector::{
    FeatureDetectionResult, FeatureDetector, FeatureDetectorBuilder, FeatureDetectorConfig,
    FeatureDetectorError,
};
