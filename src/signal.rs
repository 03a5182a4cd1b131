//! Peak detection over a single spectrum's m/z and intensity arrays.
//!
//! Two strategies share the [`PeakDetector`] interface: [`WaveletPeakDetector`]
//! for profile data, and the much cheaper [`LocalMaximumPeakDetector`] for sparse
//! or centroided data. [`DetectorKind`] selects between them from configuration.
pub mod arrays;
pub mod local_maximum;
pub mod stats;
pub mod wavelet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use crate::signal::arrays::{coalesce_duplicates, SignalError};
pub use crate::signal::local_maximum::{LocalMaximumConfig, LocalMaximumPeakDetector};
pub use crate::signal::stats::percentile;
pub use crate::signal::wavelet::{WaveletConfig, WaveletPeakDetector};

/// The peak positions and intensities reported by a [`PeakDetector`], in ascending m/z order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DetectedPeaks {
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl DetectedPeaks {
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mz.iter().copied().zip(self.intensity.iter().copied())
    }
}

impl FromIterator<(f64, f64)> for DetectedPeaks {
    fn from_iter<T: IntoIterator<Item = (f64, f64)>>(iter: T) -> Self {
        let (mz, intensity) = iter.into_iter().unzip();
        Self { mz, intensity }
    }
}

/// A strategy for locating peaks in one spectrum.
///
/// Implementations are pure functions of their inputs, so one detector may be
/// shared between threads working on different spectra.
pub trait PeakDetector {
    /// Detect peaks, reporting why the signal could not be processed if it is malformed
    fn try_detect(&self, mz: &[f64], intensity: &[f64]) -> Result<DetectedPeaks, SignalError>;

    /// Detect peaks, treating a malformed signal as having none
    fn detect(&self, mz: &[f64], intensity: &[f64]) -> DetectedPeaks {
        match self.try_detect(mz, intensity) {
            Ok(peaks) => peaks,
            Err(err) => {
                log::debug!("Peak detection not computable: {err}");
                DetectedPeaks::default()
            }
        }
    }
}

/// The closed set of [`PeakDetector`] strategies
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DetectorKind {
    Wavelet(WaveletPeakDetector),
    LocalMaximum(LocalMaximumPeakDetector),
}

impl Default for DetectorKind {
    fn default() -> Self {
        Self::Wavelet(WaveletPeakDetector::default())
    }
}

impl From<WaveletPeakDetector> for DetectorKind {
    fn from(value: WaveletPeakDetector) -> Self {
        Self::Wavelet(value)
    }
}

impl From<LocalMaximumPeakDetector> for DetectorKind {
    fn from(value: LocalMaximumPeakDetector) -> Self {
        Self::LocalMaximum(value)
    }
}

impl PeakDetector for DetectorKind {
    fn try_detect(&self, mz: &[f64], intensity: &[f64]) -> Result<DetectedPeaks, SignalError> {
        match self {
            Self::Wavelet(detector) => detector.try_detect(mz, intensity),
            Self::LocalMaximum(detector) => detector.try_detect(mz, intensity),
        }
    }
}
