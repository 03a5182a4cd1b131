#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::signal::arrays::SignalError;
use crate::signal::stats::percentile;
use crate::signal::{DetectorKind, PeakDetector};

/// Locates candidate peak apexes in a spectrum, reporting them as indices into
/// its arrays. The arrays passed in are sorted by m/z and free of duplicates.
pub trait PeakFinder {
    fn find_peaks(&self, mz: &[f64], intensity: &[f64]) -> Result<Vec<usize>, SignalError>;
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnrFinderConfig {
    /// Number of points either side of a candidate used to estimate its noise level
    pub window_radius: usize,
    pub min_snr: f64,
}

impl Default for SnrFinderConfig {
    fn default() -> Self {
        Self {
            window_radius: 10,
            min_snr: 3.0,
        }
    }
}

/// Accept local maxima whose intensity is at least `min_snr` times the median
/// intensity of the surrounding window.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnrWindowPeakFinder {
    pub config: SnrFinderConfig,
}

impl SnrWindowPeakFinder {
    pub fn new(config: SnrFinderConfig) -> Self {
        Self { config }
    }

    fn noise_level(&self, intensity: &[f64], index: usize) -> f64 {
        let lo = index.saturating_sub(self.config.window_radius);
        let hi = (index + self.config.window_radius + 1).min(intensity.len());
        percentile(&intensity[lo..hi], 50.0)
    }
}

impl PeakFinder for SnrWindowPeakFinder {
    fn find_peaks(&self, _mz: &[f64], intensity: &[f64]) -> Result<Vec<usize>, SignalError> {
        let n = intensity.len();
        let mut candidates = Vec::new();
        for i in 0..n {
            let y = intensity[i];
            if y <= 0.0 {
                continue;
            }
            let rising = i == 0 || intensity[i - 1] < y;
            let falling = i + 1 == n || intensity[i + 1] <= y;
            if !(rising && falling) {
                continue;
            }
            let noise = self.noise_level(intensity, i);
            let snr = if noise > 0.0 { y / noise } else { f64::INFINITY };
            if snr >= self.config.min_snr {
                candidates.push(i);
            }
        }
        Ok(candidates)
    }
}

/// Use a [`PeakDetector`] to find peaks and report the samples nearest to them.
///
/// Only the position of each detected peak is kept. The m/z and intensity the
/// detector refined, including the centroid computed when
/// [`WaveletConfig::centroid`](crate::signal::WaveletConfig::centroid) is set,
/// are discarded, and the [`PeakFitter`](super::PeakFitter) refits the nearest sample.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorPeakFinder {
    pub detector: DetectorKind,
}

impl DetectorPeakFinder {
    pub fn new<D: Into<DetectorKind>>(detector: D) -> Self {
        Self {
            detector: detector.into(),
        }
    }
}

fn nearest_index(mz: &[f64], query: f64) -> usize {
    let i = mz.partition_point(|x| *x < query);
    if i == 0 {
        0
    } else if i == mz.len() {
        mz.len() - 1
    } else if (mz[i] - query) < (query - mz[i - 1]) {
        i
    } else {
        i - 1
    }
}

impl PeakFinder for DetectorPeakFinder {
    fn find_peaks(&self, mz: &[f64], intensity: &[f64]) -> Result<Vec<usize>, SignalError> {
        if mz.is_empty() {
            return Ok(Vec::new());
        }
        let detected = self.detector.detect(mz, intensity);
        let mut indices: Vec<usize> = detected.mz.iter().map(|x| nearest_index(mz, *x)).collect();
        indices.dedup();
        Ok(indices)
    }
}
