#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::arrays::{validate_arrays, SignalError};
use super::{DetectedPeaks, PeakDetector};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalMaximumConfig {
    /// The full width of the sliding window, in points. A point is compared
    /// against the `window_size / 2` points on either side of it.
    pub window_size: usize,
}

impl Default for LocalMaximumConfig {
    fn default() -> Self {
        Self { window_size: 3 }
    }
}

/// Report every point strictly more intense than all other points in its window.
///
/// Cheap enough for sparse or already centroided signals where a wavelet
/// transform is not worth its cost. Windows are truncated at the ends of the
/// signal, and ties are never peaks.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalMaximumPeakDetector {
    pub config: LocalMaximumConfig,
}

impl LocalMaximumPeakDetector {
    pub fn new(config: LocalMaximumConfig) -> Self {
        Self { config }
    }

    pub fn with_window_size(window_size: usize) -> Self {
        Self::new(LocalMaximumConfig { window_size })
    }

    /// The indices of the local maxima of `intensity`
    pub fn find_maxima(&self, intensity: &[f64]) -> Vec<usize> {
        let n = intensity.len();
        let half = (self.config.window_size / 2).max(1);
        (0..n)
            .filter(|i| {
                let i = *i;
                let y = intensity[i];
                let lo = i.saturating_sub(half);
                let hi = (i + half).min(n - 1);
                (lo..=hi).all(|j| j == i || intensity[j] < y)
            })
            .collect()
    }
}

impl PeakDetector for LocalMaximumPeakDetector {
    fn try_detect(&self, mz: &[f64], intensity: &[f64]) -> Result<DetectedPeaks, SignalError> {
        validate_arrays(mz, intensity)?;
        Ok(self
            .find_maxima(intensity)
            .into_iter()
            .map(|i| (mz[i], intensity[i]))
            .collect())
    }
}
