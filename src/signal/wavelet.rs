//! Continuous wavelet transform peak detection for profile spectra.
//!
//! The signal is correlated with Ricker ("Mexican hat") wavelets over a range of
//! widths proportional to the local m/z sampling rate. Peaks are the apexes of the
//! resulting ridge lines whose correlation stands out from a local noise floor,
//! estimated as a high percentile of the narrowest-scale correlations.
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::arrays::{coalesce_duplicates, SignalError, MINIMUM_SIGNAL_POINTS};
use super::stats::{centered_moving_average, percentile};
use super::{DetectedPeaks, PeakDetector};

/// Points whose intensity is below this fraction of a neighbor's are only
/// correlated at the narrowest scale
const NEIGHBOR_DROP_RATIO: f64 = 0.75;

/// Peaks weaker than this that only matched the narrowest scale are dropped
const MINIMUM_NARROW_PEAK_INTENSITY: f64 = 2.0;

/// The noise floor never drops below this correlation value
const MINIMUM_NOISE_FLOOR: f64 = 1.0;

/// Number of neighboring columns on each side a ridge apex must exceed
const APEX_NEIGHBORHOOD: usize = 2;

/// The wavelet support extends this many widths either side of its center
const SUPPORT_WIDTHS: f64 = 3.0;

/// Parameters for [`WaveletPeakDetector`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaveletConfig {
    /// The minimum ratio of ridge correlation to local noise floor
    pub min_snr: f64,
    /// If greater than zero, keep only this many peaks, ranked by SNR
    pub fixed_peaks_keep: usize,
    /// Ridge lines and peaks closer than this are merged
    pub mz_tolerance: f64,
    /// Report intensity-weighted centroids instead of the most intense sample
    pub centroid: bool,
    pub n_scales: usize,
    pub initial_width_scaling: f64,
    pub final_width_scaling: f64,
    /// Number of points averaged to estimate the local m/z spacing
    pub spacing_window: usize,
    /// Number of correlation columns sharing a noise floor
    pub noise_bin_width: usize,
    pub noise_percentile: f64,
}

impl Default for WaveletConfig {
    fn default() -> Self {
        Self {
            min_snr: 1.0,
            fixed_peaks_keep: 0,
            mz_tolerance: 0.01,
            centroid: false,
            n_scales: 10,
            initial_width_scaling: 1.0,
            final_width_scaling: 7.0,
            spacing_window: 10,
            noise_bin_width: 300,
            noise_percentile: 95.0,
        }
    }
}

/// Wavelet correlations laid out as `n_scales` rows of `2N - 1` columns. Even
/// column `2k` is centered on point `k`, odd columns on the midpoint between
/// consecutive points.
#[derive(Debug, Clone)]
pub(crate) struct CorrelationMatrix {
    n_scales: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl CorrelationMatrix {
    fn new(n_scales: usize, n_cols: usize) -> Self {
        Self {
            n_scales,
            n_cols,
            data: vec![0.0; n_scales * n_cols],
        }
    }

    #[inline]
    pub(crate) fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n_cols + col] = value;
    }

    pub(crate) fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.n_cols..(row + 1) * self.n_cols]
    }

    /// The best scale and its correlation at every column. Ties go to the narrower scale.
    fn column_maxima(&self, skipped: &[bool]) -> Vec<(usize, f64)> {
        (0..self.n_cols)
            .map(|col| {
                let rows = if skipped[col] { 1 } else { self.n_scales };
                let mut best = (0, self.get(0, col));
                for row in 1..rows {
                    let v = self.get(row, col);
                    if v > best.1 {
                        best = (row, v);
                    }
                }
                best
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RidgeLine {
    column: usize,
    scale: usize,
    correlation: f64,
    snr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RefinedPeak {
    mz: f64,
    intensity: f64,
    snr: f64,
}

#[inline]
fn ricker(u: f64, width: f64) -> f64 {
    let norm = 2.0 / ((3.0 * width).sqrt() * PI.powf(0.25));
    let ratio = u / width;
    norm * (1.0 - ratio * ratio) * (-(u * u) / (2.0 * width * width)).exp()
}

#[inline]
fn column_to_mz(mz: &[f64], col: usize) -> f64 {
    let k = col / 2;
    if col % 2 == 0 {
        mz[k]
    } else {
        (mz[k] + mz[k + 1]) / 2.0
    }
}

#[inline]
fn column_value(values: &[f64], col: usize) -> f64 {
    let k = col / 2;
    if col % 2 == 0 {
        values[k]
    } else {
        (values[k] + values[k + 1]) / 2.0
    }
}

/// Detect peaks in profile spectra with a continuous wavelet transform
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaveletPeakDetector {
    pub config: WaveletConfig,
}

impl WaveletPeakDetector {
    pub fn new(config: WaveletConfig) -> Self {
        Self { config }
    }

    /// The wavelet widths, in units of the local sampling interval
    pub fn scales(&self) -> Vec<f64> {
        let n = self.config.n_scales.max(1);
        let start = self.config.initial_width_scaling;
        let end = self.config.final_width_scaling;
        if n == 1 {
            return vec![start];
        }
        let step = (end - start) / (n - 1) as f64;
        (0..n).map(|i| start + step * i as f64).collect()
    }

    /// Estimate the m/z sampling interval around each point.
    ///
    /// Intervals touching a zero-intensity point are not trusted, the last trusted
    /// interval is carried through them instead.
    pub(crate) fn local_spacing(&self, mz: &[f64], intensity: &[f64]) -> Vec<f64> {
        let n = mz.len();
        let raw: Vec<f64> = mz.windows(2).map(|w| w[1] - w[0]).collect();
        let is_valid =
            |i: usize| raw[i] > 0.0 && intensity[i] > 0.0 && intensity[i + 1] > 0.0;

        let first_valid = (0..raw.len())
            .find(|i| is_valid(*i))
            .map(|i| raw[i])
            .or_else(|| raw.iter().copied().find(|d| *d > 0.0))
            .unwrap_or(1.0);

        let mut last_valid = first_valid;
        let mut held = Vec::with_capacity(raw.len());
        for i in 0..raw.len() {
            if is_valid(i) {
                last_valid = raw[i];
            }
            held.push(last_valid);
        }

        let per_point: Vec<f64> = (0..n).map(|i| held[i.min(n - 2)]).collect();
        centered_moving_average(&per_point, self.config.spacing_window)
    }

    /// Points that fall sharply below a neighbor are unlikely apexes and only get
    /// the narrowest scale.
    fn narrow_only_points(intensity: &[f64]) -> Vec<bool> {
        let n = intensity.len();
        (0..n)
            .map(|i| {
                let y = intensity[i];
                (i > 0 && y < NEIGHBOR_DROP_RATIO * intensity[i - 1])
                    || (i + 1 < n && y < NEIGHBOR_DROP_RATIO * intensity[i + 1])
            })
            .collect()
    }

    fn narrow_only_columns(points: &[bool]) -> Vec<bool> {
        let n_cols = 2 * points.len() - 1;
        (0..n_cols)
            .map(|col| {
                let k = col / 2;
                if col % 2 == 0 {
                    points[k]
                } else {
                    points[k] && points[k + 1]
                }
            })
            .collect()
    }

    fn correlate(
        &self,
        mz: &[f64],
        intensity: &[f64],
        spacing: &[f64],
        scales: &[f64],
        skipped: &[bool],
    ) -> CorrelationMatrix {
        let n = mz.len();
        let n_cols = 2 * n - 1;
        let mut matrix = CorrelationMatrix::new(scales.len(), n_cols);

        for col in 0..n_cols {
            let center = column_to_mz(mz, col);
            let step = column_value(spacing, col);
            let k = col / 2;
            let rows = if skipped[col] { 1 } else { scales.len() };
            for (row, width) in scales.iter().copied().enumerate().take(rows) {
                let support = (SUPPORT_WIDTHS * width).ceil() as usize;
                let lo = k.saturating_sub(support);
                let hi = (k + support + col % 2).min(n - 1);
                let limit = SUPPORT_WIDTHS * width * step;
                let mut acc = 0.0;
                for j in lo..=hi {
                    let offset = mz[j] - center;
                    if offset.abs() > limit {
                        continue;
                    }
                    acc += intensity[j] * ricker(offset / step, width);
                }
                matrix.set(row, col, acc);
            }
        }
        matrix
    }

    /// The noise floor for each bin of `noise_bin_width` columns
    pub(crate) fn noise_floors(&self, matrix: &CorrelationMatrix) -> Vec<f64> {
        let width = self.config.noise_bin_width.max(1);
        matrix
            .row(0)
            .chunks(width)
            .map(|bin| percentile(bin, self.config.noise_percentile).max(MINIMUM_NOISE_FLOOR))
            .collect()
    }

    fn find_ridges(
        &self,
        mz: &[f64],
        maxima: &[(usize, f64)],
        floors: &[f64],
    ) -> Vec<RidgeLine> {
        let n_cols = maxima.len();
        let tolerance = self.config.mz_tolerance;
        let bin_width = self.config.noise_bin_width.max(1);
        let mut ridges: Vec<RidgeLine> = Vec::new();

        for col in 0..n_cols {
            let value = maxima[col].1;
            let lo = col.saturating_sub(APEX_NEIGHBORHOOD);
            let hi = (col + APEX_NEIGHBORHOOD).min(n_cols - 1);
            let is_apex = (lo..=hi).all(|j| j == col || value > maxima[j].1);
            if !is_apex {
                continue;
            }

            let apex_mz = column_to_mz(mz, col);
            let mut best = col;
            let mut j = col;
            while j > 0 && (apex_mz - column_to_mz(mz, j - 1)) <= tolerance {
                j -= 1;
                if maxima[j].1 > maxima[best].1 {
                    best = j;
                }
            }
            j = col;
            while j + 1 < n_cols && (column_to_mz(mz, j + 1) - apex_mz) <= tolerance {
                j += 1;
                if maxima[j].1 > maxima[best].1 {
                    best = j;
                }
            }

            let (scale, correlation) = maxima[best];
            let snr = correlation / floors[best / bin_width];
            if snr < self.config.min_snr {
                log::trace!(
                    "Rejecting ridge at {:.4} with SNR {snr:.3}",
                    column_to_mz(mz, best)
                );
                continue;
            }

            let ridge = RidgeLine {
                column: best,
                scale,
                correlation,
                snr,
            };
            match ridges.last_mut() {
                Some(last) if last.column == ridge.column => {}
                Some(last)
                    if (column_to_mz(mz, ridge.column) - column_to_mz(mz, last.column)).abs()
                        < tolerance =>
                {
                    if ridge.correlation > last.correlation {
                        *last = ridge;
                    }
                }
                _ => ridges.push(ridge),
            }
        }
        ridges
    }

    fn refine(
        &self,
        mz: &[f64],
        intensity: &[f64],
        spacing: &[f64],
        scales: &[f64],
        ridges: &[RidgeLine],
    ) -> Vec<RefinedPeak> {
        let mut peaks = Vec::with_capacity(ridges.len());
        for ridge in ridges {
            let center = column_to_mz(mz, ridge.column);
            let half_width = scales[ridge.scale] * column_value(spacing, ridge.column);
            let mut lo = mz.partition_point(|x| *x < center - half_width);
            let mut hi = mz.partition_point(|x| *x <= center + half_width);
            if lo >= hi {
                lo = (ridge.column / 2).min(mz.len() - 1);
                hi = lo + 1;
            }

            let window_mz = &mz[lo..hi];
            let window_intensity = &intensity[lo..hi];
            let max_intensity = window_intensity
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);

            let peak_mz = if self.config.centroid {
                let total: f64 = window_intensity.iter().sum();
                if total > 0.0 {
                    window_mz
                        .iter()
                        .zip(window_intensity)
                        .map(|(x, y)| x * y)
                        .sum::<f64>()
                        / total
                } else {
                    center
                }
            } else {
                let mut best = 0;
                for (i, y) in window_intensity.iter().enumerate() {
                    if *y >= window_intensity[best] {
                        best = i;
                    }
                }
                window_mz[best]
            };

            if ridge.scale == 0 && max_intensity < MINIMUM_NARROW_PEAK_INTENSITY {
                continue;
            }
            peaks.push(RefinedPeak {
                mz: peak_mz,
                intensity: max_intensity,
                snr: ridge.snr,
            });
        }

        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        let mut merged: Vec<RefinedPeak> = Vec::with_capacity(peaks.len());
        for peak in peaks {
            match merged.last_mut() {
                Some(last) if (peak.mz - last.mz) < self.config.mz_tolerance => {
                    if peak.intensity > last.intensity {
                        *last = peak;
                    }
                }
                _ => merged.push(peak),
            }
        }
        merged
    }

    fn keep_strongest(&self, mut peaks: Vec<RefinedPeak>) -> Vec<RefinedPeak> {
        let keep = self.config.fixed_peaks_keep;
        if keep == 0 || peaks.len() <= keep {
            return peaks;
        }
        let snrs: Vec<f64> = peaks.iter().map(|p| p.snr).collect();
        let cutoff = percentile(&snrs, 100.0 * (1.0 - keep as f64 / peaks.len() as f64));
        peaks.retain(|p| p.snr >= cutoff);
        if peaks.len() > keep {
            peaks.sort_by(|a, b| b.snr.total_cmp(&a.snr));
            peaks.truncate(keep);
            peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        }
        peaks
    }
}

impl PeakDetector for WaveletPeakDetector {
    fn try_detect(&self, mz: &[f64], intensity: &[f64]) -> Result<DetectedPeaks, SignalError> {
        let (mz, intensity) = coalesce_duplicates(mz, intensity)?;
        if mz.len() < MINIMUM_SIGNAL_POINTS {
            return Err(SignalError::TooFewPoints(mz.len()));
        }

        let scales = self.scales();
        let spacing = self.local_spacing(&mz, &intensity);
        let skipped = Self::narrow_only_columns(&Self::narrow_only_points(&intensity));
        let matrix = self.correlate(&mz, &intensity, &spacing, &scales, &skipped);
        let maxima = matrix.column_maxima(&skipped);
        let floors = self.noise_floors(&matrix);

        let ridges = self.find_ridges(&mz, &maxima, &floors);
        let peaks = self.refine(&mz, &intensity, &spacing, &scales, &ridges);
        let peaks = self.keep_strongest(peaks);

        Ok(peaks.into_iter().map(|p| (p.mz, p.intensity)).collect())
    }
}
