#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::peaks::Peak;

/// Refines a candidate apex found by a [`PeakFinder`](super::PeakFinder) into a [`Peak`].
pub trait PeakFitter {
    /// Fit the peak whose apex is the sample at `index`. Returns `None` if no
    /// peak can be fit there.
    fn fit_peak(&self, mz: &[f64], intensity: &[f64], index: usize) -> Option<Peak>;
}

/// Walk down either side of `index` until reaching a local minimum or zero intensity
pub fn peak_extent(intensity: &[f64], index: usize) -> (usize, usize) {
    let mut left = index;
    while left > 0 && intensity[left] > 0.0 && intensity[left - 1] <= intensity[left] {
        left -= 1;
    }
    let mut right = index;
    while right + 1 < intensity.len()
        && intensity[right] > 0.0
        && intensity[right + 1] <= intensity[right]
    {
        right += 1;
    }
    (left, right)
}

/// Integrate the signal between `left` and `right` inclusive with the trapezoid rule
pub fn trapezoid_area(mz: &[f64], intensity: &[f64], left: usize, right: usize) -> f64 {
    (left..right)
        .map(|i| (mz[i + 1] - mz[i]) * (intensity[i] + intensity[i + 1]) / 2.0)
        .sum()
}

fn apex_peak(mz: &[f64], intensity: &[f64], index: usize, apex: (f64, f64)) -> Peak {
    let (left, right) = peak_extent(intensity, index);
    Peak::new(
        apex.0,
        apex.1,
        mz[left],
        mz[right],
        trapezoid_area(mz, intensity, left, right),
    )
}

/// Report the apex sample itself
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ApexPeakFitter;

impl PeakFitter for ApexPeakFitter {
    fn fit_peak(&self, mz: &[f64], intensity: &[f64], index: usize) -> Option<Peak> {
        if index >= mz.len() || intensity[index] <= 0.0 {
            return None;
        }
        Some(apex_peak(mz, intensity, index, (mz[index], intensity[index])))
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParabolicFitterConfig {
    /// Number of points either side of the apex included in the fit
    pub window_radius: usize,
}

impl Default for ParabolicFitterConfig {
    fn default() -> Self {
        Self { window_radius: 1 }
    }
}

/// Interpolate the apex with a least squares parabola over the points around it.
///
/// Falls back to the apex sample when the fit is not concave or its vertex
/// lands outside the fitted window.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParabolicPeakFitter {
    pub config: ParabolicFitterConfig,
}

impl ParabolicPeakFitter {
    pub fn new(config: ParabolicFitterConfig) -> Self {
        Self { config }
    }

    /// Fit `y = a + b * u + c * u^2` with `u` relative to `origin`, returning `(a, b, c)`
    fn fit_quadratic(mz: &[f64], intensity: &[f64], origin: f64) -> Option<(f64, f64, f64)> {
        let mut s = [0.0f64; 5];
        let mut t = [0.0f64; 3];
        for (x, y) in mz.iter().zip(intensity) {
            let u = x - origin;
            let mut p = 1.0;
            for (k, acc) in s.iter_mut().enumerate() {
                *acc += p;
                if k < 3 {
                    t[k] += p * y;
                }
                p *= u;
            }
        }
        let det3 = |m: [[f64; 3]; 3]| {
            m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
                - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
                + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
        };
        let normal = [[s[0], s[1], s[2]], [s[1], s[2], s[3]], [s[2], s[3], s[4]]];
        let det = det3(normal);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let mut solution = [0.0f64; 3];
        for (col, value) in solution.iter_mut().enumerate() {
            let mut m = normal;
            for row in 0..3 {
                m[row][col] = t[row];
            }
            *value = det3(m) / det;
        }
        Some((solution[0], solution[1], solution[2]))
    }
}

impl PeakFitter for ParabolicPeakFitter {
    fn fit_peak(&self, mz: &[f64], intensity: &[f64], index: usize) -> Option<Peak> {
        if index >= mz.len() || intensity[index] <= 0.0 {
            return None;
        }
        let radius = self.config.window_radius.max(1);
        let lo = index.saturating_sub(radius);
        let hi = (index + radius + 1).min(mz.len());
        let sample = (mz[index], intensity[index]);
        if hi - lo < 3 {
            return Some(apex_peak(mz, intensity, index, sample));
        }

        let origin = mz[index];
        let apex = match Self::fit_quadratic(&mz[lo..hi], &intensity[lo..hi], origin) {
            Some((a, b, c)) if c < 0.0 => {
                let u = -b / (2.0 * c);
                let x = origin + u;
                if x < mz[lo] || x > mz[hi - 1] {
                    sample
                } else {
                    (x, (a + b * u + c * u * u).max(intensity[index]))
                }
            }
            _ => sample,
        };
        Some(apex_peak(mz, intensity, index, apex))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parabola_arrays() -> (Vec<f64>, Vec<f64>) {
        let mz: Vec<f64> = (0..9).map(|i| 200.0 + i as f64 * 0.01).collect();
        let intensity = mz
            .iter()
            .map(|x| {
                let d = (x - 200.043) / 0.01;
                (100.0 - 10.0 * d * d).max(0.0)
            })
            .collect();
        (mz, intensity)
    }

    #[test]
    fn test_extent_and_area() {
        let mz = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let intensity = vec![0.0, 2.0, 4.0, 2.0, 1.0, 3.0];
        assert_eq!(peak_extent(&intensity, 2), (0, 4));
        let area = trapezoid_area(&mz, &intensity, 0, 4);
        assert!((area - 8.5).abs() < 1e-12);
    }

    #[test]
    fn test_parabolic_recovers_vertex() {
        let (mz, intensity) = parabola_arrays();
        let fitter = ParabolicPeakFitter::default();
        let peak = fitter.fit_peak(&mz, &intensity, 4).unwrap();
        assert!((peak.mz - 200.043).abs() < 1e-6, "{}", peak.mz);
        assert!((peak.intensity - 100.0).abs() < 1e-6);
        assert!(peak.start < peak.mz && peak.mz < peak.stop);
        assert!(peak.area > 0.0);

        let wide = ParabolicPeakFitter::new(ParabolicFitterConfig { window_radius: 2 });
        let peak = wide.fit_peak(&mz, &intensity, 4).unwrap();
        assert!((peak.mz - 200.043).abs() < 1e-6, "{}", peak.mz);
    }

    #[test]
    fn test_apex_fitter() {
        let (mz, intensity) = parabola_arrays();
        let peak = ApexPeakFitter.fit_peak(&mz, &intensity, 4).unwrap();
        assert_eq!(peak.mz, mz[4]);
        assert!(ApexPeakFitter.fit_peak(&mz, &intensity, 100).is_none());
    }

    #[test]
    fn test_parabolic_falls_back_on_edges() {
        let mz = vec![1.0, 2.0];
        let intensity = vec![3.0, 1.0];
        let peak = ParabolicPeakFitter::default().fit_peak(&mz, &intensity, 0).unwrap();
        assert_eq!(peak.mz, 1.0);
        assert_eq!(peak.intensity, 3.0);
    }
}
