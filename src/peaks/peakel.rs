use std::cmp;
use std::fmt;
use std::slice;

use mzpeaks::coordinate::{CoordinateLike, Time, MZ};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::peak::Peak;

/// An unbroken chromatographic trace of one isotopic peak across consecutive spectra.
///
/// The representative `mz` and `retention_time` are those of the peak the
/// peakel was seeded with and never change afterwards, so a [`Peakel`] can
/// keep accumulating peaks while it is stored in an ordered
/// [`MZRTField`](crate::field::MZRTField). The member peaks are kept in
/// non-decreasing retention time order.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Peakel {
    mz: f64,
    retention_time: f64,
    peaks: Vec<Peak>,
}

impl Peakel {
    /// Create a new peakel anchored on `peak`
    pub fn new(peak: Peak) -> Self {
        Self {
            mz: peak.mz,
            retention_time: peak.retention_time,
            peaks: vec![peak],
        }
    }

    /// The m/z of the anchor peak
    #[inline]
    pub fn mz(&self) -> f64 {
        self.mz
    }

    /// The retention time of the anchor peak
    #[inline]
    pub fn retention_time(&self) -> f64 {
        self.retention_time
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn iter(&self) -> slice::Iter<'_, Peak> {
        self.peaks.iter()
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Add `peak` to the trace, keeping the retention time order.
    ///
    /// Peaks arrive in time order when spectra are processed sequentially, so this
    /// is almost always an append.
    pub fn push(&mut self, peak: Peak) {
        match self.peaks.last() {
            Some(last) if last.retention_time > peak.retention_time => {
                let i = self
                    .peaks
                    .partition_point(|p| p.retention_time <= peak.retention_time);
                self.peaks.insert(i, peak);
            }
            _ => self.peaks.push(peak),
        }
    }

    pub fn start_time(&self) -> f64 {
        self.peaks
            .first()
            .map(|p| p.retention_time)
            .unwrap_or(self.retention_time)
    }

    pub fn end_time(&self) -> f64 {
        self.peaks
            .last()
            .map(|p| p.retention_time)
            .unwrap_or(self.retention_time)
    }

    /// Whether `time` falls within the peakel's time span widened by `tolerance`
    pub fn contains_time(&self, time: f64, tolerance: f64) -> bool {
        (self.start_time() - tolerance) <= time && time <= (self.end_time() + tolerance)
    }

    /// Whether the time spans of `self` and `other` overlap once widened by `tolerance`
    pub fn overlaps(&self, other: &Peakel, tolerance: f64) -> bool {
        self.start_time() - tolerance <= other.end_time()
            && other.start_time() <= self.end_time() + tolerance
    }

    /// The most intense member peak
    pub fn apex(&self) -> Option<&Peak> {
        self.peaks
            .iter()
            .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
    }

    pub fn total_intensity(&self) -> f64 {
        self.peaks.iter().map(|p| p.intensity).sum()
    }

    /// Integrate the apex intensities over retention time with the trapezoid rule
    pub fn area(&self) -> f64 {
        self.peaks
            .windows(2)
            .map(|w| {
                let dt = w[1].retention_time - w[0].retention_time;
                (w[0].intensity + w[1].intensity) * dt / 2.0
            })
            .sum()
    }
}

impl fmt::Display for Peakel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Peakel({}, rt=[{}, {}], <{} peaks>)",
            self.mz,
            self.start_time(),
            self.end_time(),
            self.len()
        )
    }
}

impl cmp::PartialOrd<Peakel> for Peakel {
    fn partial_cmp(&self, other: &Peakel) -> Option<cmp::Ordering> {
        match self.mz.partial_cmp(&other.mz) {
            Some(cmp::Ordering::Equal) => self.retention_time.partial_cmp(&other.retention_time),
            ord => ord,
        }
    }
}

impl cmp::PartialEq<Peakel> for Peakel {
    fn eq(&self, other: &Peakel) -> bool {
        (self.mz - other.mz).abs() <= super::peak::PEAK_EQUALITY_TOLERANCE
            && (self.retention_time - other.retention_time).abs()
                <= super::peak::PEAK_EQUALITY_TOLERANCE
            && self.peaks == other.peaks
    }
}

impl CoordinateLike<MZ> for Peakel {
    #[inline]
    fn coordinate(&self) -> f64 {
        self.mz
    }
}

impl CoordinateLike<Time> for Peakel {
    #[inline]
    fn coordinate(&self) -> f64 {
        self.retention_time
    }
}

impl<'a> IntoIterator for &'a Peakel {
    type Item = &'a Peak;
    type IntoIter = slice::Iter<'a, Peak>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn peak_at(mz: f64, intensity: f64, rt: f64) -> Peak {
        Peak::new(mz, intensity, mz - 0.01, mz + 0.01, intensity * 0.02).with_spectrum(rt, 0)
    }

    #[test]
    fn test_anchor_is_fixed() {
        let mut peakel = Peakel::new(peak_at(400.0, 100.0, 5.0));
        peakel.push(peak_at(400.004, 300.0, 6.0));
        peakel.push(peak_at(399.998, 200.0, 7.0));
        assert_eq!(peakel.mz(), 400.0);
        assert_eq!(peakel.retention_time(), 5.0);
        assert_eq!(peakel.len(), 3);
        assert_eq!(peakel.apex().unwrap().intensity, 300.0);
        assert_eq!(peakel.total_intensity(), 600.0);
        assert!((peakel.area() - 450.0).abs() < 1e-9);
    }

    #[test]
    fn test_push_keeps_time_order() {
        let mut peakel = Peakel::new(peak_at(400.0, 100.0, 5.0));
        peakel.push(peak_at(400.0, 100.0, 7.0));
        peakel.push(peak_at(400.0, 100.0, 6.0));
        let times: Vec<f64> = peakel.iter().map(|p| p.retention_time).collect();
        assert_eq!(times, vec![5.0, 6.0, 7.0]);
        assert_eq!(peakel.start_time(), 5.0);
        assert_eq!(peakel.end_time(), 7.0);
    }

    #[test]
    fn test_time_span_queries() {
        let mut a = Peakel::new(peak_at(400.0, 100.0, 5.0));
        a.push(peak_at(400.0, 100.0, 8.0));
        assert!(a.contains_time(9.5, 2.0));
        assert!(!a.contains_time(10.5, 2.0));
        assert!(a.contains_time(3.0, 2.0));

        let b = Peakel::new(peak_at(401.0, 100.0, 11.0));
        assert!(!a.overlaps(&b, 2.0));
        assert!(a.overlaps(&b, 3.0));
        assert!(b.overlaps(&a, 3.0));
    }
}
