use std::cmp;
use std::fmt;

use mzpeaks::coordinate::{CoordinateLike, Time, MZ};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Two peak coordinates closer than this are considered equal
pub const PEAK_EQUALITY_TOLERANCE: f64 = 1e-3;

/// A peak detected in a single spectrum.
///
/// `mz` and `intensity` describe the fitted apex, `start` and `stop` the
/// m/z extent of the signal and `area` its integral. `retention_time` and
/// `scan_id` are attached by the [`PeakExtractor`](crate::extract::PeakExtractor).
#[derive(Default, Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Peak {
    pub mz: f64,
    pub intensity: f64,
    pub start: f64,
    pub stop: f64,
    pub area: f64,
    pub retention_time: f64,
    pub scan_id: u64,
}

impl Peak {
    pub fn new(mz: f64, intensity: f64, start: f64, stop: f64, area: f64) -> Self {
        Self {
            mz,
            intensity,
            start,
            stop,
            area,
            retention_time: 0.0,
            scan_id: 0,
        }
    }

    /// Attach the spectrum this peak was observed in
    pub fn with_spectrum(mut self, retention_time: f64, scan_id: u64) -> Self {
        self.retention_time = retention_time;
        self.scan_id = scan_id;
        self
    }

    /// The m/z width of the signal this peak was fit to
    pub fn width(&self) -> f64 {
        self.stop - self.start
    }
}

impl fmt::Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Peak({}, {}, rt={}, scan={})",
            self.mz, self.intensity, self.retention_time, self.scan_id
        )
    }
}

impl cmp::PartialOrd<Peak> for Peak {
    fn partial_cmp(&self, other: &Peak) -> Option<cmp::Ordering> {
        match self.mz.partial_cmp(&other.mz) {
            Some(cmp::Ordering::Equal) => self.retention_time.partial_cmp(&other.retention_time),
            ord => ord,
        }
    }
}

impl cmp::PartialEq<Peak> for Peak {
    fn eq(&self, other: &Peak) -> bool {
        if (self.mz - other.mz).abs() > PEAK_EQUALITY_TOLERANCE
            || (self.intensity - other.intensity).abs() > PEAK_EQUALITY_TOLERANCE
            || (self.retention_time - other.retention_time).abs() > PEAK_EQUALITY_TOLERANCE
        {
            return false;
        }
        self.scan_id == other.scan_id
    }
}

impl CoordinateLike<MZ> for Peak {
    #[inline]
    fn coordinate(&self) -> f64 {
        self.mz
    }
}

impl CoordinateLike<Time> for Peak {
    #[inline]
    fn coordinate(&self) -> f64 {
        self.retention_time
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tolerant_equality() {
        let a = Peak::new(500.0, 1000.0, 499.98, 500.02, 30.0).with_spectrum(12.5, 3);
        let mut b = a;
        b.mz += 1e-4;
        assert_eq!(a, b);
        b.mz += 1e-2;
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_ordering_breaks_ties_by_time() {
        let a = Peak::new(500.0, 10.0, 499.9, 500.1, 1.0).with_spectrum(10.0, 1);
        let b = Peak::new(500.0, 10.0, 499.9, 500.1, 1.0).with_spectrum(11.0, 2);
        assert!(a < b);
        assert_eq!(<Peak as CoordinateLike<Time>>::coordinate(&b), 11.0);
        assert_eq!(<Peak as CoordinateLike<MZ>>::coordinate(&b), 500.0);
    }
}
