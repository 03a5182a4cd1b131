use std::cmp;
use std::fmt;

use mzpeaks::coordinate::{CoordinateLike, Time, MZ};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::peakel::Peakel;
use crate::field::EntryId;

const PROTON: f64 = 1.00727646677;

/// A charge-state isotopic envelope made of [`Peakel`]s.
///
/// Member peakels are ordered by ascending m/z, so the first one is the
/// monoisotopic peakel. A `Feature` is built once by a
/// [`PeakelPicker`](crate::pick::PeakelPicker) and not changed afterwards.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feature {
    pub mz: f64,
    pub retention_time: f64,
    pub charge: i32,
    pub peakels: Vec<Peakel>,
    /// The identifiers of the member peakels in the field they were picked from
    pub peakel_ids: Vec<EntryId>,
}

impl Feature {
    /// Build a feature from an isotopic series whose first member is the
    /// monoisotopic peakel. The feature's retention time is the time of the
    /// monoisotopic peakel's apex.
    pub fn new(charge: i32, peakels: Vec<Peakel>, peakel_ids: Vec<EntryId>) -> Self {
        let (mz, retention_time) = peakels
            .first()
            .map(|p| {
                (
                    p.mz(),
                    p.apex()
                        .map(|a| a.retention_time)
                        .unwrap_or(p.retention_time()),
                )
            })
            .unwrap_or_default();
        Self {
            mz,
            retention_time,
            charge,
            peakels,
            peakel_ids,
        }
    }

    pub fn monoisotopic_peakel(&self) -> Option<&Peakel> {
        self.peakels.first()
    }

    pub fn len(&self) -> usize {
        self.peakels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peakels.is_empty()
    }

    pub fn total_intensity(&self) -> f64 {
        self.peakels.iter().map(|p| p.total_intensity()).sum()
    }

    /// The neutral mass implied by the monoisotopic m/z and the charge
    pub fn neutral_mass(&self) -> f64 {
        let z = self.charge as f64;
        self.mz * z.abs() - z * PROTON
    }

    pub fn start_time(&self) -> f64 {
        self.peakels
            .iter()
            .map(|p| p.start_time())
            .fold(f64::INFINITY, f64::min)
    }

    pub fn end_time(&self) -> f64 {
        self.peakels
            .iter()
            .map(|p| p.end_time())
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Feature({}, {}, z={}, <{} peakels>)",
            self.mz,
            self.retention_time,
            self.charge,
            self.len()
        )
    }
}

impl cmp::PartialOrd<Feature> for Feature {
    fn partial_cmp(&self, other: &Feature) -> Option<cmp::Ordering> {
        match self.mz.partial_cmp(&other.mz) {
            Some(cmp::Ordering::Equal) => self.retention_time.partial_cmp(&other.retention_time),
            ord => ord,
        }
    }
}

impl cmp::PartialEq<Feature> for Feature {
    fn eq(&self, other: &Feature) -> bool {
        self.charge == other.charge
            && (self.mz - other.mz).abs() <= super::peak::PEAK_EQUALITY_TOLERANCE
            && (self.retention_time - other.retention_time).abs()
                <= super::peak::PEAK_EQUALITY_TOLERANCE
            && self.peakels == other.peakels
    }
}

impl CoordinateLike<MZ> for Feature {
    #[inline]
    fn coordinate(&self) -> f64 {
        self.mz
    }
}

impl CoordinateLike<Time> for Feature {
    #[inline]
    fn coordinate(&self) -> f64 {
        self.retention_time
    }
}
