//! Grow chromatographic [`Peakel`]s by linking each spectrum's peaks to the
//! traces already in a [`PeakelField`].
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::field::{EntryId, PeakelField};
use crate::mass_error::MassErrorType;
use crate::peaks::{Peak, Peakel};

/// What happened to a peak sown into a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SowOutcome {
    /// No peakel matched, so a new one was started
    Created(EntryId),
    /// The peak was appended to the only matching peakel
    Extended(EntryId),
    /// More than one peakel matched and the peak was dropped, leaving all of them untouched
    Ambiguous(Vec<EntryId>),
    /// The peak could not be stored in the field
    Rejected,
}

/// Tallies of [`SowOutcome`]s over many peaks
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SowSummary {
    pub created: usize,
    pub extended: usize,
    pub ambiguous: usize,
    pub rejected: usize,
}

impl SowSummary {
    pub fn record(&mut self, outcome: &SowOutcome) {
        match outcome {
            SowOutcome::Created(_) => self.created += 1,
            SowOutcome::Extended(_) => self.extended += 1,
            SowOutcome::Ambiguous(_) => self.ambiguous += 1,
            SowOutcome::Rejected => self.rejected += 1,
        }
    }

    /// The number of peaks seen
    pub fn total(&self) -> usize {
        self.created + self.extended + self.ambiguous + self.rejected
    }
}

impl std::ops::AddAssign for SowSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.created += rhs.created;
        self.extended += rhs.extended;
        self.ambiguous += rhs.ambiguous;
        self.rejected += rhs.rejected;
    }
}

impl fmt::Display for SowSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} created, {} extended, {} ambiguous, {} rejected",
            self.created, self.extended, self.ambiguous, self.rejected
        )
    }
}

/// A strategy for assigning peaks to peakels.
///
/// Growing reads and writes the field for every peak, and the order peaks
/// arrive in decides which of them turn out ambiguous, so it is always driven
/// from a single thread.
pub trait PeakelGrower {
    /// Link `peak` into `field`
    fn sow_peak(&self, field: &mut PeakelField, peak: Peak) -> SowOutcome;

    /// Sow all the peaks of one spectrum
    fn sow_peaks(&self, field: &mut PeakelField, peaks: Vec<Peak>) -> SowSummary {
        let mut summary = SowSummary::default();
        for peak in peaks {
            summary.record(&self.sow_peak(field, peak));
        }
        summary
    }

    /// Sow the peaks of many spectra, one spectrum at a time in increasing
    /// retention time order
    fn sow_spectra(&self, field: &mut PeakelField, mut spectra: Vec<Vec<Peak>>) -> SowSummary {
        spectra.sort_by(|a, b| spectrum_time(a).total_cmp(&spectrum_time(b)));
        let mut summary = SowSummary::default();
        for peaks in spectra {
            summary += self.sow_peaks(field, peaks);
        }
        summary
    }
}

fn spectrum_time(peaks: &[Peak]) -> f64 {
    peaks
        .first()
        .map(|p| p.retention_time)
        .unwrap_or(f64::NEG_INFINITY)
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrowerConfig {
    pub tolerance_mz: f64,
    /// How far outside a peakel's current time span a peak may fall and still extend it
    pub tolerance_retention_time: f64,
    pub mass_error_type: MassErrorType,
}

impl Default for GrowerConfig {
    fn default() -> Self {
        Self {
            tolerance_mz: 0.01,
            tolerance_retention_time: 10.0,
            mass_error_type: MassErrorType::Exact,
        }
    }
}

/// Link a peak to the peakel whose anchor m/z is within tolerance and whose time
/// span, widened by the retention time tolerance, contains the peak.
///
/// When several peakels qualify, none of them is chosen. The conflict is logged
/// and the peak is dropped.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProximityGrower {
    pub config: GrowerConfig,
}

impl ProximityGrower {
    pub fn new(config: GrowerConfig) -> Self {
        Self { config }
    }

    pub fn with_tolerances(tolerance_mz: f64, tolerance_retention_time: f64) -> Self {
        Self::new(GrowerConfig {
            tolerance_mz,
            tolerance_retention_time,
            ..Default::default()
        })
    }

    /// The peakels `peak` could extend
    pub fn candidates(&self, field: &PeakelField, peak: &Peak) -> Vec<EntryId> {
        let rt_tolerance = self.config.tolerance_retention_time;
        field.find_with(
            peak.mz,
            self.config.tolerance_mz,
            self.config.mass_error_type,
            |peakel| peakel.contains_time(peak.retention_time, rt_tolerance),
        )
    }

    fn report_ambiguous(&self, field: &PeakelField, peak: &Peak, candidates: &[EntryId]) {
        log::warn!(
            "Peak at m/z {:.4}, time {:.3} from scan {} matched {} peakels, dropping it: {}",
            peak.mz,
            peak.retention_time,
            peak.scan_id,
            candidates.len(),
            describe_candidates(field, candidates)
        );
    }
}

/// Describe each candidate peakel by id, anchor m/z and time span
fn describe_candidates(field: &PeakelField, candidates: &[EntryId]) -> String {
    candidates
        .iter()
        .filter_map(|id| {
            field.get(*id).map(|p| {
                format!(
                    "#{id} (m/z {:.4}, {:.3}-{:.3})",
                    p.mz(),
                    p.start_time(),
                    p.end_time()
                )
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl PeakelGrower for ProximityGrower {
    fn sow_peak(&self, field: &mut PeakelField, peak: Peak) -> SowOutcome {
        let candidates = self.candidates(field, &peak);
        match candidates.len() {
            0 => match field.insert(Peakel::new(peak)) {
                Ok(id) => SowOutcome::Created(id),
                Err(e) => {
                    log::warn!("Failed to start a peakel from {peak}: {e}");
                    SowOutcome::Rejected
                }
            },
            1 => {
                let id = candidates[0];
                match field.modify(id, |peakel| peakel.push(peak)) {
                    Ok(()) => SowOutcome::Extended(id),
                    Err(e) => {
                        log::warn!("Failed to extend peakel {id} with {peak}: {e}");
                        SowOutcome::Rejected
                    }
                }
            }
            _ => {
                self.report_ambiguous(field, &peak, &candidates);
                SowOutcome::Ambiguous(candidates)
            }
        }
    }
}
