//! Turn each spectrum's signal into a list of [`Peak`]s.
//!
//! A [`PeakExtractor`] pairs a [`PeakFinder`], which picks the samples that look
//! like peak apexes, with a [`PeakFitter`], which refines each of them into a
//! [`Peak`]. Spectra are independent of one another, so a batch of them may be
//! extracted in parallel when the `parallelism` feature is enabled.
pub mod finder;
pub mod fitter;

use num_traits::AsPrimitive;
use thiserror::Error;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

use crate::peaks::Peak;
use crate::signal::arrays::{coalesce_duplicates, to_f64_vec, SignalError};

pub use crate::extract::finder::{
    DetectorPeakFinder, PeakFinder, SnrFinderConfig, SnrWindowPeakFinder,
};
pub use crate::extract::fitter::{
    ApexPeakFitter, ParabolicFitterConfig, ParabolicPeakFitter, PeakFitter,
};

/// One spectrum's signal and the identity it carries into the peaks extracted from it
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SpectrumData {
    pub scan_id: u64,
    pub retention_time: f64,
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl SpectrumData {
    pub fn new(scan_id: u64, retention_time: f64, mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self {
            scan_id,
            retention_time,
            mz,
            intensity,
        }
    }

    /// Build from arrays of any primitive numeric type, e.g. `f32` intensities
    pub fn from_arrays<M: AsPrimitive<f64>, I: AsPrimitive<f64>>(
        scan_id: u64,
        retention_time: f64,
        mz: &[M],
        intensity: &[I],
    ) -> Self {
        Self::new(scan_id, retention_time, to_f64_vec(mz), to_f64_vec(intensity))
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("Spectrum {scan_id} has an invalid signal: {source}")]
    InvalidSignal {
        scan_id: u64,
        #[source]
        source: SignalError,
    },
    #[error("Peak finding failed for spectrum {scan_id}: {source}")]
    FinderFailed {
        scan_id: u64,
        #[source]
        source: SignalError,
    },
}

impl ExtractionError {
    pub fn scan_id(&self) -> u64 {
        match self {
            Self::InvalidSignal { scan_id, .. } | Self::FinderFailed { scan_id, .. } => *scan_id,
        }
    }
}

/// Extracts peaks from spectra with a pluggable finder and fitter.
///
/// Extraction only reads the spectrum it is given, so one extractor can serve
/// many threads at once.
pub struct PeakExtractor {
    finder: Box<dyn PeakFinder + Send + Sync>,
    fitter: Box<dyn PeakFitter + Send + Sync>,
}

impl PeakExtractor {
    pub fn new(
        finder: Box<dyn PeakFinder + Send + Sync>,
        fitter: Box<dyn PeakFitter + Send + Sync>,
    ) -> Self {
        Self { finder, fitter }
    }

    pub fn from_strategies<F, T>(finder: F, fitter: T) -> Self
    where
        F: PeakFinder + Send + Sync + 'static,
        T: PeakFitter + Send + Sync + 'static,
    {
        Self::new(Box::new(finder), Box::new(fitter))
    }

    /// Extract the peaks of a single spectrum, tagged with its retention time and scan id.
    ///
    /// The signal is sorted and duplicate m/z values are merged before peak finding.
    pub fn extract_peaks(&self, spectrum: &SpectrumData) -> Result<Vec<Peak>, ExtractionError> {
        let (mz, intensity) = coalesce_duplicates(&spectrum.mz, &spectrum.intensity).map_err(
            |source| ExtractionError::InvalidSignal {
                scan_id: spectrum.scan_id,
                source,
            },
        )?;
        if mz.is_empty() {
            return Ok(Vec::new());
        }

        let indices =
            self.finder
                .find_peaks(&mz, &intensity)
                .map_err(|source| ExtractionError::FinderFailed {
                    scan_id: spectrum.scan_id,
                    source,
                })?;

        let mut peaks: Vec<Peak> = indices
            .into_iter()
            .filter_map(|i| self.fitter.fit_peak(&mz, &intensity, i))
            .map(|p| p.with_spectrum(spectrum.retention_time, spectrum.scan_id))
            .collect();
        peaks.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        log::trace!(
            "Extracted {} peaks from spectrum {} at {:.3}",
            peaks.len(),
            spectrum.scan_id,
            spectrum.retention_time
        );
        Ok(peaks)
    }

    /// Extract the peaks of every spectrum, returning one result per spectrum in
    /// input order. When the `parallelism` feature is enabled, spectra are
    /// processed on the [`rayon`] thread pool.
    pub fn extract_all(&self, spectra: &[SpectrumData]) -> Vec<Result<Vec<Peak>, ExtractionError>> {
        #[cfg(not(feature = "parallelism"))]
        {
            self._extract_all(spectra)
        }
        #[cfg(feature = "parallelism")]
        {
            if spectra.len() > 1 {
                self._extract_all_parallel(spectra)
            } else {
                self._extract_all(spectra)
            }
        }
    }

    fn _extract_all(&self, spectra: &[SpectrumData]) -> Vec<Result<Vec<Peak>, ExtractionError>> {
        spectra.iter().map(|s| self.extract_peaks(s)).collect()
    }

    #[cfg(feature = "parallelism")]
    fn _extract_all_parallel(
        &self,
        spectra: &[SpectrumData],
    ) -> Vec<Result<Vec<Peak>, ExtractionError>> {
        spectra.par_iter().map(|s| self.extract_peaks(s)).collect()
    }
}

impl Default for PeakExtractor {
    fn default() -> Self {
        Self::from_strategies(DetectorPeakFinder::default(), ParabolicPeakFitter::default())
    }
}
