//! The end to end feature detection pipeline.
//!
//! A [`FeatureDetector`] runs three stages over a batch of spectra:
//!
//! 1. Extract the peaks of every spectrum with a [`PeakExtractor`]. Spectra are
//!    independent, and are processed in parallel with the `parallelism` feature.
//! 2. Once every spectrum is extracted, sow their peaks into a [`PeakelField`] in
//!    increasing retention time order with a [`PeakelGrower`].
//! 3. Assemble [`Feature`]s from the finished field with a [`PeakelPicker`].
//!
//! A spectrum whose extraction fails is logged and skipped.
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::extract::{
    ApexPeakFitter, DetectorPeakFinder, ParabolicFitterConfig, ParabolicPeakFitter,
    PeakExtractor, PeakFinder, PeakFitter, SnrFinderConfig, SnrWindowPeakFinder, SpectrumData,
};
use crate::field::PeakelField;
use crate::grow::{GrowerConfig, PeakelGrower, ProximityGrower, SowSummary};
use crate::peaks::{Feature, Peak};
use crate::pick::{BasicPeakelPicker, PeakelPicker, PickerConfig};
use crate::signal::DetectorKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureDetectorError {
    #[error("No {0} was provided to the feature detector")]
    MissingStrategy(&'static str),
}

/// How candidate peaks are located in each spectrum
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FinderKind {
    Detector(DetectorKind),
    SnrWindow(SnrFinderConfig),
}

impl Default for FinderKind {
    fn default() -> Self {
        Self::Detector(DetectorKind::default())
    }
}

impl FinderKind {
    fn build(&self) -> Box<dyn PeakFinder + Send + Sync> {
        match self {
            Self::Detector(detector) => Box::new(DetectorPeakFinder::new(detector.clone())),
            Self::SnrWindow(config) => Box::new(SnrWindowPeakFinder::new(config.clone())),
        }
    }
}

/// How each candidate peak is refined
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FitterKind {
    Parabolic(ParabolicFitterConfig),
    Apex,
}

impl Default for FitterKind {
    fn default() -> Self {
        Self::Parabolic(ParabolicFitterConfig::default())
    }
}

impl FitterKind {
    fn build(&self) -> Box<dyn PeakFitter + Send + Sync> {
        match self {
            Self::Parabolic(config) => Box::new(ParabolicPeakFitter::new(config.clone())),
            Self::Apex => Box::new(ApexPeakFitter),
        }
    }
}

/// Selects and parameterizes every stage of a [`FeatureDetector`]
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureDetectorConfig {
    pub finder: FinderKind,
    pub fitter: FitterKind,
    pub grower: GrowerConfig,
    pub picker: PickerConfig,
}

/// The features found in a run, along with the peakel field they were picked from
#[derive(Debug, Default, Clone)]
pub struct FeatureDetectionResult {
    pub features: Vec<Feature>,
    pub peakels: PeakelField,
    pub sow_summary: SowSummary,
    /// The scan ids of the spectra whose peaks could not be extracted
    pub failed_scans: Vec<u64>,
}

impl FeatureDetectionResult {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

pub struct FeatureDetector {
    extractor: PeakExtractor,
    grower: Box<dyn PeakelGrower + Send + Sync>,
    picker: Box<dyn PeakelPicker + Send + Sync>,
}

impl FeatureDetector {
    pub fn new(
        extractor: PeakExtractor,
        grower: Box<dyn PeakelGrower + Send + Sync>,
        picker: Box<dyn PeakelPicker + Send + Sync>,
    ) -> Self {
        Self {
            extractor,
            grower,
            picker,
        }
    }

    pub fn builder() -> FeatureDetectorBuilder {
        FeatureDetectorBuilder::default()
    }

    pub fn from_config(config: &FeatureDetectorConfig) -> Self {
        Self::new(
            PeakExtractor::new(config.finder.build(), config.fitter.build()),
            Box::new(ProximityGrower::new(config.grower.clone())),
            Box::new(BasicPeakelPicker::new(config.picker.clone())),
        )
    }

    pub fn extractor(&self) -> &PeakExtractor {
        &self.extractor
    }

    /// Extract peaks from every spectrum, logging and skipping the ones that
    /// fail. The peak lists are returned in increasing retention time order.
    pub fn extract(&self, spectra: &[SpectrumData]) -> (Vec<Vec<Peak>>, Vec<u64>) {
        let results = self.extractor.extract_all(spectra);
        let mut extracted: Vec<(f64, Vec<Peak>)> = Vec::with_capacity(spectra.len());
        let mut failed = Vec::new();
        for (spectrum, result) in spectra.iter().zip(results) {
            match result {
                Ok(peaks) => extracted.push((spectrum.retention_time, peaks)),
                Err(e) => {
                    log::warn!(
                        "Skipping spectrum {} at time {:.3}: {e}",
                        spectrum.scan_id,
                        spectrum.retention_time
                    );
                    failed.push(spectrum.scan_id);
                }
            }
        }
        extracted.sort_by(|a, b| a.0.total_cmp(&b.0));
        (extracted.into_iter().map(|(_, peaks)| peaks).collect(), failed)
    }

    /// Grow a new peakel field from peak lists already in retention time order
    pub fn grow(&self, peaks_by_spectrum: Vec<Vec<Peak>>) -> (PeakelField, SowSummary) {
        let mut field = PeakelField::new();
        let mut summary = SowSummary::default();
        for peaks in peaks_by_spectrum {
            summary += self.grower.sow_peaks(&mut field, peaks);
        }
        (field, summary)
    }

    pub fn pick(&self, field: &PeakelField) -> Vec<Feature> {
        self.picker.pick(field)
    }

    /// Run the whole pipeline over `spectra`
    pub fn detect_features(&self, spectra: &[SpectrumData]) -> FeatureDetectionResult {
        let (peaks_by_spectrum, failed_scans) = self.extract(spectra);
        let n_peaks: usize = peaks_by_spectrum.iter().map(|p| p.len()).sum();
        log::debug!(
            "Extracted {n_peaks} peaks from {} of {} spectra",
            peaks_by_spectrum.len(),
            spectra.len()
        );

        let (peakels, sow_summary) = self.grow(peaks_by_spectrum);
        log::debug!("Grew {} peakels: {sow_summary}", peakels.len());

        let features = self.pick(&peakels);
        log::debug!("Picked {} features", features.len());

        FeatureDetectionResult {
            features,
            peakels,
            sow_summary,
            failed_scans,
        }
    }
}

impl Default for FeatureDetector {
    fn default() -> Self {
        Self::from_config(&FeatureDetectorConfig::default())
    }
}

/// Assemble a [`FeatureDetector`] from individual strategies. Every strategy
/// must be supplied before calling [`FeatureDetectorBuilder::build`].
#[derive(Default)]
pub struct FeatureDetectorBuilder {
    finder: Option<Box<dyn PeakFinder + Send + Sync>>,
    fitter: Option<Box<dyn PeakFitter + Send + Sync>>,
    grower: Option<Box<dyn PeakelGrower + Send + Sync>>,
    picker: Option<Box<dyn PeakelPicker + Send + Sync>>,
}

impl FeatureDetectorBuilder {
    pub fn finder<F: PeakFinder + Send + Sync + 'static>(mut self, finder: F) -> Self {
        self.finder = Some(Box::new(finder));
        self
    }

    pub fn fitter<F: PeakFitter + Send + Sync + 'static>(mut self, fitter: F) -> Self {
        self.fitter = Some(Box::new(fitter));
        self
    }

    pub fn grower<G: PeakelGrower + Send + Sync + 'static>(mut self, grower: G) -> Self {
        self.grower = Some(Box::new(grower));
        self
    }

    pub fn picker<P: PeakelPicker + Send + Sync + 'static>(mut self, picker: P) -> Self {
        self.picker = Some(Box::new(picker));
        self
    }

    pub fn build(self) -> Result<FeatureDetector, FeatureDetectorError> {
        let finder = self
            .finder
            .ok_or(FeatureDetectorError::MissingStrategy("peak finder"))?;
        let fitter = self
            .fitter
            .ok_or(FeatureDetectorError::MissingStrategy("peak fitter"))?;
        let grower = self
            .grower
            .ok_or(FeatureDetectorError::MissingStrategy("peakel grower"))?;
        let picker = self
            .picker
            .ok_or(FeatureDetectorError::MissingStrategy("peakel picker"))?;
        Ok(FeatureDetector::new(
            PeakExtractor::new(finder, fitter),
            grower,
            picker,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::signal::LocalMaximumPeakDetector;

    fn centroid_spectrum(scan_id: u64, rt: f64, peaks: &[(f64, f64)]) -> SpectrumData {
        let mut mz = Vec::new();
        let mut intensity = Vec::new();
        for (x, y) in peaks {
            mz.extend([x - 0.02, *x, x + 0.02]);
            intensity.extend([0.0, *y, 0.0]);
        }
        SpectrumData::new(scan_id, rt, mz, intensity)
    }

    fn detector() -> FeatureDetector {
        FeatureDetector::builder()
            .finder(DetectorPeakFinder::new(LocalMaximumPeakDetector::default()))
            .fitter(ApexPeakFitter)
            .grower(ProximityGrower::with_tolerances(0.01, 1.5))
            .picker(BasicPeakelPicker::default())
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_strategy() {
        let err = FeatureDetector::builder()
            .finder(SnrWindowPeakFinder::default())
            .fitter(ApexPeakFitter)
            .picker(BasicPeakelPicker::default())
            .build()
            .err()
            .unwrap();
        assert_eq!(err, FeatureDetectorError::MissingStrategy("peakel grower"));
        assert!(FeatureDetector::builder().build().is_err());
    }

    #[test_log::test]
    fn test_detect_features() {
        // out of order, with one malformed spectrum in the middle
        let mut spectra: Vec<SpectrumData> = (0..5)
            .rev()
            .map(|i| {
                let rt = i as f64;
                centroid_spectrum(i, rt, &[(400.0, 1000.0), (401.0, 500.0), (650.0, 300.0)])
            })
            .collect();
        spectra.insert(2, SpectrumData::new(99, 2.5, vec![400.0, 401.0], vec![1.0]));

        let result = detector().detect_features(&spectra);
        assert_eq!(result.failed_scans, vec![99]);
        assert_eq!(result.peakels.len(), 3);
        assert_eq!(result.sow_summary.created, 3);
        assert_eq!(result.sow_summary.extended, 12);

        assert_eq!(result.len(), 1);
        let feature = &result.features[0];
        assert_eq!(feature.charge, 1);
        assert_eq!(feature.mz, 400.0);
        assert_eq!(feature.len(), 2);
        for peakel in feature.peakels.iter() {
            let times: Vec<f64> = peakel.iter().map(|p| p.retention_time).collect();
            assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        }
    }

    #[test]
    fn test_from_config() {
        let config = FeatureDetectorConfig {
            finder: FinderKind::Detector(LocalMaximumPeakDetector::default().into()),
            fitter: FitterKind::Apex,
            ..Default::default()
        };
        let detector = FeatureDetector::from_config(&config);
        let spectrum = centroid_spectrum(1, 3.0, &[(500.0, 10.0)]);
        let peaks = detector.extractor().extract_peaks(&spectrum).unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].mz, 500.0);
        assert!(FeatureDetector::default().detect_features(&[]).is_empty());
    }
}
