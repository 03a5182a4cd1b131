//! Group peakels into isotopic [`Feature`]s.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::field::{EntryId, PeakelField};
use crate::peaks::{Feature, Peakel};

/// A strategy for assembling [`Feature`]s from a finished [`PeakelField`]
pub trait PeakelPicker {
    fn pick(&self, field: &PeakelField) -> Vec<Feature>;
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PickerConfig {
    pub min_charge: i32,
    pub max_charge: i32,
    /// The fewest peaks the monoisotopic peakel of a feature may have
    pub min_monoisotopic_peakel_size: usize,
    pub mz_tolerance: f64,
    /// How far apart in time an isotope peakel may be from the monoisotopic peakel
    pub rt_tolerance: f64,
    /// The fewest peakels a feature may have
    pub min_peakel_count: usize,
    /// The m/z distance between isotopes at charge 1
    pub isotope_spacing: f64,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            min_charge: 1,
            max_charge: 4,
            min_monoisotopic_peakel_size: 3,
            mz_tolerance: 0.01,
            rt_tolerance: 10.0,
            min_peakel_count: 2,
            isotope_spacing: 1.0,
        }
    }
}

/// Greedily build isotope series from each unassigned peakel in m/z order.
///
/// Charge states are tried from lowest to highest and the first one yielding an
/// acceptable series wins. A peakel belongs to at most one feature.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BasicPeakelPicker {
    pub config: PickerConfig,
}

impl BasicPeakelPicker {
    pub fn new(config: PickerConfig) -> Self {
        Self { config }
    }

    /// The unclaimed peakel nearest `target` that co-elutes with `seed`,
    /// breaking ties by apex intensity
    fn next_isotope(
        &self,
        field: &PeakelField,
        seed: &Peakel,
        target: f64,
        claimed: &[bool],
        series: &[EntryId],
    ) -> Option<EntryId> {
        let rt_tolerance = self.config.rt_tolerance;
        let apex_intensity =
            |id: EntryId| field.get(id).and_then(|p| p.apex()).map(|a| a.intensity).unwrap_or(0.0);
        field
            .find(target, self.config.mz_tolerance, |p| p.overlaps(seed, rt_tolerance))
            .into_iter()
            .filter(|id| !claimed[*id] && !series.contains(id))
            .min_by(|a, b| {
                let da = field.get(*a).map(|p| (p.mz() - target).abs()).unwrap_or(f64::INFINITY);
                let db = field.get(*b).map(|p| (p.mz() - target).abs()).unwrap_or(f64::INFINITY);
                da.total_cmp(&db)
                    .then_with(|| apex_intensity(*b).total_cmp(&apex_intensity(*a)))
            })
    }

    /// Extend an isotope series from `seed_id` assuming charge `charge`.
    ///
    /// Each isotope is searched one step above the previous member rather than
    /// `k` steps above the seed, so small m/z errors may accumulate along the series.
    fn isotope_series(
        &self,
        field: &PeakelField,
        seed_id: EntryId,
        seed: &Peakel,
        charge: i32,
        claimed: &[bool],
    ) -> Vec<EntryId> {
        let step = self.config.isotope_spacing / charge as f64;
        let mut series = vec![seed_id];
        let mut last_mz = seed.mz();
        while let Some(id) = self.next_isotope(field, seed, last_mz + step, claimed, &series) {
            series.push(id);
            match field.get(id) {
                Some(p) => last_mz = p.mz(),
                None => break,
            }
        }
        series
    }
}

impl PeakelPicker for BasicPeakelPicker {
    fn pick(&self, field: &PeakelField) -> Vec<Feature> {
        let mut claimed = vec![false; field.len()];
        let mut features = Vec::new();
        let min_charge = self.config.min_charge.max(1);

        for (seed_id, seed) in field.iter() {
            if claimed[seed_id] || seed.len() < self.config.min_monoisotopic_peakel_size {
                continue;
            }
            for charge in min_charge..=self.config.max_charge {
                let series = self.isotope_series(field, seed_id, seed, charge, &claimed);
                if series.len() < self.config.min_peakel_count {
                    continue;
                }
                let peakels: Vec<Peakel> = series
                    .iter()
                    .filter_map(|id| field.get(*id).cloned())
                    .collect();
                for id in series.iter() {
                    claimed[*id] = true;
                }
                let feature = Feature::new(charge, peakels, series);
                log::trace!("Picked {feature}");
                features.push(feature);
                break;
            }
        }
        features
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::peaks::Peak;

    fn peakel(mz: f64, start: f64, n_peaks: usize, height: f64) -> Peakel {
        let mut peakel = Peakel::new(Peak::new(mz, height, mz, mz, 0.0).with_spectrum(start, 0));
        for i in 1..n_peaks {
            peakel.push(
                Peak::new(mz, height, mz, mz, 0.0).with_spectrum(start + i as f64, i as u64),
            );
        }
        peakel
    }

    fn picker(min_peakel_count: usize) -> BasicPeakelPicker {
        BasicPeakelPicker::new(PickerConfig {
            min_peakel_count,
            ..Default::default()
        })
    }

    #[test]
    fn test_min_peakel_count() {
        let mut field =
            PeakelField::from_entries(vec![peakel(500.0, 10.0, 5, 100.0), peakel(501.0, 10.0, 5, 60.0)])
                .unwrap();
        assert!(picker(3).pick(&field).is_empty());

        field.insert(peakel(502.001, 11.0, 4, 30.0)).unwrap();
        let features = picker(3).pick(&field);
        assert_eq!(features.len(), 1);
        let feature = &features[0];
        assert_eq!(feature.charge, 1);
        assert_eq!(feature.len(), 3);
        assert_eq!(feature.peakel_ids, vec![0, 1, 2]);
        assert_eq!(feature.mz, 500.0);
    }

    #[test]
    fn test_min_monoisotopic_size() {
        let field =
            PeakelField::from_entries(vec![peakel(500.0, 10.0, 2, 100.0), peakel(501.0, 10.0, 5, 60.0)])
                .unwrap();
        assert!(picker(2).pick(&field).is_empty());

        let relaxed = BasicPeakelPicker::new(PickerConfig {
            min_monoisotopic_peakel_size: 2,
            ..Default::default()
        });
        assert_eq!(relaxed.pick(&field).len(), 1);
    }

    #[test]
    fn test_charge_and_spacing() {
        let field = PeakelField::from_entries(vec![
            peakel(400.0, 20.0, 6, 100.0),
            peakel(400.502, 20.0, 6, 80.0),
            peakel(400.996, 21.0, 5, 50.0),
            peakel(700.0, 20.0, 6, 100.0),
            peakel(700.334, 20.0, 6, 80.0),
            // elutes too late to belong with 700.0
            peakel(700.667, 60.0, 6, 50.0),
        ])
        .unwrap();
        let features = picker(2).pick(&field);
        assert_eq!(features.len(), 2);

        // charge 1 is tried first, and 400.996 is one unit away from 400.0
        assert_eq!(features[0].charge, 1);
        assert_eq!(features[0].peakel_ids, vec![0, 2]);
        assert_eq!(features[1].charge, 3);
        assert_eq!(features[1].peakel_ids, vec![3, 4]);

        for feature in features.iter() {
            let step = 1.0 / feature.charge as f64;
            for pair in feature.peakels.windows(2) {
                assert!((pair[1].mz() - pair[0].mz() - step).abs() <= 0.01);
            }
        }
    }

    #[test]
    fn test_peakels_claimed_once() {
        let field = PeakelField::from_entries(vec![
            peakel(500.0, 10.0, 5, 100.0),
            peakel(501.0, 10.0, 5, 60.0),
            peakel(502.0, 10.0, 5, 30.0),
            peakel(503.0, 10.0, 5, 10.0),
        ])
        .unwrap();
        let features = picker(2).pick(&field);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].len(), 4);
    }

    #[test]
    fn test_isotope_search_follows_previous_member() {
        // 502.017 is 0.017 from the seed's third isotope but 0.008 from 501.009 + 1
        let field = PeakelField::from_entries(vec![
            peakel(500.0, 10.0, 5, 100.0),
            peakel(501.009, 10.0, 5, 60.0),
            peakel(502.017, 10.0, 5, 30.0),
        ])
        .unwrap();
        let features = picker(3).pick(&field);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].peakel_ids, vec![0, 1, 2]);
        for pair in features[0].peakels.windows(2) {
            assert!((pair[1].mz() - pair[0].mz() - 1.0).abs() <= 0.01);
        }
    }

    #[test]
    fn test_prefers_nearest_candidate() {
        let field = PeakelField::from_entries(vec![
            peakel(500.0, 10.0, 5, 100.0),
            peakel(500.995, 10.0, 5, 90.0),
            peakel(501.003, 10.0, 5, 40.0),
        ])
        .unwrap();
        let features = picker(2).pick(&field);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].peakel_ids, vec![0, 2]);
    }
}
