//! An ordered container of entries located in m/z and retention time,
//! supporting tolerance range scans over m/z.
use std::cmp;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use mzpeaks::coordinate::{CoordinateLike, Time, MZ};
use thiserror::Error;

use crate::mass_error::MassErrorType;
use crate::peaks::Peakel;

/// A stable handle to an entry of a [`MZRTField`]. It stays valid for the
/// lifetime of the field.
pub type EntryId = usize;

/// The ordering key of a [`MZRTField`] entry, compared by m/z, then by time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldKey {
    pub mz: f64,
    pub time: f64,
}

impl FieldKey {
    pub fn new(mz: f64, time: f64) -> Self {
        Self { mz, time }
    }

    pub fn of<T: CoordinateLike<MZ> + CoordinateLike<Time>>(entry: &T) -> Self {
        Self::new(
            <T as CoordinateLike<MZ>>::coordinate(entry),
            <T as CoordinateLike<Time>>::coordinate(entry),
        )
    }
}

impl PartialEq for FieldKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == cmp::Ordering::Equal
    }
}

impl Eq for FieldKey {}

impl PartialOrd for FieldKey {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldKey {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.mz
            .total_cmp(&other.mz)
            .then_with(|| self.time.total_cmp(&other.time))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("An entry already exists at m/z {mz} and time {time}")]
    DuplicateKey { mz: f64, time: f64 },
    #[error("No entry with id {0} exists")]
    UnknownEntry(EntryId),
}

/// A duplicate-free collection ordered by `(m/z, time)`.
///
/// Each entry's key is read once, when it is inserted, and is never recomputed.
/// Entries may be modified in place through [`MZRTField::get_mut`] or
/// [`MZRTField::modify`] without disturbing the ordering, so it is up to the
/// entry type not to let mutation move its own coordinates.
///
/// Range scans take `&self`, so a field may be searched from several threads
/// at once while nothing is writing to it.
#[derive(Debug, Clone)]
pub struct MZRTField<T> {
    entries: Vec<T>,
    keys: Vec<FieldKey>,
    index: BTreeMap<FieldKey, EntryId>,
}

impl<T> Default for MZRTField<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            keys: Vec::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<T: CoordinateLike<MZ> + CoordinateLike<Time>> MZRTField<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a field from `entries`, failing on the first duplicate key
    pub fn from_entries<I: IntoIterator<Item = T>>(entries: I) -> Result<Self, FieldError> {
        let mut field = Self::new();
        for entry in entries {
            field.insert(entry)?;
        }
        Ok(field)
    }

    /// Add `entry` to the field, returning its new handle
    pub fn insert(&mut self, entry: T) -> Result<EntryId, FieldError> {
        let key = FieldKey::of(&entry);
        if self.index.contains_key(&key) {
            return Err(FieldError::DuplicateKey {
                mz: key.mz,
                time: key.time,
            });
        }
        let id = self.entries.len();
        self.entries.push(entry);
        self.keys.push(key);
        self.index.insert(key, id);
        Ok(id)
    }
}

impl<T> MZRTField<T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    /// The key `id` was inserted under
    pub fn key(&self, id: EntryId) -> Option<FieldKey> {
        self.keys.get(id).copied()
    }

    /// Apply `f` to the entry with handle `id`
    pub fn modify<F: FnOnce(&mut T)>(&mut self, id: EntryId, f: F) -> Result<(), FieldError> {
        match self.entries.get_mut(id) {
            Some(entry) => {
                f(entry);
                Ok(())
            }
            None => Err(FieldError::UnknownEntry(id)),
        }
    }

    /// Iterate over the entries and their handles in `(m/z, time)` order
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &T)> + '_ {
        self.index.values().map(move |id| (*id, &self.entries[*id]))
    }

    /// Iterate over the keys in order
    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> + '_ {
        self.index.keys()
    }

    /// The entries in insertion order, indexable by [`EntryId`]
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<T> {
        self.entries
    }

    /// All entries whose m/z lies in `[low, high]` and satisfy `predicate`, in key order
    pub fn find_in_range<P: Fn(&T) -> bool>(
        &self,
        low: f64,
        high: f64,
        predicate: P,
    ) -> Vec<EntryId> {
        if low > high {
            return Vec::new();
        }
        let lower = FieldKey::new(low, f64::NEG_INFINITY);
        let upper = FieldKey::new(high, f64::INFINITY);
        self.index
            .range((Bound::Included(lower), Bound::Included(upper)))
            .map(|(_, id)| *id)
            .filter(|id| predicate(&self.entries[*id]))
            .collect()
    }

    /// All entries within `tolerance` m/z of `mz` which satisfy `predicate`
    pub fn find<P: Fn(&T) -> bool>(&self, mz: f64, tolerance: f64, predicate: P) -> Vec<EntryId> {
        self.find_with(mz, tolerance, MassErrorType::Exact, predicate)
    }

    /// As [`MZRTField::find`], interpreting `tolerance` according to `error_type`
    pub fn find_with<P: Fn(&T) -> bool>(
        &self,
        mz: f64,
        tolerance: f64,
        error_type: MassErrorType,
        predicate: P,
    ) -> Vec<EntryId> {
        let (low, high) = error_type.bounds(mz, tolerance);
        self.find_in_range(low, high, predicate)
    }
}

/// The field of peakels grown from a run
pub type PeakelField = MZRTField<Peakel>;

impl MZRTField<Peakel> {
    /// All peakels within `mz_tolerance` of `mz` whose time span, widened by
    /// `rt_tolerance`, contains `retention_time`
    pub fn find_overlapping(
        &self,
        mz: f64,
        mz_tolerance: f64,
        retention_time: f64,
        rt_tolerance: f64,
    ) -> Vec<EntryId> {
        self.find(mz, mz_tolerance, |peakel| {
            peakel.contains_time(retention_time, rt_tolerance)
        })
    }
}

impl<T> fmt::Display for MZRTField<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MZRTField(<{} entries>)", self.len())
    }
}
