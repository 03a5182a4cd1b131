//! The value types flowing through feature detection: per-spectrum [`Peak`]s,
//! chromatographic [`Peakel`] traces, and isotopic [`Feature`]s.
pub mod feature;
pub mod peak;
pub mod peakel;

pub use crate::peaks::feature::Feature;
pub use crate::peaks::peak::Peak;
pub use crate::peaks::peakel::Peakel;
