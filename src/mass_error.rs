#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How an m/z error tolerance should be interpreted.
///
/// `Exact` tolerances are absolute m/z distances, `PPM` tolerances are
/// parts-per-million of the query.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MassErrorType {
    #[default]
    Exact,
    PPM,
}

impl MassErrorType {
    /// The signed error of `query` relative to `alt`, in this error unit
    pub fn call(&self, query: f64, alt: f64) -> f64 {
        match self {
            Self::Exact => query - alt,
            Self::PPM => (query - alt) / alt * 1e6,
        }
    }

    pub fn lower_bound(&self, query: f64, tolerance: f64) -> f64 {
        match self {
            Self::Exact => query - tolerance,
            Self::PPM => query - query * tolerance / 1e6,
        }
    }

    pub fn upper_bound(&self, query: f64, tolerance: f64) -> f64 {
        match self {
            Self::Exact => query + tolerance,
            Self::PPM => query + query * tolerance / 1e6,
        }
    }

    /// The closed interval of values within `tolerance` of `query`
    pub fn bounds(&self, query: f64, tolerance: f64) -> (f64, f64) {
        (
            self.lower_bound(query, tolerance),
            self.upper_bound(query, tolerance),
        )
    }

    /// Test whether `query` lies within `tolerance` of `alt`
    pub fn test(&self, query: f64, alt: f64, tolerance: f64) -> bool {
        self.call(query, alt).abs() <= tolerance
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exact_bounds() {
        let (lo, hi) = MassErrorType::Exact.bounds(500.0, 0.01);
        assert!((lo - 499.99).abs() < 1e-9);
        assert!((hi - 500.01).abs() < 1e-9);
        assert!(MassErrorType::Exact.test(500.005, 500.0, 0.01));
        assert!(!MassErrorType::Exact.test(500.02, 500.0, 0.01));
    }

    #[test]
    fn test_ppm_bounds() {
        let (lo, hi) = MassErrorType::PPM.bounds(1000.0, 10.0);
        assert!((lo - 999.99).abs() < 1e-9);
        assert!((hi - 1000.01).abs() < 1e-9);
        assert!(MassErrorType::PPM.test(1000.005, 1000.0, 10.0));
        assert!(!MassErrorType::PPM.test(1000.02, 1000.0, 10.0));
    }
}
