use num_traits::AsPrimitive;
use thiserror::Error;

/// The fewest points a profile signal can have and still contain a peak
pub const MINIMUM_SIGNAL_POINTS: usize = 3;

/// Reasons a signal cannot be processed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("m/z array of length {mz} does not match intensity array of length {intensity}")]
    LengthMismatch { mz: usize, intensity: usize },
    #[error("Only {0} usable points remain, at least 3 are required")]
    TooFewPoints(usize),
    #[error("Non-finite value found at index {0}")]
    NonFiniteValue(usize),
}

/// Check that `mz` and `intensity` are paired and finite
pub fn validate_arrays(mz: &[f64], intensity: &[f64]) -> Result<(), SignalError> {
    if mz.len() != intensity.len() {
        return Err(SignalError::LengthMismatch {
            mz: mz.len(),
            intensity: intensity.len(),
        });
    }
    if let Some(i) = mz
        .iter()
        .zip(intensity.iter())
        .position(|(x, y)| !x.is_finite() || !y.is_finite())
    {
        return Err(SignalError::NonFiniteValue(i));
    }
    Ok(())
}

/// Sort a signal by m/z and merge points sharing the same m/z by summing their intensities.
///
/// Applying this to already coalesced arrays returns them unchanged.
pub fn coalesce_duplicates(
    mz: &[f64],
    intensity: &[f64],
) -> Result<(Vec<f64>, Vec<f64>), SignalError> {
    validate_arrays(mz, intensity)?;

    let mut order: Vec<usize> = (0..mz.len()).collect();
    order.sort_by(|a, b| mz[*a].total_cmp(&mz[*b]));

    let mut mz_out: Vec<f64> = Vec::with_capacity(mz.len());
    let mut intensity_out: Vec<f64> = Vec::with_capacity(mz.len());
    for i in order {
        match mz_out.last() {
            Some(last) if *last == mz[i] => {
                if let Some(acc) = intensity_out.last_mut() {
                    *acc += intensity[i];
                }
            }
            _ => {
                mz_out.push(mz[i]);
                intensity_out.push(intensity[i]);
            }
        }
    }
    Ok((mz_out, intensity_out))
}

/// Convert any primitive numeric array into `f64`, e.g. `f32` intensities
/// as they are usually stored.
pub fn to_f64_vec<T: AsPrimitive<f64>>(values: &[T]) -> Vec<f64> {
    values.iter().map(|v| v.as_()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_coalesce_sums_duplicates() {
        let mz = vec![100.2, 100.0, 100.1, 100.1, 100.3];
        let intensity = vec![4.0, 1.0, 2.0, 3.0, 5.0];
        let (x, y) = coalesce_duplicates(&mz, &intensity).unwrap();
        assert_eq!(x, vec![100.0, 100.1, 100.2, 100.3]);
        assert_eq!(y, vec![1.0, 5.0, 4.0, 5.0]);
    }

    #[test]
    fn test_coalesce_is_idempotent() {
        let mz = vec![100.2, 100.0, 100.1, 100.1, 100.3, 100.3];
        let intensity = vec![4.0, 1.0, 2.0, 3.0, 5.0, 0.5];
        let once = coalesce_duplicates(&mz, &intensity).unwrap();
        let twice = coalesce_duplicates(&once.0, &once.1).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            validate_arrays(&[1.0, 2.0], &[1.0]),
            Err(SignalError::LengthMismatch {
                mz: 2,
                intensity: 1
            })
        );
        assert_eq!(
            validate_arrays(&[1.0, f64::NAN], &[1.0, 2.0]),
            Err(SignalError::NonFiniteValue(1))
        );
        assert!(validate_arrays(&[1.0, 2.0], &[0.0, 2.0]).is_ok());
    }

    #[test]
    fn test_convert() {
        let v: Vec<f32> = vec![1.5, 2.5];
        assert_eq!(to_f64_vec(&v), vec![1.5, 2.5]);
    }
}
