//! Gaussian outlier trimming and the moments used by the grid statistics.

/// Arithmetic mean, `None` for an empty slice.
#[inline]
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Population standard deviation (divides by `N`), `None` for an empty slice.
#[inline]
pub fn population_std(samples: &[f64]) -> Option<f64> {
    let m = mean(samples)?;
    let var = samples.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / samples.len() as f64;
    Some(var.sqrt())
}

/// Keep the samples within `quantile` population standard deviations of the mean.
///
/// The output is a subsequence of `samples`: order is preserved and nothing is
/// duplicated. Input made of one repeated value is returned whole, whatever the
/// quantile, even when the computed mean is off by rounding. Empty input gives an
/// empty output.
///
/// Arguments
/// -----------------
/// * `samples` – values to filter.
/// * `quantile` – half-width of the kept band, in standard deviations
///   (`1.64` keeps ~90% of a normal distribution).
pub fn remove_outliers(samples: &[f64], quantile: f64) -> Vec<f64> {
    let Some(&first) = samples.first() else {
        return Vec::new();
    };
    if samples.iter().all(|&v| v == first) {
        return samples.to_vec();
    }
    let (Some(m), Some(s)) = (mean(samples), population_std(samples)) else {
        return Vec::new();
    };
    // rounding slack for near-constant cells
    let band = (quantile * s).max(f64::EPSILON * m.abs());
    samples
        .iter()
        .copied()
        .filter(|v| (v - m).abs() <= band)
        .collect()
}

#[cfg(test)]
mod outlier_test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(remove_outliers(&[], 1.64).is_empty());
        assert_eq!(mean(&[]), None);
        assert_eq!(population_std(&[]), None);
    }

    #[test]
    fn test_zero_variance_keeps_everything() {
        let v = vec![-3.5; 7];
        assert_eq!(remove_outliers(&v, 1.64), v);
        assert_eq!(remove_outliers(&v, 0.0), v);
    }

    #[test]
    fn test_repeated_inexact_value_keeps_everything() {
        let v = vec![0.1; 3];
        assert_ne!(mean(&v), Some(0.1));
        assert_eq!(remove_outliers(&v, 0.0), v);

        let v = vec![-2.7; 11];
        assert_eq!(remove_outliers(&v, 0.5), v);
        assert_eq!(remove_outliers(&v, 1.64), v);
    }

    #[test]
    fn test_drops_far_point() {
        let v = [1.0, 1.0, 1.0, 100.0];
        assert_eq!(remove_outliers(&v, 1.64), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_output_is_ordered_subsequence() {
        let v = [5.0, -2.0, 3.0, 40.0, 0.5, -1.0, 2.0, -35.0, 4.0];
        let kept = remove_outliers(&v, 1.0);
        let mut it = v.iter();
        for k in &kept {
            assert!(it.any(|x| x == k), "{k} out of order or duplicated");
        }
        assert!(kept.len() < v.len());
        assert!(!kept.contains(&40.0));
        assert!(!kept.contains(&-35.0));
    }

    #[test]
    fn test_population_std() {
        assert_relative_eq!(
            population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap(),
            2.0,
            epsilon = 1e-12
        );
        assert_eq!(population_std(&[3.0]), Some(0.0));
    }
}
