//! Shared numeric helpers for aggregation
//!
//! Degenerate inputs (empty slices, single samples, zero-width spans) return
//! well-defined zero or floored values rather than erroring: an empty run is a
//! valid outcome, not a fault.

/// Minimum span, in seconds, used as the denominator of rate and throughput
/// calculations. Keeps single-sample spans from blowing up the division.
pub const MIN_SPAN_SECS: f64 = 1.0;

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (mean of squared deviations); 0.0 for an empty slice.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with Bessel's correction; 0.0 with fewer than
/// two samples.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Span between two instants in seconds, floored at [`MIN_SPAN_SECS`].
pub fn floored_span(first_secs: f64, last_secs: f64) -> f64 {
    (last_secs - first_secs).max(MIN_SPAN_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0]), 2.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_population_variance() {
        assert_eq!(population_variance(&[]), 0.0);
        assert_eq!(population_variance(&[5.0, 5.0, 5.0]), 0.0);
        // counts 2 and 4: mean 3, deviations 1 -> variance 1
        assert_eq!(population_variance(&[2.0, 4.0]), 1.0);
    }

    #[test]
    fn test_population_variance_zero_iff_all_equal() {
        assert_eq!(population_variance(&[7.0, 7.0, 7.0, 7.0]), 0.0);
        assert!(population_variance(&[7.0, 7.0, 8.0]) > 0.0);
    }

    #[test]
    fn test_sample_std_dev() {
        assert_eq!(sample_std_dev(&[]), 0.0);
        assert_eq!(sample_std_dev(&[1.0]), 0.0);
        // Two samples 1 and 3: mean 2, sum sq dev 2, Bessel divisor 1 -> sqrt(2)
        let std = sample_std_dev(&[1.0, 3.0]);
        assert!((std - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_floored_span() {
        assert_eq!(floored_span(0.0, 10.0), 10.0);
        assert_eq!(floored_span(3.0, 3.2), 1.0);
        assert_eq!(floored_span(5.0, 5.0), 1.0);
    }
}
