use serde::Serialize;

use super::super::domain::CriteriaRatings;

/// Mean and population variance of the five criteria, kept at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriteriaAggregate {
    pub mean: f64,
    pub variance: f64,
}

impl CriteriaAggregate {
    /// Mean rounded to one decimal place for display.
    pub fn display_mean(&self) -> f64 {
        (self.mean * 10.0).round() / 10.0
    }
}

pub(crate) fn aggregate(criteria: &CriteriaRatings) -> CriteriaAggregate {
    let values = criteria.values().map(f64::from);
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / n;

    CriteriaAggregate { mean, variance }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings(values: [u8; 5]) -> CriteriaRatings {
        let [a, b, c, d, e] = values;
        CriteriaRatings::new(a, b, c, d, e).expect("valid ratings")
    }

    #[test]
    fn uniform_ratings_have_zero_variance() {
        for value in 1..=5 {
            let result = aggregate(&ratings([value; 5]));
            assert_eq!(result.mean, f64::from(value));
            assert_eq!(result.variance, 0.0);
        }
    }

    #[test]
    fn spread_ratings_use_population_variance() {
        let result = aggregate(&ratings([1, 2, 3, 4, 5]));
        assert_eq!(result.mean, 3.0);
        assert!((result.variance - 2.0).abs() < 1e-12);
    }

    #[test]
    fn mean_is_not_rounded_before_variance() {
        let result = aggregate(&ratings([4, 4, 4, 4, 5]));
        assert!((result.mean - 4.2).abs() < 1e-12);
        assert!((result.variance - 0.16).abs() < 1e-12);
        assert_eq!(result.display_mean(), 4.2);
    }

    #[test]
    fn variance_is_never_negative() {
        for a in 1..=5 {
            for b in 1..=5 {
                let result = aggregate(&ratings([a, b, 3, 1, 5]));
                assert!(result.variance >= 0.0);
            }
        }
    }
}
