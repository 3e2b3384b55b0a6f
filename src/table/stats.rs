//! Descriptive statistics over numeric column values

use serde::Serialize;

/// Pandas-shaped descriptive block for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` when fewer than two values
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q25: f64,
    #[serde(rename = "50%")]
    pub q50: f64,
    #[serde(rename = "75%")]
    pub q75: f64,
    pub max: f64,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = sorted(values);
    percentile(&sorted, 0.5)
}

/// Linearly interpolated percentile over an already sorted slice
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let weight = rank - lo as f64;
    Some(sorted[lo] * (1.0 - weight) + sorted[hi] * weight)
}

/// Full descriptive block; `None` for an empty slice
pub fn describe(values: &[f64]) -> Option<NumericSummary> {
    let sorted = sorted(values);
    if sorted.is_empty() {
        return None;
    }
    Some(NumericSummary {
        count: sorted.len(),
        mean: mean(&sorted)?,
        std: sample_std(&sorted),
        min: sorted[0],
        q25: percentile(&sorted, 0.25)?,
        q50: percentile(&sorted, 0.5)?,
        q75: percentile(&sorted, 0.75)?,
        max: sorted[sorted.len() - 1],
    })
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn test_median_even_interpolates() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn test_median_empty() {
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_percentile_quartiles() {
        let sorted = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.25), Some(2.0));
        assert_eq!(percentile(&sorted, 0.75), Some(4.0));
    }

    #[test]
    fn test_describe() {
        let summary = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(summary.count, 8);
        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        // sample std of this classic set is ~2.138
        let std = summary.std.unwrap();
        assert!((std - 2.138).abs() < 0.001);
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let summary = describe(&[42.0]).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.std, None);
        assert_eq!(summary.q50, 42.0);
    }

    #[test]
    fn test_summary_serializes_with_percent_keys() {
        let summary = describe(&[1.0, 2.0, 3.0]).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["25%"], serde_json::json!(1.5));
        assert_eq!(json["50%"], serde_json::json!(2.0));
    }
}
