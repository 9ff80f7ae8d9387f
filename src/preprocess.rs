use crate::input::RadonData;
use crate::utils::{mean, std_dev, usize_to_f64};

/// Offset added to raw activity before taking logs, so zero readings stay finite.
pub const RADON_LOG_OFFSET: f64 = 0.1;

#[must_use]
pub fn log_transform(activity: f64, offset: f64) -> f64 {
    (activity + offset).ln()
}

/// Number of measurements per county, indexed by 0-based county code.
#[must_use]
pub fn county_counts(data: &RadonData) -> Vec<usize> {
    let mut counts = vec![0usize; data.n_counties()];
    for code in data.county.iter().copied() {
        if let Some(count) = counts.get_mut(code) {
            *count += 1;
        }
    }
    counts
}

/// Mean response per county; `NaN` for counties without measurements.
#[must_use]
pub fn county_means(data: &RadonData) -> Vec<f64> {
    let mut sums = vec![0.0; data.n_counties()];
    let counts = county_counts(data);
    for (value, code) in data.log_radon.iter().zip(&data.county) {
        if let Some(sum) = sums.get_mut(*code) {
            *sum += value;
        }
    }
    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count == 0 {
                f64::NAN
            } else {
                sum / usize_to_f64(count)
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseDiagnostics {
    pub n_rows: usize,
    pub n_counties: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub basement_share: f64,
    pub n_single_observation_counties: usize,
    pub n_empty_counties: usize,
}

#[must_use]
pub fn response_diagnostics(data: &RadonData) -> ResponseDiagnostics {
    let n_rows = data.n_obs();
    let n_basement = data.floor.iter().filter(|value| **value == 0.0).count();
    let counts = county_counts(data);

    ResponseDiagnostics {
        n_rows,
        n_counties: data.n_counties(),
        mean: mean(&data.log_radon),
        std_dev: std_dev(&data.log_radon),
        basement_share: if n_rows > 0 {
            usize_to_f64(n_basement) / usize_to_f64(n_rows)
        } else {
            0.0
        },
        n_single_observation_counties: counts.iter().filter(|count| **count == 1).count(),
        n_empty_counties: counts.iter().filter(|count| **count == 0).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RadonData {
        RadonData::new(
            vec![1.0, 3.0, 2.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0, 0, 1, 3],
            (0..4).map(|idx| format!("C{idx}")).collect(),
        )
    }

    #[test]
    fn log_transform_uses_offset() {
        assert!((log_transform(0.0, RADON_LOG_OFFSET) - 0.1_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn county_counts_include_empty_counties() {
        assert_eq!(county_counts(&table()), vec![2, 1, 0, 1]);
    }

    #[test]
    fn county_means_average_each_group() {
        let means = county_means(&table());
        assert!((means[0] - 2.0).abs() < 1e-12);
        assert!((means[1] - 2.0).abs() < 1e-12);
        assert!(means[2].is_nan());
        assert!(means[3].abs() < 1e-12);
    }

    #[test]
    fn response_diagnostics_counts_values() {
        let diag = response_diagnostics(&table());
        assert_eq!(diag.n_rows, 4);
        assert_eq!(diag.n_counties, 4);
        assert_eq!(diag.n_single_observation_counties, 2);
        assert_eq!(diag.n_empty_counties, 1);
        assert!((diag.basement_share - 0.75).abs() < 1e-12);
        assert!((diag.mean - 1.5).abs() < 1e-12);
    }
}
