//! # Posterior summaries
//!
//! Pure functions over draw arrays: scalar summaries, per-column summaries
//! of extracted matrices, and a per-component table of a whole [`Fit`] with
//! effective sample size and split-R-hat.

pub mod diagnostics;
pub mod table;

use faer::Mat;
use log::warn;
use num_traits::ToPrimitive;

use crate::inference::Fit;
use crate::utils::{column_values, usize_to_f64};
pub use diagnostics::{
    DiagnosticsError, autocorrelation, effective_sample_size, split_rhat,
};
pub use table::{render_chain_table, render_summary_table};

/// R-hat above which a component is reported as unconverged.
pub const RHAT_WARNING_THRESHOLD: f64 = 1.1;

/// Scalar posterior summary statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterSummary {
    pub mean: f64,
    /// Population standard deviation (denominator `n`).
    pub std_dev: f64,
    pub q025: f64,
    pub q50: f64,
    pub q975: f64,
}

/// Summarize a set of draws. Empty input gives all-zero statistics.
#[must_use]
pub fn summarize(values: &[f64]) -> ParameterSummary {
    if values.is_empty() {
        return ParameterSummary::default();
    }

    let n = usize_to_f64(values.len());
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|value| {
            let centered = value - mean;
            centered * centered
        })
        .sum::<f64>()
        / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    ParameterSummary {
        mean,
        std_dev: variance.sqrt(),
        q025: percentile(&sorted, 0.025),
        q50: percentile(&sorted, 0.5),
        q975: percentile(&sorted, 0.975),
    }
}

/// Summarize every column of an extracted draw matrix.
#[must_use]
pub fn summarize_columns(draws: &Mat<f64>) -> Vec<ParameterSummary> {
    (0..draws.ncols())
        .map(|col| summarize(&column_values(draws, col)))
        .collect()
}

/// Linear-interpolation percentile of sorted values; `NaN` when empty.
#[must_use]
pub fn percentile(sorted_values: &[f64], probability: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }

    let clamped = probability.clamp(0.0, 1.0);
    let last = sorted_values.len() - 1;
    let position = clamped * usize_to_f64(last);
    let lower = position.floor().to_usize().unwrap_or(0);
    let upper = position.ceil().to_usize().unwrap_or(last);

    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = position - usize_to_f64(lower);
        (1.0 - weight).mul_add(sorted_values[lower], weight * sorted_values[upper])
    }
}

/// Share of draws strictly above `threshold`.
#[must_use]
pub fn exceedance_probability(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    usize_to_f64(values.iter().filter(|value| **value > threshold).count())
        / usize_to_f64(values.len())
}

/// Summary of one scalar component of a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub summary: ParameterSummary,
    /// Split-chain ESS pooled over chains.
    pub ess: Option<f64>,
    /// `None` when chains are too short for split-R-hat.
    pub rhat: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitSummary {
    pub rows: Vec<SummaryRow>,
    pub chain_count: usize,
    pub draw_count: usize,
}

impl FitSummary {
    #[must_use]
    pub fn row(&self, name: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    #[must_use]
    pub fn max_rhat(&self) -> Option<f64> {
        self.rows.iter().filter_map(|row| row.rhat).max_by(f64::total_cmp)
    }

    #[must_use]
    pub fn min_ess(&self) -> Option<f64> {
        self.rows.iter().filter_map(|row| row.ess).min_by(f64::total_cmp)
    }

    /// Components whose split-R-hat exceeds [`RHAT_WARNING_THRESHOLD`].
    #[must_use]
    pub fn unconverged(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|row| row.rhat.is_some_and(|rhat| rhat > RHAT_WARNING_THRESHOLD))
            .map(|row| row.name.as_str())
            .collect()
    }
}

/// Summarize every scalar component of `fit`.
#[must_use]
pub fn summarize_fit(fit: &Fit) -> FitSummary {
    let rows = fit
        .component_names()
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let chains = fit.component_per_chain(index);
            SummaryRow {
                name,
                summary: summarize(&fit.component(index)),
                ess: effective_sample_size(&chains).ok(),
                rhat: split_rhat(&chains).ok(),
            }
        })
        .collect();

    let summary = FitSummary {
        rows,
        chain_count: fit.n_chains(),
        draw_count: fit.n_draws(),
    };
    let unconverged = summary.unconverged();
    if !unconverged.is_empty() {
        warn!(
            "split R-hat above {RHAT_WARNING_THRESHOLD} for {}",
            unconverged.join(", ")
        );
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn summarize_fabricated_draws_is_deterministic() {
        let draws = [1.0, 2.0, 3.0, 4.0, 5.0];
        let first = summarize(&draws);
        let second = summarize(&draws);
        assert_eq!(first, second);
        assert_relative_eq!(first.mean, 3.0);
        assert_relative_eq!(first.std_dev, 2.0_f64.sqrt());
        assert_relative_eq!(first.q50, 3.0);
        assert_relative_eq!(first.q025, 1.1);
        assert_relative_eq!(first.q975, 4.9);
    }

    #[test]
    fn summary_ignores_draw_order() {
        let forward = summarize(&[0.3, -1.2, 2.5, 0.0]);
        let shuffled = summarize(&[2.5, 0.0, 0.3, -1.2]);
        assert_relative_eq!(forward.q50, shuffled.q50);
        assert_relative_eq!(forward.q975, shuffled.q975);
        assert_relative_eq!(forward.mean, shuffled.mean, epsilon = 1e-12);
    }

    #[test]
    fn empty_draws_give_default_summary() {
        assert_eq!(summarize(&[]), ParameterSummary::default());
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn columns_are_summarized_independently() {
        let draws = Mat::from_fn(4, 2, |row, col| usize_to_f64(row) * if col == 0 { 1.0 } else { -1.0 });
        let summaries = summarize_columns(&draws);
        assert_eq!(summaries.len(), 2);
        assert_relative_eq!(summaries[0].mean, 1.5);
        assert_relative_eq!(summaries[1].mean, -1.5);
    }

    #[test]
    fn exceedance_counts_strictly_greater_draws() {
        assert_relative_eq!(exceedance_probability(&[1.0, 2.0, 3.0, 4.0], 2.0), 0.5);
    }
}
