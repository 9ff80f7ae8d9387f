//! Convergence diagnostics for scalar chains.

use thiserror::Error;

use crate::utils::usize_to_f64;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticsError {
    #[error("at least {minimum} draws per chain are required; found {found}")]
    TooFewDraws { minimum: usize, found: usize },
    #[error("no chains supplied")]
    NoChains,
}

/// Lag-`k` autocorrelation for a scalar chain.
#[must_use]
pub fn autocorrelation(series: &[f64], lag: usize) -> f64 {
    if series.is_empty() || lag >= series.len() {
        return 0.0;
    }
    let mean = series.iter().sum::<f64>() / usize_to_f64(series.len());
    let variance = autocovariance(series, mean, 0);
    if variance <= 0.0 {
        return 0.0;
    }
    autocovariance(series, mean, lag) / variance
}

/// Biased (denominator `n`) lag-`k` autocovariance around `mean`.
fn autocovariance(series: &[f64], mean: f64, lag: usize) -> f64 {
    series
        .iter()
        .zip(&series[lag..])
        .map(|(left, right)| (left - mean) * (right - mean))
        .sum::<f64>()
        / usize_to_f64(series.len())
}

/// Truncate every chain to the shortest even length and cut it in half.
fn split_halves(chains: &[Vec<f64>]) -> Result<(Vec<&[f64]>, usize), DiagnosticsError> {
    let min_draws = chains
        .iter()
        .map(Vec::len)
        .min()
        .ok_or(DiagnosticsError::NoChains)?;
    let used = min_draws - (min_draws % 2);
    if used < 4 {
        return Err(DiagnosticsError::TooFewDraws {
            minimum: 4,
            found: used,
        });
    }

    let half = used / 2;
    let halves = chains
        .iter()
        .flat_map(|chain| [&chain[..half], &chain[half..used]])
        .collect();
    Ok((halves, half))
}

/// Between/within decomposition over equal-length chains.
struct ChainMoments {
    means: Vec<f64>,
    within: f64,
    var_plus: f64,
}

impl ChainMoments {
    fn new(chains: &[&[f64]], n: usize) -> Self {
        let n_f64 = usize_to_f64(n);
        let m = usize_to_f64(chains.len());
        let means = chains
            .iter()
            .map(|chain| chain.iter().sum::<f64>() / n_f64)
            .collect::<Vec<_>>();
        let within = chains
            .iter()
            .zip(&means)
            .map(|(chain, mean)| sample_variance(chain, *mean))
            .sum::<f64>()
            / m;
        let mean_of_means = means.iter().sum::<f64>() / m;
        let between = n_f64
            * means
                .iter()
                .map(|mean| {
                    let centered = *mean - mean_of_means;
                    centered * centered
                })
                .sum::<f64>()
            / (m - 1.0);
        let var_plus = ((n_f64 - 1.0) / n_f64).mul_add(within, between / n_f64);
        Self {
            means,
            within,
            var_plus,
        }
    }

    /// Combined autocorrelation at `lag` across all chains.
    fn rho(&self, chains: &[&[f64]], lag: usize) -> f64 {
        let mean_autocov = chains
            .iter()
            .zip(&self.means)
            .map(|(chain, mean)| autocovariance(chain, *mean, lag))
            .sum::<f64>()
            / usize_to_f64(chains.len());
        1.0 - (self.within - mean_autocov) / self.var_plus
    }
}

/// Effective sample size pooled over chains.
///
/// Chains are split in half as for [`split_rhat`]; autocorrelations are
/// combined across the halves and summed in lag pairs until a pair is
/// non-positive, with each pair capped by the one before it. The result
/// never exceeds the number of draws used.
///
/// # Errors
///
/// Returns `DiagnosticsError` if there are no chains or fewer than four
/// usable draws per chain.
pub fn effective_sample_size(chains: &[Vec<f64>]) -> Result<f64, DiagnosticsError> {
    let (halves, n) = split_halves(chains)?;
    let total = usize_to_f64(halves.len() * n);
    let moments = ChainMoments::new(&halves, n);
    if !(moments.var_plus.is_finite() && moments.var_plus > 0.0) {
        return Ok(total);
    }

    let mut tau = -1.0;
    let mut previous_pair = f64::INFINITY;
    let mut lag = 0;
    while lag + 1 < n {
        let pair = moments.rho(&halves, lag) + moments.rho(&halves, lag + 1);
        if pair <= 0.0 {
            break;
        }
        let pair = pair.min(previous_pair);
        tau = 2.0f64.mul_add(pair, tau);
        previous_pair = pair;
        lag += 2;
    }

    if !(tau.is_finite() && tau > 0.0) {
        return Ok(total);
    }
    Ok((total / tau).min(total))
}

/// Split-R-hat across chains.
///
/// Each chain is truncated to the shortest even length and cut in half, so
/// a single chain still yields a diagnostic.
///
/// # Errors
///
/// Returns `DiagnosticsError` if there are no chains or fewer than four
/// usable draws per chain.
pub fn split_rhat(chains: &[Vec<f64>]) -> Result<f64, DiagnosticsError> {
    let (halves, n) = split_halves(chains)?;
    let moments = ChainMoments::new(&halves, n);
    let ChainMoments {
        within, var_plus, ..
    } = moments;
    if !(within.is_finite() && within > 0.0 && var_plus.is_finite() && var_plus > 0.0) {
        return Ok(1.0);
    }
    Ok((var_plus / within).sqrt().max(1.0))
}

fn sample_variance(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values
        .iter()
        .map(|value| {
            let centered = *value - mean;
            centered * centered
        })
        .sum::<f64>()
        / usize_to_f64(values.len() - 1)
}
