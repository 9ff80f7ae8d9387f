//! The result of a sampling run and named access to its draws.

use faer::Mat;

use super::compile::ParameterLayout;
use super::nuts::ChainDraws;
use super::{SamplerConfig, SamplerError};
use crate::posterior::{FitSummary, summarize_fit};
use crate::utils::usize_to_f64;

/// Per-chain sampler behaviour after warmup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainDiagnostics {
    pub chain: usize,
    pub step_size: f64,
    pub divergences: usize,
    pub mean_accept_prob: f64,
    pub mean_tree_depth: f64,
    /// Transitions that stopped at the maximum tree depth.
    pub max_treedepth_hits: usize,
}

/// Posterior draws of every chain, addressable by parameter name.
#[derive(Debug, Clone)]
pub struct Fit {
    layouts: Vec<ParameterLayout>,
    chains: Vec<ChainDraws>,
    config: SamplerConfig,
}

impl Fit {
    #[must_use]
    pub const fn new(
        layouts: Vec<ParameterLayout>,
        chains: Vec<ChainDraws>,
        config: SamplerConfig,
    ) -> Self {
        Self {
            layouts,
            chains,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SamplerConfig {
        &self.config
    }

    #[must_use]
    pub fn chains(&self) -> &[ChainDraws] {
        &self.chains
    }

    #[must_use]
    pub fn n_chains(&self) -> usize {
        self.chains.len()
    }

    /// Total retained draws across chains.
    #[must_use]
    pub fn n_draws(&self) -> usize {
        self.chains.iter().map(ChainDraws::len).sum()
    }

    /// Declared parameter names, in declaration order.
    #[must_use]
    pub fn parameter_names(&self) -> Vec<&str> {
        self.layouts.iter().map(|layout| layout.name.as_str()).collect()
    }

    /// Flat component names (`a[1]`, `a[2]`, ..., `sigma`).
    #[must_use]
    pub fn component_names(&self) -> Vec<String> {
        self.layouts
            .iter()
            .flat_map(ParameterLayout::component_names)
            .collect()
    }

    #[must_use]
    pub fn layout(&self, name: &str) -> Option<&ParameterLayout> {
        self.layouts.iter().find(|layout| layout.name == name)
    }

    fn require(&self, name: &str) -> Result<&ParameterLayout, SamplerError> {
        self.layout(name)
            .ok_or_else(|| SamplerError::UnknownParameter {
                name: name.to_string(),
            })
    }

    /// Draws of `name` merged across chains in chain order, one row per draw
    /// and one column per component.
    ///
    /// # Errors
    ///
    /// Returns `SamplerError::UnknownParameter` for undeclared names.
    pub fn extract(&self, name: &str) -> Result<Mat<f64>, SamplerError> {
        let layout = self.require(name)?;
        let rows: Vec<&Vec<f64>> = self.chains.iter().flat_map(|chain| &chain.draws).collect();
        Ok(Mat::from_fn(rows.len(), layout.len, |row, col| {
            rows[row][layout.offset + col]
        }))
    }

    /// Draws of `name`, one matrix per chain.
    ///
    /// # Errors
    ///
    /// Returns `SamplerError::UnknownParameter` for undeclared names.
    pub fn extract_per_chain(&self, name: &str) -> Result<Vec<Mat<f64>>, SamplerError> {
        let layout = self.require(name)?;
        Ok(self
            .chains
            .iter()
            .map(|chain| {
                Mat::from_fn(chain.draws.len(), layout.len, |row, col| {
                    chain.draws[row][layout.offset + col]
                })
            })
            .collect())
    }

    /// Draws of one scalar parameter (or the first component of a vector)
    /// merged across chains.
    ///
    /// # Errors
    ///
    /// Returns `SamplerError::UnknownParameter` for undeclared names.
    pub fn extract_scalar(&self, name: &str) -> Result<Vec<f64>, SamplerError> {
        let layout = self.require(name)?;
        Ok(self.component(layout.offset))
    }

    /// Merged draws of flat component `index`.
    #[must_use]
    pub fn component(&self, index: usize) -> Vec<f64> {
        self.chains
            .iter()
            .flat_map(|chain| chain.draws.iter().map(move |draw| draw[index]))
            .collect()
    }

    /// Per-chain draws of flat component `index`.
    #[must_use]
    pub fn component_per_chain(&self, index: usize) -> Vec<Vec<f64>> {
        self.chains
            .iter()
            .map(|chain| chain.draws.iter().map(|draw| draw[index]).collect())
            .collect()
    }

    #[must_use]
    pub fn chain_diagnostics(&self) -> Vec<ChainDiagnostics> {
        self.chains
            .iter()
            .enumerate()
            .map(|(chain, draws)| {
                let n = usize_to_f64(draws.len().max(1));
                ChainDiagnostics {
                    chain,
                    step_size: draws.step_size,
                    divergences: draws.divergences(),
                    mean_accept_prob: draws.accept_prob.iter().sum::<f64>() / n,
                    mean_tree_depth: draws
                        .tree_depth
                        .iter()
                        .map(|depth| usize_to_f64(*depth))
                        .sum::<f64>()
                        / n,
                    max_treedepth_hits: draws
                        .tree_depth
                        .iter()
                        .filter(|depth| **depth >= self.config.max_treedepth)
                        .count(),
                }
            })
            .collect()
    }

    /// Posterior summary with convergence diagnostics for every component.
    #[must_use]
    pub fn summary(&self) -> FitSummary {
        summarize_fit(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Bijector;

    fn fit() -> Fit {
        let layouts = vec![
            ParameterLayout {
                name: "a".to_string(),
                offset: 0,
                len: 2,
                is_scalar: false,
                bijector: Bijector::Identity,
            },
            ParameterLayout {
                name: "sigma".to_string(),
                offset: 2,
                len: 1,
                is_scalar: true,
                bijector: Bijector::Lower(0.0),
            },
        ];
        let chain = |shift: f64| ChainDraws {
            draws: vec![
                vec![1.0 + shift, 2.0 + shift, 0.5],
                vec![1.5 + shift, 2.5 + shift, 0.6],
            ],
            divergent: vec![false, true],
            tree_depth: vec![2, 10],
            accept_prob: vec![0.9, 0.7],
            step_size: 0.3,
            inv_mass: vec![1.0; 3],
        };
        Fit::new(
            layouts,
            vec![chain(0.0), chain(10.0)],
            SamplerConfig::default(),
        )
    }

    #[test]
    fn extract_merges_chains_in_order() {
        let draws = fit().extract("a").expect("a is declared");
        assert_eq!(draws.nrows(), 4);
        assert_eq!(draws.ncols(), 2);
        assert_eq!(draws[(0, 0)], 1.0);
        assert_eq!(draws[(2, 1)], 12.0);
    }

    #[test]
    fn extract_per_chain_keeps_chains_apart() {
        let chains = fit().extract_per_chain("sigma").expect("sigma is declared");
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[1].nrows(), 2);
        assert_eq!(chains[1][(1, 0)], 0.6);
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(matches!(
            fit().extract("tau"),
            Err(SamplerError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn component_names_are_one_based() {
        assert_eq!(fit().component_names(), vec!["a[1]", "a[2]", "sigma"]);
        assert_eq!(fit().parameter_names(), vec!["a", "sigma"]);
    }

    #[test]
    fn diagnostics_count_divergences_and_depth_hits() {
        let diagnostics = fit().chain_diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].divergences, 1);
        assert_eq!(diagnostics[0].max_treedepth_hits, 1);
        assert!((diagnostics[0].mean_accept_prob - 0.8).abs() < 1e-12);
        assert!((diagnostics[0].mean_tree_depth - 6.0).abs() < 1e-12);
    }
}
