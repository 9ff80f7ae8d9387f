//! # Inference
//!
//! Turns a [`ModelSpec`] plus a [`DataBinding`] into posterior draws.
//!
//! The pipeline is: [`compile`] the specification into a [`LogDensity`] on
//! the unconstrained space, run one NUTS chain per configured chain on a
//! scoped thread, and collect the constrained draws into a [`Fit`].

pub mod adapt;
pub mod compile;
pub mod fit;
pub mod hmc;
pub mod nuts;
pub mod transforms;

use log::{info, warn};
use thiserror::Error;

use crate::spec::{DataBinding, ModelSpec};
pub use compile::{CompileError, CompiledModel, ParameterLayout, compile};
pub use fit::{ChainDiagnostics, Fit};
pub use nuts::{ChainDraws, run_chain};
pub use transforms::Bijector;

/// Errors for sampler configuration.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum InferenceError {
    #[error("iterations must be positive")]
    InvalidIterations,
    #[error("warmup ({warmup}) must be smaller than iterations ({iterations})")]
    InvalidWarmup { warmup: usize, iterations: usize },
    #[error("thinning interval must be positive")]
    InvalidThinning,
    #[error("at least one chain is required")]
    InvalidChains,
    #[error("maximum tree depth must be positive")]
    InvalidTreeDepth,
    #[error("target acceptance ({value}) must lie in (0, 1)")]
    InvalidTargetAccept { value: f64 },
    #[error("initialization radius ({value}) must be finite and non-negative")]
    InvalidInitRadius { value: f64 },
}

/// Errors raised while running the sampler.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error(transparent)]
    Config(#[from] InferenceError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("chain {chain}: no finite initial log density after {attempts} attempts")]
    InitializationFailed { chain: usize, attempts: usize },
    #[error("chain {chain} panicked")]
    ChainPanicked { chain: usize },
    #[error("unknown parameter `{name}`")]
    UnknownParameter { name: String },
}

/// Schedule and tuning of a sampling run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    /// Iterations per chain, warmup included.
    pub iterations: usize,
    pub warmup: usize,
    pub chains: usize,
    pub thin: usize,
    pub seed: u64,
    /// Offset between the seeds of consecutive chains.
    pub seed_stride: u64,
    pub max_treedepth: usize,
    pub target_accept: f64,
    /// Initial values are drawn uniformly from `(-init_radius, init_radius)`
    /// on the unconstrained scale.
    pub init_radius: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            iterations: 2_000,
            warmup: 1_000,
            chains: 4,
            thin: 1,
            seed: 42,
            seed_stride: 10_000,
            max_treedepth: 10,
            target_accept: 0.8,
            init_radius: 2.0,
        }
    }
}

impl SamplerConfig {
    /// Run `chains` chains of `iterations` each, the first half as warmup.
    #[must_use]
    pub fn with_iterations_and_chains(iterations: usize, chains: usize) -> Self {
        Self {
            iterations,
            warmup: iterations / 2,
            chains,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// # Errors
    ///
    /// Returns `InferenceError` if schedule or tuning values are invalid.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.iterations == 0 {
            return Err(InferenceError::InvalidIterations);
        }
        if self.warmup >= self.iterations {
            return Err(InferenceError::InvalidWarmup {
                warmup: self.warmup,
                iterations: self.iterations,
            });
        }
        if self.thin == 0 {
            return Err(InferenceError::InvalidThinning);
        }
        if self.chains == 0 {
            return Err(InferenceError::InvalidChains);
        }
        if self.max_treedepth == 0 {
            return Err(InferenceError::InvalidTreeDepth);
        }
        if !(self.target_accept > 0.0 && self.target_accept < 1.0) {
            return Err(InferenceError::InvalidTargetAccept {
                value: self.target_accept,
            });
        }
        if !(self.init_radius.is_finite() && self.init_radius >= 0.0) {
            return Err(InferenceError::InvalidInitRadius {
                value: self.init_radius,
            });
        }
        Ok(())
    }

    /// Number of retained draws per chain.
    #[must_use]
    pub const fn retained_draws(&self) -> usize {
        (self.iterations - self.warmup).div_ceil(self.thin)
    }

    /// Seed of chain `chain`.
    #[must_use]
    pub fn chain_seed(&self, chain: usize) -> u64 {
        let index = u64::try_from(chain).unwrap_or(u64::MAX);
        self.seed
            .wrapping_add(index.saturating_mul(self.seed_stride))
    }
}

/// A differentiable log density on an unconstrained parameter space.
pub trait LogDensity: Sync {
    fn dim(&self) -> usize;

    /// One name per component, in position order.
    fn parameter_names(&self) -> Vec<String>;

    /// Log density at `z`, writing its gradient into `grad`.
    ///
    /// Returns `f64::NEG_INFINITY` outside the support.
    fn log_density_and_gradient(&self, z: &[f64], grad: &mut [f64]) -> f64;

    /// Map unconstrained `z` to constrained parameter values.
    fn constrain(&self, z: &[f64]) -> Vec<f64>;

    fn log_density(&self, z: &[f64]) -> f64 {
        let mut grad = vec![0.0; self.dim()];
        self.log_density_and_gradient(z, &mut grad)
    }
}

/// Compile `spec` with `binding` and draw from its posterior.
///
/// Chains run in parallel on scoped threads; the call blocks until all of
/// them finish. Results are deterministic for a fixed `config.seed`.
///
/// # Errors
///
/// Returns `SamplerError` if the configuration is invalid, the model does
/// not compile against the binding, or a chain cannot be initialized.
pub fn sample(
    spec: &ModelSpec,
    binding: &DataBinding,
    config: SamplerConfig,
) -> Result<Fit, SamplerError> {
    config.validate()?;
    let model = compile(spec, binding)?;
    let chains = run_chains(&model, &config)?;
    Ok(Fit::new(model.layouts().to_vec(), chains, config))
}

/// Run `config.chains` independent chains of `model`.
///
/// # Errors
///
/// Returns `SamplerError` if any chain fails.
pub fn run_chains<M: LogDensity + ?Sized>(
    model: &M,
    config: &SamplerConfig,
) -> Result<Vec<ChainDraws>, SamplerError> {
    config.validate()?;
    info!(
        "sampling {} chains x {} iterations ({} warmup) over {} parameters",
        config.chains,
        config.iterations,
        config.warmup,
        model.dim()
    );

    let results = std::thread::scope(|scope| {
        let handles = (0..config.chains)
            .map(|chain| scope.spawn(move || run_chain(model, config, chain)))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .enumerate()
            .map(|(chain, handle)| {
                handle
                    .join()
                    .map_err(|_| SamplerError::ChainPanicked { chain })?
            })
            .collect::<Result<Vec<_>, _>>()
    })?;

    let divergences: usize = results.iter().map(ChainDraws::divergences).sum();
    if divergences > 0 {
        warn!("{divergences} divergent transitions after warmup");
    }
    info!(
        "sampling finished: {} draws per chain",
        config.retained_draws()
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation_rejects_zero_iterations() {
        let config = SamplerConfig {
            iterations: 0,
            ..SamplerConfig::default()
        };
        assert_eq!(config.validate(), Err(InferenceError::InvalidIterations));
    }

    #[test]
    fn config_validation_rejects_warmup_covering_all_iterations() {
        let config = SamplerConfig {
            iterations: 100,
            warmup: 100,
            ..SamplerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(InferenceError::InvalidWarmup {
                warmup: 100,
                iterations: 100
            })
        );
    }

    #[test]
    fn config_validation_rejects_target_accept_of_one() {
        let config = SamplerConfig {
            target_accept: 1.0,
            ..SamplerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(InferenceError::InvalidTargetAccept { .. })
        ));
    }

    #[test]
    fn half_of_iterations_become_warmup() {
        let config = SamplerConfig::with_iterations_and_chains(1_000, 2);
        assert_eq!(config.warmup, 500);
        assert_eq!(config.chains, 2);
        assert_eq!(config.retained_draws(), 500);
    }

    #[test]
    fn retained_draws_rounds_up_with_thinning() {
        let config = SamplerConfig {
            iterations: 110,
            warmup: 100,
            thin: 3,
            ..SamplerConfig::default()
        };
        assert_eq!(config.retained_draws(), 4);
    }

    #[test]
    fn chain_seeds_are_distinct() {
        let config = SamplerConfig::default();
        assert_eq!(config.chain_seed(0), 42);
        assert_eq!(config.chain_seed(2), 20_042);
    }
}
