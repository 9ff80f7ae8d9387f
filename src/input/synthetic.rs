//! Reproducible radon-like tables drawn from a varying-intercept model.
//!
//! County intercepts follow `a_j = mu_a + gamma * u_j + sigma_a * z_j` with
//! log uranium `u_j ~ Normal(0, uranium_sd)`, and each measurement is
//! `y_i = a_county[i] + beta * floor_i + sigma_y * e_i`.

use num_traits::ToPrimitive;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use thiserror::Error;

use super::RadonData;
use crate::utils::{sample_standard_normal, usize_to_f64};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SimulationError {
    #[error("simulation requires at least one county")]
    NoCounties,
    #[error("observations per county must satisfy 1 <= min ({min}) <= max ({max})")]
    InvalidObservationRange { min: usize, max: usize },
    #[error("scale parameters must be finite and positive")]
    InvalidScale,
    #[error("first-floor share must lie in [0, 1]")]
    InvalidFloorShare,
}

/// Generative settings for [`simulate_radon`].
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub n_counties: usize,
    pub min_obs_per_county: usize,
    pub max_obs_per_county: usize,
    pub mu_a: f64,
    pub sigma_a: f64,
    pub beta: f64,
    pub sigma_y: f64,
    /// County-level log-uranium coefficient.
    pub gamma: f64,
    pub uranium_sd: f64,
    /// Probability that a measurement was taken on the first floor.
    pub floor_share: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_counties: 12,
            min_obs_per_county: 2,
            max_obs_per_county: 25,
            mu_a: 1.5,
            sigma_a: 0.3,
            beta: -0.7,
            sigma_y: 0.75,
            gamma: 0.7,
            uranium_sd: 0.35,
            floor_share: 0.17,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// # Errors
    ///
    /// Returns `SimulationError` if the settings cannot produce a valid table.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.n_counties == 0 {
            return Err(SimulationError::NoCounties);
        }
        if self.min_obs_per_county == 0 || self.min_obs_per_county > self.max_obs_per_county {
            return Err(SimulationError::InvalidObservationRange {
                min: self.min_obs_per_county,
                max: self.max_obs_per_county,
            });
        }
        let scales = [self.sigma_a, self.sigma_y, self.uranium_sd];
        if scales.iter().any(|scale| !(scale.is_finite() && *scale > 0.0)) {
            return Err(SimulationError::InvalidScale);
        }
        if !(0.0..=1.0).contains(&self.floor_share) {
            return Err(SimulationError::InvalidFloorShare);
        }
        Ok(())
    }
}

/// Draw a synthetic observation table with county uranium attached.
///
/// # Errors
///
/// Returns `SimulationError` if the configuration is invalid.
pub fn simulate_radon(config: &SimulationConfig) -> Result<RadonData, SimulationError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let span = config.max_obs_per_county - config.min_obs_per_county + 1;
    let mut log_radon = Vec::new();
    let mut floor = Vec::new();
    let mut county = Vec::new();
    let mut uranium = Vec::with_capacity(config.n_counties);
    let county_names = (0..config.n_counties)
        .map(|idx| format!("COUNTY{:02}", idx + 1))
        .collect::<Vec<_>>();

    for code in 0..config.n_counties {
        let u = config.uranium_sd * sample_standard_normal(&mut rng);
        let intercept = config.gamma.mul_add(
            u,
            config.sigma_a.mul_add(sample_standard_normal(&mut rng), config.mu_a),
        );
        uranium.push(u);

        let extra = (rng.random::<f64>() * usize_to_f64(span)).floor();
        let n_obs = config.min_obs_per_county
            + extra.to_usize().unwrap_or(0).min(span - 1);
        for _ in 0..n_obs {
            let on_floor = if rng.random::<f64>() < config.floor_share {
                1.0
            } else {
                0.0
            };
            let noise = config.sigma_y * sample_standard_normal(&mut rng);
            log_radon.push(config.beta.mul_add(on_floor, intercept) + noise);
            floor.push(on_floor);
            county.push(code);
        }
    }

    Ok(RadonData::new(log_radon, floor, county, county_names).with_county_uranium(uranium))
}
