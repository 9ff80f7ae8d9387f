//! Posterior prediction for a house in a given county and floor.
//!
//! Expected log radon is assembled draw by draw from the fitted components
//! of each model's linear predictor; predictive draws add residual noise.

use faer::Mat;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{ModelError, RadonModel};
use crate::inference::{Fit, SamplerError};
use crate::utils::sample_standard_normal;

/// Merged draws of `name`, or of component `county` when it is a vector.
fn draws_of(fit: &Fit, name: &str, county: usize) -> Result<Vec<f64>, ModelError> {
    let layout = fit
        .layout(name)
        .ok_or_else(|| SamplerError::UnknownParameter {
            name: name.to_string(),
        })?;
    if layout.is_scalar {
        return Ok(fit.component(layout.offset));
    }
    if county >= layout.len {
        return Err(ModelError::UnknownCounty {
            county,
            n_counties: layout.len,
        });
    }
    Ok(fit.component(layout.offset + county))
}

/// Draws of `a + b * floor`.
fn linear(
    fit: &Fit,
    (intercept, slope): (&str, &str),
    county: usize,
    floor: f64,
) -> Result<Vec<f64>, ModelError> {
    let a = draws_of(fit, intercept, county)?;
    let b = draws_of(fit, slope, county)?;
    Ok(a.iter()
        .zip(&b)
        .map(|(a, b)| b.mul_add(floor, *a))
        .collect())
}

/// Posterior draws of the expected log radon for `county` (0-based) and
/// `floor` (0 basement, 1 first floor).
///
/// # Errors
///
/// Returns `ModelError::UnknownCounty` if `county` is not in the fit, or a
/// sampler error if `fit` was produced by a different model.
pub fn expected_log_radon(
    model: RadonModel,
    fit: &Fit,
    county: usize,
    floor: f64,
) -> Result<Vec<f64>, ModelError> {
    match model {
        RadonModel::Pooled => {
            let beta = fit.extract("beta")?;
            Ok((0..beta.nrows())
                .map(|row| beta[(row, 1)].mul_add(floor, beta[(row, 0)]))
                .collect())
        }
        RadonModel::Unpooled => linear(fit, ("a", "beta"), county, floor),
        RadonModel::PartialPooling => draws_of(fit, "a", county),
        RadonModel::VaryingIntercept
        | RadonModel::VaryingSlope
        | RadonModel::VaryingInterceptSlope
        | RadonModel::GroupPredictor => linear(fit, ("a", "b"), county, floor),
    }
}

/// Posterior predictive draws of a single new measurement.
///
/// # Errors
///
/// Same as [`expected_log_radon`].
pub fn posterior_predictive(
    model: RadonModel,
    fit: &Fit,
    county: usize,
    floor: f64,
    seed: u64,
) -> Result<Vec<f64>, ModelError> {
    let expected = expected_log_radon(model, fit, county, floor)?;
    let sigma = draws_of(fit, model.sigma_name(), 0)?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(expected
        .iter()
        .zip(&sigma)
        .map(|(mean, sd)| sd.mul_add(sample_standard_normal(&mut rng), *mean))
        .collect())
}

/// Per-county intercept draws (one column per county).
///
/// # Errors
///
/// Returns `ModelError::NotCountySpecific` for models with a single
/// intercept.
pub fn county_intercepts(model: RadonModel, fit: &Fit) -> Result<Mat<f64>, ModelError> {
    match model {
        RadonModel::Pooled | RadonModel::VaryingSlope => Err(ModelError::NotCountySpecific {
            model: model.name(),
            part: "intercepts",
        }),
        _ => Ok(fit.extract("a")?),
    }
}

/// Per-county floor-effect draws (one column per county).
///
/// # Errors
///
/// Returns `ModelError::NotCountySpecific` unless slopes vary by county.
pub fn county_slopes(model: RadonModel, fit: &Fit) -> Result<Mat<f64>, ModelError> {
    match model {
        RadonModel::VaryingSlope | RadonModel::VaryingInterceptSlope => Ok(fit.extract("b")?),
        _ => Err(ModelError::NotCountySpecific {
            model: model.name(),
            part: "slopes",
        }),
    }
}
