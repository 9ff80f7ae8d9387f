//! # Radon models
//!
//! Each tutorial model is a specification builder plus a binding builder
//! that turns a [`RadonData`] table into engine inputs. County codes are
//! 0-based in the table and bound 1-based for the engine.
//!
//! | model | likelihood |
//! |---|---|
//! | [`pooled`] | `y ~ normal(beta[1] + beta[2] * x, sigma)` |
//! | [`unpooled`] | `y ~ normal(a[county] + beta * x, sigma)` |
//! | [`partial_pooling`] | `y ~ normal(a[county], sigma_y)` |
//! | [`varying_intercept`] | `y ~ normal(a[county] + b * x, sigma_y)` |
//! | [`varying_slope`] | `y ~ normal(a + b[county] * x, sigma_y)` |
//! | [`varying_intercept_slope`] | `y ~ normal(a[county] + b[county] * x, sigma_y)` |
//! | [`group_predictor`] | as varying intercept, with `a ~ normal(g0 + g1 * u, sigma_a)` |

pub mod group_predictor;
pub mod ols;
pub mod partial_pooling;
pub mod pooled;
pub mod predict;
pub mod unpooled;
pub mod varying_intercept;
pub mod varying_intercept_slope;
pub mod varying_slope;

use std::fmt;

use thiserror::Error;

use crate::inference::{Fit, SamplerConfig, SamplerError, sample};
use crate::input::{InputError, RadonData};
use crate::spec::{DataBinding, DataDecl, ModelSpec};
use crate::utils::LinearSolveError;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("model `{model}` requires county-level uranium")]
    MissingUranium { model: &'static str },
    #[error("county code {county} is outside 0..{n_counties}")]
    UnknownCounty { county: usize, n_counties: usize },
    #[error("model `{model}` has no county-specific {part}")]
    NotCountySpecific { model: &'static str, part: &'static str },
    #[error("least squares needs floor values that vary across rows")]
    DegenerateDesign,
    #[error(transparent)]
    LinearSolve(#[from] LinearSolveError),
    #[error(transparent)]
    Sampler(#[from] SamplerError),
}

/// The tutorial models, in the order they are introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadonModel {
    Pooled,
    Unpooled,
    PartialPooling,
    VaryingIntercept,
    VaryingSlope,
    VaryingInterceptSlope,
    GroupPredictor,
}

impl RadonModel {
    pub const ALL: [Self; 7] = [
        Self::Pooled,
        Self::Unpooled,
        Self::PartialPooling,
        Self::VaryingIntercept,
        Self::VaryingSlope,
        Self::VaryingInterceptSlope,
        Self::GroupPredictor,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pooled => "pooled",
            Self::Unpooled => "unpooled",
            Self::PartialPooling => "partial_pooling",
            Self::VaryingIntercept => "varying_intercept",
            Self::VaryingSlope => "varying_slope",
            Self::VaryingInterceptSlope => "varying_intercept_slope",
            Self::GroupPredictor => "group_predictor",
        }
    }

    #[must_use]
    pub fn spec(self) -> ModelSpec {
        match self {
            Self::Pooled => pooled::spec(),
            Self::Unpooled => unpooled::spec(),
            Self::PartialPooling => partial_pooling::spec(),
            Self::VaryingIntercept => varying_intercept::spec(),
            Self::VaryingSlope => varying_slope::spec(),
            Self::VaryingInterceptSlope => varying_intercept_slope::spec(),
            Self::GroupPredictor => group_predictor::spec(),
        }
    }

    /// Bind `data` to this model's declared inputs.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if the table is invalid or lacks inputs the
    /// model needs.
    pub fn bind(self, data: &RadonData) -> Result<DataBinding, ModelError> {
        data.validate()?;
        match self {
            Self::Pooled => Ok(pooled::bind(data)),
            Self::GroupPredictor => group_predictor::bind(data),
            Self::Unpooled
            | Self::PartialPooling
            | Self::VaryingIntercept
            | Self::VaryingSlope
            | Self::VaryingInterceptSlope => Ok(county_binding(data)),
        }
    }

    /// Specify, bind, and sample this model.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if binding or sampling fails.
    pub fn fit(self, data: &RadonData, config: SamplerConfig) -> Result<Fit, ModelError> {
        let binding = self.bind(data)?;
        Ok(sample(&self.spec(), &binding, config)?)
    }

    /// Name of the residual scale parameter.
    #[must_use]
    pub const fn sigma_name(self) -> &'static str {
        match self {
            Self::Pooled | Self::Unpooled => "sigma",
            _ => "sigma_y",
        }
    }
}

impl fmt::Display for RadonModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn count_to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Declarations shared by every model: `N`, `x`, `y`.
pub(crate) fn observation_decls() -> Vec<DataDecl> {
    vec![
        DataDecl::int("N").with_lower(0),
        DataDecl::real_vector("x", "N"),
        DataDecl::real_vector("y", "N"),
    ]
}

/// Declarations of grouped models: `N`, `J`, `county`, `x`, `y`.
pub(crate) fn county_decls() -> Vec<DataDecl> {
    vec![
        DataDecl::int("N").with_lower(0),
        DataDecl::int("J").with_lower(1),
        DataDecl::int_array("county", "N")
            .with_lower(1)
            .with_upper("J"),
        DataDecl::real_vector("x", "N"),
        DataDecl::real_vector("y", "N"),
    ]
}

pub(crate) fn observation_binding(data: &RadonData) -> DataBinding {
    let mut binding = DataBinding::new();
    binding
        .insert_int("N", count_to_i64(data.n_obs()))
        .insert_real_array("x", data.floor.clone())
        .insert_real_array("y", data.log_radon.clone());
    binding
}

/// Grouped binding with county codes shifted to 1-based.
pub(crate) fn county_binding(data: &RadonData) -> DataBinding {
    let mut binding = observation_binding(data);
    binding
        .insert_int("J", count_to_i64(data.n_counties()))
        .insert_int_array(
            "county",
            data.county
                .iter()
                .map(|code| count_to_i64(*code) + 1)
                .collect(),
        );
    binding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::DataValue;

    fn table() -> RadonData {
        RadonData::new(
            vec![0.8, 1.1, 1.9, 0.4, 1.5],
            vec![0.0, 1.0, 0.0, 1.0, 0.0],
            vec![0, 0, 1, 2, 2],
            vec!["A".into(), "B".into(), "C".into()],
        )
        .with_county_uranium(vec![-0.3, 0.1, 0.4])
    }

    #[test]
    fn every_model_spec_validates() {
        for model in RadonModel::ALL {
            assert_eq!(model.spec().validate(), Ok(()), "{model}");
        }
    }

    #[test]
    fn every_binding_satisfies_its_spec() {
        let data = table();
        for model in RadonModel::ALL {
            let binding = model.bind(&data).expect("table binds");
            assert_eq!(binding.validate_against(&model.spec()), Ok(()), "{model}");
        }
    }

    #[test]
    fn county_codes_are_bound_one_based() {
        let binding = county_binding(&table());
        assert_eq!(
            binding.get("county"),
            Some(&DataValue::IntArray(vec![1, 1, 2, 3, 3]))
        );
        assert_eq!(binding.get("J"), Some(&DataValue::Int(3)));
    }

    #[test]
    fn bound_arrays_have_declared_length() {
        let data = table();
        let binding = RadonModel::VaryingIntercept
            .bind(&data)
            .expect("table binds");
        for name in ["x", "y", "county"] {
            let len = binding.get(name).map(|value| value.to_f64_vec().len());
            assert_eq!(len, Some(data.n_obs()), "{name}");
        }
    }

    #[test]
    fn invalid_table_is_rejected_before_binding() {
        let mut data = table();
        data.county[0] = 7;
        assert!(matches!(
            RadonModel::Pooled.bind(&data),
            Err(ModelError::Input(InputError::CountyOutOfRange { .. }))
        ));
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = RadonModel::ALL.iter().map(|model| model.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RadonModel::ALL.len());
    }
}
