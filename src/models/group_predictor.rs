//! Varying intercepts explained by county log uranium.

use crate::input::RadonData;
use crate::spec::{DataBinding, DataDecl, Distribution, Expr, ModelSpec, ParamDecl, Statement};

use super::{ModelError, county_binding, county_decls};

#[must_use]
pub fn spec() -> ModelSpec {
    let mut data = county_decls();
    data.push(DataDecl::real_vector("u", "J"));
    ModelSpec::new(
        data,
        vec![
            ParamDecl::vector("a", "J"),
            ParamDecl::scalar("b"),
            ParamDecl::scalar("g0"),
            ParamDecl::scalar("g1"),
            ParamDecl::scalar("sigma_a").with_lower(0.0).with_upper(100.0),
            ParamDecl::scalar("sigma_y").with_lower(0.0).with_upper(100.0),
        ],
        vec![
            Statement::sample(Expr::param("g0"), Distribution::normal(0.0, 100.0)),
            Statement::sample(Expr::param("g1"), Distribution::normal(0.0, 100.0)),
            Statement::sample(
                Expr::param("a"),
                Distribution::normal(
                    Expr::param("g0") + Expr::param("g1") * Expr::data("u"),
                    Expr::param("sigma_a"),
                ),
            ),
            Statement::sample(Expr::param("b"), Distribution::normal(0.0, 100.0)),
            Statement::sample(
                Expr::data("y"),
                Distribution::normal(
                    Expr::indexed("a", "county") + Expr::param("b") * Expr::data("x"),
                    Expr::param("sigma_y"),
                ),
            ),
        ],
    )
}

/// # Errors
///
/// Returns `ModelError::MissingUranium` if the table has no county uranium.
pub fn bind(data: &RadonData) -> Result<DataBinding, ModelError> {
    let uranium = data
        .county_uranium
        .clone()
        .ok_or(ModelError::MissingUranium {
            model: "group_predictor",
        })?;
    let mut binding = county_binding(data);
    binding.insert_real_array("u", uranium);
    Ok(binding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uranium_is_required() {
        let data = RadonData::new(vec![1.0], vec![0.0], vec![0], vec!["A".into()]);
        assert!(matches!(
            bind(&data),
            Err(ModelError::MissingUranium { .. })
        ));
    }

    #[test]
    fn uranium_has_one_value_per_county() {
        let data = RadonData::new(
            vec![1.0, 2.0, 0.5],
            vec![0.0, 0.0, 1.0],
            vec![0, 1, 1],
            vec!["A".into(), "B".into()],
        )
        .with_county_uranium(vec![0.2, -0.1]);
        let binding = bind(&data).expect("uranium attached");
        assert_eq!(binding.validate_against(&spec()), Ok(()));
    }
}
