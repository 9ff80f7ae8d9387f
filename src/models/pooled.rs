//! Complete pooling: one regression line shared by every county.

use crate::input::RadonData;
use crate::spec::{DataBinding, Distribution, Expr, ModelSpec, ParamDecl, Statement};

use super::{observation_binding, observation_decls};

#[must_use]
pub fn spec() -> ModelSpec {
    ModelSpec::new(
        observation_decls(),
        vec![
            ParamDecl::vector("beta", 2_usize),
            ParamDecl::scalar("sigma").with_lower(0.0),
        ],
        vec![Statement::sample(
            Expr::data("y"),
            Distribution::normal(
                Expr::element("beta", 1) + Expr::element("beta", 2) * Expr::data("x"),
                Expr::param("sigma"),
            ),
        )],
    )
}

#[must_use]
pub fn bind(data: &RadonData) -> DataBinding {
    observation_binding(data)
}
