//! Intercept-only multilevel model: county means drawn from a common normal.

use crate::spec::{Distribution, Expr, ModelSpec, ParamDecl, Statement};

use super::county_decls;

#[must_use]
pub fn spec() -> ModelSpec {
    ModelSpec::new(
        county_decls(),
        vec![
            ParamDecl::vector("a", "J"),
            ParamDecl::scalar("mu_a"),
            ParamDecl::scalar("sigma_a").with_lower(0.0).with_upper(100.0),
            ParamDecl::scalar("sigma_y").with_lower(0.0).with_upper(100.0),
        ],
        vec![
            Statement::sample(Expr::param("mu_a"), Distribution::normal(0.0, 100.0)),
            Statement::sample(
                Expr::param("a"),
                Distribution::normal(Expr::param("mu_a"), Expr::param("sigma_a")),
            ),
            Statement::sample(
                Expr::data("y"),
                Distribution::normal(Expr::indexed("a", "county"), Expr::param("sigma_y")),
            ),
        ],
    )
}
