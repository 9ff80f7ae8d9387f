//! Intercepts and floor effects both vary by county, with independent priors.

use crate::spec::{Distribution, Expr, ModelSpec, ParamDecl, Statement};

use super::county_decls;

#[must_use]
pub fn spec() -> ModelSpec {
    ModelSpec::new(
        county_decls(),
        vec![
            ParamDecl::vector("a", "J"),
            ParamDecl::vector("b", "J"),
            ParamDecl::scalar("mu_a"),
            ParamDecl::scalar("mu_b"),
            ParamDecl::scalar("sigma_a").with_lower(0.0).with_upper(100.0),
            ParamDecl::scalar("sigma_b").with_lower(0.0).with_upper(100.0),
            ParamDecl::scalar("sigma_y").with_lower(0.0).with_upper(100.0),
        ],
        vec![
            Statement::sample(Expr::param("mu_a"), Distribution::normal(0.0, 100.0)),
            Statement::sample(Expr::param("mu_b"), Distribution::normal(0.0, 100.0)),
            Statement::sample(
                Expr::param("a"),
                Distribution::normal(Expr::param("mu_a"), Expr::param("sigma_a")),
            ),
            Statement::sample(
                Expr::param("b"),
                Distribution::normal(Expr::param("mu_b"), Expr::param("sigma_b")),
            ),
            Statement::sample(
                Expr::data("y"),
                Distribution::normal(
                    Expr::indexed("a", "county") + Expr::indexed("b", "county") * Expr::data("x"),
                    Expr::param("sigma_y"),
                ),
            ),
        ],
    )
}
