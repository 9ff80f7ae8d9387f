//! No pooling: an independent intercept per county and a shared floor effect.

use crate::spec::{Distribution, Expr, ModelSpec, ParamDecl, Statement};

use super::county_decls;

#[must_use]
pub fn spec() -> ModelSpec {
    ModelSpec::new(
        county_decls(),
        vec![
            ParamDecl::vector("a", "J"),
            ParamDecl::scalar("beta"),
            ParamDecl::scalar("sigma").with_lower(0.0).with_upper(100.0),
        ],
        vec![Statement::sample(
            Expr::data("y"),
            Distribution::normal(
                Expr::indexed("a", "county") + Expr::param("beta") * Expr::data("x"),
                Expr::param("sigma"),
            ),
        )],
    )
}
