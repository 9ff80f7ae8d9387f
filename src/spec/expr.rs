//! Expressions, distributions, and sampling statements of the model block.

use std::fmt;
use std::ops::{Add, Mul};

/// A linear-predictor expression.
///
/// Vector-valued sub-expressions combine element-wise; scalars broadcast.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    /// Reference to a declared data entry.
    Data(String),
    /// Reference to a declared parameter (scalar or whole vector).
    Param(String),
    /// One element of a vector parameter, 1-based: `beta[2]`.
    Element { param: String, position: usize },
    /// Vector parameter gathered through an integer data array: `a[county]`.
    Indexed { param: String, index: String },
    Add(Box<Self>, Box<Self>),
    Mul(Box<Self>, Box<Self>),
}

impl Expr {
    #[must_use]
    pub fn data(name: &str) -> Self {
        Self::Data(name.to_string())
    }

    #[must_use]
    pub fn param(name: &str) -> Self {
        Self::Param(name.to_string())
    }

    #[must_use]
    pub fn element(param: &str, position: usize) -> Self {
        Self::Element {
            param: param.to_string(),
            position,
        }
    }

    #[must_use]
    pub fn indexed(param: &str, index: &str) -> Self {
        Self::Indexed {
            param: param.to_string(),
            index: index.to_string(),
        }
    }

    /// Visit every name this expression refers to.
    pub(crate) fn for_each_reference(&self, visit: &mut impl FnMut(Reference<'_>)) {
        match self {
            Self::Const(_) => {}
            Self::Data(name) => visit(Reference::Data(name)),
            Self::Param(name) => visit(Reference::Param(name)),
            Self::Element { param, position } => visit(Reference::Element {
                param,
                position: *position,
            }),
            Self::Indexed { param, index } => visit(Reference::Indexed { param, index }),
            Self::Add(lhs, rhs) | Self::Mul(lhs, rhs) => {
                lhs.for_each_reference(visit);
                rhs.for_each_reference(visit);
            }
        }
    }

    const fn precedence(&self) -> u8 {
        match self {
            Self::Add(..) => 1,
            Self::Mul(..) => 2,
            _ => 3,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        if self.precedence() < parent {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

/// Name usage inside an expression, as seen by validation.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Reference<'a> {
    Data(&'a str),
    Param(&'a str),
    Element { param: &'a str, position: usize },
    Indexed { param: &'a str, index: &'a str },
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::Const(value)
    }
}

impl Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::Add(Box::new(self), Box::new(rhs))
    }
}

impl Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::Mul(Box::new(self), Box::new(rhs))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "{value}"),
            Self::Data(name) | Self::Param(name) => f.write_str(name),
            Self::Element { param, position } => write!(f, "{param}[{position}]"),
            Self::Indexed { param, index } => write!(f, "{param}[{index}]"),
            Self::Add(lhs, rhs) => {
                lhs.fmt_operand(f, 1)?;
                f.write_str(" + ")?;
                rhs.fmt_operand(f, 2)
            }
            Self::Mul(lhs, rhs) => {
                lhs.fmt_operand(f, 2)?;
                f.write_str(" * ")?;
                rhs.fmt_operand(f, 3)
            }
        }
    }
}

/// Sampling distributions supported by the model block.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    Normal { mu: Expr, sigma: Expr },
    Cauchy { location: Expr, scale: Expr },
    Uniform { lower: Expr, upper: Expr },
}

impl Distribution {
    #[must_use]
    pub fn normal(mu: impl Into<Expr>, sigma: impl Into<Expr>) -> Self {
        Self::Normal {
            mu: mu.into(),
            sigma: sigma.into(),
        }
    }

    #[must_use]
    pub fn cauchy(location: impl Into<Expr>, scale: impl Into<Expr>) -> Self {
        Self::Cauchy {
            location: location.into(),
            scale: scale.into(),
        }
    }

    #[must_use]
    pub fn uniform(lower: impl Into<Expr>, upper: impl Into<Expr>) -> Self {
        Self::Uniform {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    #[must_use]
    pub const fn arguments(&self) -> [&Expr; 2] {
        match self {
            Self::Normal { mu, sigma } => [mu, sigma],
            Self::Cauchy { location, scale } => [location, scale],
            Self::Uniform { lower, upper } => [lower, upper],
        }
    }

    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Normal { .. } => "normal",
            Self::Cauchy { .. } => "cauchy",
            Self::Uniform { .. } => "uniform",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [first, second] = self.arguments();
        write!(f, "{}({first}, {second})", self.keyword())
    }
}

/// One statement of the model block: `target ~ distribution`.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Sample {
        target: Expr,
        distribution: Distribution,
    },
}

impl Statement {
    #[must_use]
    pub const fn sample(target: Expr, distribution: Distribution) -> Self {
        Self::Sample {
            target,
            distribution,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample {
                target,
                distribution,
            } => write!(f, "{target} ~ {distribution};"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_linear_predictor_without_redundant_parentheses() {
        let expr = Expr::indexed("a", "county") + Expr::param("b") * Expr::data("x");
        assert_eq!(expr.to_string(), "a[county] + b * x");
    }

    #[test]
    fn renders_parentheses_when_sum_is_multiplied() {
        let expr = (Expr::param("g0") + Expr::param("g1")) * Expr::data("u");
        assert_eq!(expr.to_string(), "(g0 + g1) * u");
    }

    #[test]
    fn renders_sampling_statement() {
        let statement = Statement::sample(
            Expr::data("y"),
            Distribution::normal(
                Expr::element("beta", 1) + Expr::element("beta", 2) * Expr::data("x"),
                Expr::param("sigma"),
            ),
        );
        assert_eq!(
            statement.to_string(),
            "y ~ normal(beta[1] + beta[2] * x, sigma);"
        );
    }

    #[test]
    fn constants_render_as_numbers() {
        let distribution = Distribution::normal(0.0, 100.0);
        assert_eq!(distribution.to_string(), "normal(0, 100)");
    }

    #[test]
    fn references_are_visited_depth_first() {
        let expr = Expr::indexed("a", "county") + Expr::param("b") * Expr::data("x");
        let mut seen = Vec::new();
        expr.for_each_reference(&mut |reference| {
            seen.push(match reference {
                Reference::Data(name) | Reference::Param(name) => name.to_string(),
                Reference::Element { param, .. } => param.to_string(),
                Reference::Indexed { param, index } => format!("{param}[{index}]"),
            });
        });
        assert_eq!(seen, vec!["a[county]", "b", "x"]);
    }
}
