//! # Model specifications
//!
//! A [`ModelSpec`] bundles three blocks: the declared data inputs, the
//! declared parameters with their constraints, and the sampling statements
//! that relate them. Specifications are built with typed constructors, are
//! immutable once assembled, and render to a Stan-like text for display.
//!
//! ```
//! use radon_multilevel::spec::{DataDecl, Distribution, Expr, ModelSpec, ParamDecl, Statement};
//!
//! let spec = ModelSpec::new(
//!     vec![
//!         DataDecl::int("N").with_lower(0),
//!         DataDecl::real_vector("y", "N"),
//!     ],
//!     vec![ParamDecl::scalar("mu"), ParamDecl::scalar("sigma").with_lower(0.0)],
//!     vec![Statement::sample(
//!         Expr::data("y"),
//!         Distribution::normal(Expr::param("mu"), Expr::param("sigma")),
//!     )],
//! );
//! assert!(spec.validate().is_ok());
//! assert!(spec.render().contains("y ~ normal(mu, sigma);"));
//! ```

pub mod binding;
pub mod expr;

use std::collections::HashSet;

use thiserror::Error;

pub use binding::{BindingError, DataBinding, DataValue};
pub use expr::{Distribution, Expr, Statement};
use expr::Reference;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("name `{name}` is declared more than once")]
    DuplicateName { name: String },
    #[error("`{name}` is used but not declared in the data block")]
    UndeclaredData { name: String },
    #[error("`{name}` is used but not declared in the parameters block")]
    UndeclaredParameter { name: String },
    #[error("size of `{name}` refers to `{size}`, which is not an int scalar in the data block")]
    InvalidSize { name: String, size: String },
    #[error("bound of `{name}` refers to `{limit}`, which is not a scalar in the data block")]
    InvalidLimit { name: String, limit: String },
    #[error("`{name}` has lower bound {lower} not below upper bound {upper}")]
    InvalidBounds {
        name: String,
        lower: String,
        upper: String,
    },
    #[error("`{param}[{index}]` requires a vector parameter and an int array index")]
    InvalidIndex { param: String, index: String },
    #[error("`{param}[{position}]` requires a vector parameter and a 1-based position")]
    InvalidElement { param: String, position: usize },
    #[error("sampling statement {statement} must target a data or parameter name")]
    InvalidTarget { statement: usize },
    #[error("the model block has no sampling statements")]
    EmptyModel,
}

/// Element type of a data entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Int,
    Real,
}

/// Length of an array, either literal or read from an int data scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Size {
    Literal(usize),
    Data(String),
}

impl From<usize> for Size {
    fn from(value: usize) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for Size {
    fn from(value: &str) -> Self {
        Self::Data(value.to_string())
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Data(name) => f.write_str(name),
        }
    }
}

/// Bound on data values, either literal or read from a data scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Limit {
    Literal(f64),
    Data(String),
}

impl From<f64> for Limit {
    fn from(value: f64) -> Self {
        Self::Literal(value)
    }
}

impl From<i32> for Limit {
    fn from(value: i32) -> Self {
        Self::Literal(f64::from(value))
    }
}

impl From<&str> for Limit {
    fn from(value: &str) -> Self {
        Self::Data(value.to_string())
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Data(name) => f.write_str(name),
        }
    }
}

/// One declaration of the data block.
#[derive(Debug, Clone, PartialEq)]
pub struct DataDecl {
    pub name: String,
    pub kind: DataKind,
    /// `None` for scalars.
    pub size: Option<Size>,
    pub lower: Option<Limit>,
    pub upper: Option<Limit>,
}

impl DataDecl {
    fn new(name: &str, kind: DataKind, size: Option<Size>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            size,
            lower: None,
            upper: None,
        }
    }

    #[must_use]
    pub fn int(name: &str) -> Self {
        Self::new(name, DataKind::Int, None)
    }

    #[must_use]
    pub fn real(name: &str) -> Self {
        Self::new(name, DataKind::Real, None)
    }

    #[must_use]
    pub fn int_array(name: &str, size: impl Into<Size>) -> Self {
        Self::new(name, DataKind::Int, Some(size.into()))
    }

    #[must_use]
    pub fn real_vector(name: &str, size: impl Into<Size>) -> Self {
        Self::new(name, DataKind::Real, Some(size.into()))
    }

    #[must_use]
    pub fn with_lower(mut self, lower: impl Into<Limit>) -> Self {
        self.lower = Some(lower.into());
        self
    }

    #[must_use]
    pub fn with_upper(mut self, upper: impl Into<Limit>) -> Self {
        self.upper = Some(upper.into());
        self
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        self.size.is_none()
    }

    fn render(&self) -> String {
        let bounds = render_bounds(self.lower.as_ref(), self.upper.as_ref());
        match (self.kind, &self.size) {
            (DataKind::Int, None) => format!("int{bounds} {};", self.name),
            (DataKind::Real, None) => format!("real{bounds} {};", self.name),
            (DataKind::Int, Some(size)) => format!("int{bounds} {}[{size}];", self.name),
            (DataKind::Real, Some(size)) => format!("vector{bounds}[{size}] {};", self.name),
        }
    }
}

/// One declaration of the parameters block.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    /// `None` for scalars.
    pub size: Option<Size>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ParamDecl {
    #[must_use]
    pub fn scalar(name: &str) -> Self {
        Self {
            name: name.to_string(),
            size: None,
            lower: None,
            upper: None,
        }
    }

    #[must_use]
    pub fn vector(name: &str, size: impl Into<Size>) -> Self {
        Self {
            size: Some(size.into()),
            ..Self::scalar(name)
        }
    }

    #[must_use]
    pub const fn with_lower(mut self, lower: f64) -> Self {
        self.lower = Some(lower);
        self
    }

    #[must_use]
    pub const fn with_upper(mut self, upper: f64) -> Self {
        self.upper = Some(upper);
        self
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        self.size.is_none()
    }

    fn render(&self) -> String {
        let lower = self.lower.map(Limit::Literal);
        let upper = self.upper.map(Limit::Literal);
        let bounds = render_bounds(lower.as_ref(), upper.as_ref());
        match &self.size {
            None => format!("real{bounds} {};", self.name),
            Some(size) => format!("vector{bounds}[{size}] {};", self.name),
        }
    }
}

fn render_bounds(lower: Option<&Limit>, upper: Option<&Limit>) -> String {
    match (lower, upper) {
        (None, None) => String::new(),
        (Some(lower), None) => format!("<lower={lower}>"),
        (None, Some(upper)) => format!("<upper={upper}>"),
        (Some(lower), Some(upper)) => format!("<lower={lower},upper={upper}>"),
    }
}

/// Immutable three-block model specification.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    data: Vec<DataDecl>,
    parameters: Vec<ParamDecl>,
    model: Vec<Statement>,
}

impl ModelSpec {
    #[must_use]
    pub const fn new(data: Vec<DataDecl>, parameters: Vec<ParamDecl>, model: Vec<Statement>) -> Self {
        Self {
            data,
            parameters,
            model,
        }
    }

    #[must_use]
    pub fn data(&self) -> &[DataDecl] {
        &self.data
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParamDecl] {
        &self.parameters
    }

    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.model
    }

    #[must_use]
    pub fn data_decl(&self, name: &str) -> Option<&DataDecl> {
        self.data.iter().find(|decl| decl.name == name)
    }

    #[must_use]
    pub fn param_decl(&self, name: &str) -> Option<&ParamDecl> {
        self.parameters.iter().find(|decl| decl.name == name)
    }

    #[must_use]
    pub fn data_block(&self) -> String {
        render_block("data", self.data.iter().map(DataDecl::render))
    }

    #[must_use]
    pub fn parameters_block(&self) -> String {
        render_block("parameters", self.parameters.iter().map(ParamDecl::render))
    }

    #[must_use]
    pub fn model_block(&self) -> String {
        render_block("model", self.model.iter().map(ToString::to_string))
    }

    /// The three blocks concatenated in declaration order.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.data_block(),
            self.parameters_block(),
            self.model_block()
        )
    }

    /// Check that every name is declared once and used consistently.
    ///
    /// # Errors
    ///
    /// Returns the first `SpecError` encountered.
    pub fn validate(&self) -> Result<(), SpecError> {
        let mut seen = HashSet::new();
        let names = self
            .data
            .iter()
            .map(|decl| decl.name.as_str())
            .chain(self.parameters.iter().map(|decl| decl.name.as_str()));
        for name in names {
            if !seen.insert(name) {
                return Err(SpecError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }

        for decl in &self.data {
            if let Some(Size::Data(size)) = &decl.size {
                self.require_int_scalar(&decl.name, size)?;
            }
            for limit in [&decl.lower, &decl.upper].into_iter().flatten() {
                if let Limit::Data(limit) = limit
                    && !self.data_decl(limit).is_some_and(DataDecl::is_scalar)
                {
                    return Err(SpecError::InvalidLimit {
                        name: decl.name.clone(),
                        limit: limit.clone(),
                    });
                }
            }
            if let (Some(Limit::Literal(lower)), Some(Limit::Literal(upper))) =
                (&decl.lower, &decl.upper)
                && lower >= upper
            {
                return Err(SpecError::InvalidBounds {
                    name: decl.name.clone(),
                    lower: lower.to_string(),
                    upper: upper.to_string(),
                });
            }
        }

        for decl in &self.parameters {
            if let Some(Size::Data(size)) = &decl.size {
                self.require_int_scalar(&decl.name, size)?;
            }
            if let (Some(lower), Some(upper)) = (decl.lower, decl.upper)
                && lower >= upper
            {
                return Err(SpecError::InvalidBounds {
                    name: decl.name.clone(),
                    lower: lower.to_string(),
                    upper: upper.to_string(),
                });
            }
        }

        if self.model.is_empty() {
            return Err(SpecError::EmptyModel);
        }
        for (position, statement) in self.model.iter().enumerate() {
            let Statement::Sample {
                target,
                distribution,
            } = statement;
            if !matches!(target, Expr::Data(_) | Expr::Param(_)) {
                return Err(SpecError::InvalidTarget {
                    statement: position,
                });
            }
            let [first, second] = distribution.arguments();
            for expr in [target, first, second] {
                self.validate_expr(expr)?;
            }
        }
        Ok(())
    }

    fn require_int_scalar(&self, name: &str, size: &str) -> Result<(), SpecError> {
        match self.data_decl(size) {
            Some(decl) if decl.kind == DataKind::Int && decl.is_scalar() => Ok(()),
            _ => Err(SpecError::InvalidSize {
                name: name.to_string(),
                size: size.to_string(),
            }),
        }
    }

    fn validate_expr(&self, expr: &Expr) -> Result<(), SpecError> {
        let mut outcome = Ok(());
        expr.for_each_reference(&mut |reference| {
            if outcome.is_ok() {
                outcome = self.check_reference(reference);
            }
        });
        outcome
    }

    fn check_reference(&self, reference: Reference<'_>) -> Result<(), SpecError> {
        match reference {
            Reference::Data(name) => {
                if self.data_decl(name).is_none() {
                    return Err(SpecError::UndeclaredData {
                        name: name.to_string(),
                    });
                }
            }
            Reference::Param(name) => {
                if self.param_decl(name).is_none() {
                    return Err(SpecError::UndeclaredParameter {
                        name: name.to_string(),
                    });
                }
            }
            Reference::Element { param, position } => {
                let decl = self
                    .param_decl(param)
                    .ok_or_else(|| SpecError::UndeclaredParameter {
                        name: param.to_string(),
                    })?;
                let within_literal = match &decl.size {
                    Some(Size::Literal(len)) => position <= *len,
                    Some(Size::Data(_)) => true,
                    None => false,
                };
                if position == 0 || !within_literal {
                    return Err(SpecError::InvalidElement {
                        param: param.to_string(),
                        position,
                    });
                }
            }
            Reference::Indexed { param, index } => {
                let decl = self
                    .param_decl(param)
                    .ok_or_else(|| SpecError::UndeclaredParameter {
                        name: param.to_string(),
                    })?;
                let index_ok = self
                    .data_decl(index)
                    .is_some_and(|decl| decl.kind == DataKind::Int && !decl.is_scalar());
                if decl.is_scalar() || !index_ok {
                    return Err(SpecError::InvalidIndex {
                        param: param.to_string(),
                        index: index.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn render_block(title: &str, lines: impl Iterator<Item = String>) -> String {
    let mut out = format!("{title} {{\n");
    for line in lines {
        out.push_str("  ");
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("}\n");
    out
}
