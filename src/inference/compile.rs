//! Compile a [`ModelSpec`] and its [`DataBinding`] into a log density with
//! gradient on the unconstrained parameter space.
//!
//! Every parameter component gets one slot in a flat vector. Sampling
//! statements are evaluated element-wise over their common length, and the
//! gradient is accumulated by walking each expression tree backwards.

use std::f64::consts::PI;

use thiserror::Error;

use super::LogDensity;
use super::transforms::Bijector;
use crate::spec::{
    BindingError, DataBinding, DataValue, Distribution, Expr, ModelSpec, SpecError, Statement,
};

const HALF_LN_TAU: f64 = 0.918_938_533_204_672_8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error("statement {statement}: operand of length {found} does not match length {expected}")]
    ShapeMismatch {
        statement: usize,
        expected: usize,
        found: usize,
    },
    #[error("`{param}[{index}]` element {position} = {value} is outside 1..={len}")]
    IndexOutOfRange {
        param: String,
        index: String,
        position: usize,
        value: i64,
        len: usize,
    },
    #[error("`{param}[{position}]` is outside 1..={len}")]
    ElementOutOfRange {
        param: String,
        position: usize,
        len: usize,
    },
    #[error("the model declares no parameter components")]
    NoParameters,
}

/// Where a declared parameter lives in the flat parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterLayout {
    pub name: String,
    pub offset: usize,
    pub len: usize,
    pub is_scalar: bool,
    pub bijector: Bijector,
}

impl ParameterLayout {
    /// Flat names of each component, 1-based for vectors: `a[1]`, `a[2]`, ...
    #[must_use]
    pub fn component_names(&self) -> Vec<String> {
        if self.is_scalar {
            vec![self.name.clone()]
        } else {
            (1..=self.len)
                .map(|position| format!("{}[{position}]", self.name))
                .collect()
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Const(f64),
    ScalarData(f64),
    VectorData(Vec<f64>),
    Scalar(usize),
    Vector { offset: usize, len: usize },
    Gather { offset: usize, index: Vec<usize> },
    Add(Box<Self>, Box<Self>),
    Mul(Box<Self>, Box<Self>),
}

impl Node {
    fn len(&self) -> Option<usize> {
        match self {
            Self::Const(_) | Self::ScalarData(_) | Self::Scalar(_) => None,
            Self::VectorData(values) => Some(values.len()),
            Self::Vector { len, .. } => Some(*len),
            Self::Gather { index, .. } => Some(index.len()),
            Self::Add(lhs, rhs) | Self::Mul(lhs, rhs) => lhs.len().or_else(|| rhs.len()),
        }
    }

    fn is_constant(&self) -> bool {
        match self {
            Self::Const(_) | Self::ScalarData(_) | Self::VectorData(_) => true,
            Self::Scalar(_) | Self::Vector { .. } | Self::Gather { .. } => false,
            Self::Add(lhs, rhs) | Self::Mul(lhs, rhs) => lhs.is_constant() && rhs.is_constant(),
        }
    }

    fn value(&self, theta: &[f64], i: usize) -> f64 {
        match self {
            Self::Const(value) | Self::ScalarData(value) => *value,
            Self::VectorData(values) => values[i],
            Self::Scalar(offset) => theta[*offset],
            Self::Vector { offset, .. } => theta[offset + i],
            Self::Gather { offset, index } => theta[offset + index[i]],
            Self::Add(lhs, rhs) => lhs.value(theta, i) + rhs.value(theta, i),
            Self::Mul(lhs, rhs) => lhs.value(theta, i) * rhs.value(theta, i),
        }
    }

    fn accumulate(&self, theta: &[f64], i: usize, adjoint: f64, grad: &mut [f64]) {
        match self {
            Self::Const(_) | Self::ScalarData(_) | Self::VectorData(_) => {}
            Self::Scalar(offset) => grad[*offset] += adjoint,
            Self::Vector { offset, .. } => grad[offset + i] += adjoint,
            Self::Gather { offset, index } => grad[offset + index[i]] += adjoint,
            Self::Add(lhs, rhs) => {
                lhs.accumulate(theta, i, adjoint, grad);
                rhs.accumulate(theta, i, adjoint, grad);
            }
            Self::Mul(lhs, rhs) => {
                let left = lhs.value(theta, i);
                let right = rhs.value(theta, i);
                lhs.accumulate(theta, i, adjoint * right, grad);
                rhs.accumulate(theta, i, adjoint * left, grad);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Family {
    Normal,
    Cauchy,
    Uniform,
}

#[derive(Debug, Clone)]
struct CompiledStatement {
    family: Family,
    target: Node,
    first: Node,
    second: Node,
    len: usize,
    constant: [bool; 3],
}

/// Log density and partial derivatives with respect to `(y, first, second)`.
fn log_density_terms(family: Family, y: f64, first: f64, second: f64) -> (f64, [f64; 3]) {
    match family {
        Family::Normal => {
            if !(second > 0.0 && second.is_finite()) {
                return (f64::NEG_INFINITY, [0.0; 3]);
            }
            let z = (y - first) / second;
            let lp = 0.5_f64.mul_add(-z * z, -second.ln()) - HALF_LN_TAU;
            (lp, [-z / second, z / second, z.mul_add(z, -1.0) / second])
        }
        Family::Cauchy => {
            if !(second > 0.0 && second.is_finite()) {
                return (f64::NEG_INFINITY, [0.0; 3]);
            }
            let z = (y - first) / second;
            let denom = z.mul_add(z, 1.0);
            let lp = -PI.ln() - second.ln() - denom.ln();
            let dz = 2.0 * z / (second * denom);
            (lp, [-dz, dz, z.mul_add(z, -1.0) / (second * denom)])
        }
        Family::Uniform => {
            let width = second - first;
            if !(width > 0.0) || y < first || y > second {
                return (f64::NEG_INFINITY, [0.0; 3]);
            }
            (-width.ln(), [0.0, 1.0 / width, -1.0 / width])
        }
    }
}

impl CompiledStatement {
    fn evaluate(&self, theta: &[f64], grad: Option<&mut [f64]>) -> f64 {
        let mut total = 0.0;
        let mut grad = grad;
        for i in 0..self.len {
            let y = self.target.value(theta, i);
            let first = self.first.value(theta, i);
            let second = self.second.value(theta, i);
            let (lp, partials) = log_density_terms(self.family, y, first, second);
            if !lp.is_finite() {
                return f64::NEG_INFINITY;
            }
            total += lp;
            if let Some(grad) = grad.as_deref_mut() {
                let nodes = [&self.target, &self.first, &self.second];
                for ((node, partial), constant) in nodes.into_iter().zip(partials).zip(self.constant)
                {
                    if !constant {
                        node.accumulate(theta, i, partial, grad);
                    }
                }
            }
        }
        total
    }
}

/// A model ready for sampling.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    layouts: Vec<ParameterLayout>,
    bijectors: Vec<Bijector>,
    statements: Vec<CompiledStatement>,
}

impl CompiledModel {
    #[must_use]
    pub fn layouts(&self) -> &[ParameterLayout] {
        &self.layouts
    }

    /// Log density of constrained values, without Jacobian terms.
    #[must_use]
    pub fn log_density_constrained(&self, theta: &[f64]) -> f64 {
        self.statements
            .iter()
            .map(|statement| statement.evaluate(theta, None))
            .sum()
    }

    /// Map constrained values back to the unconstrained space.
    #[must_use]
    pub fn unconstrain(&self, theta: &[f64]) -> Vec<f64> {
        self.bijectors
            .iter()
            .zip(theta)
            .map(|(bijector, value)| bijector.inverse(*value))
            .collect()
    }
}

impl LogDensity for CompiledModel {
    fn dim(&self) -> usize {
        self.bijectors.len()
    }

    fn parameter_names(&self) -> Vec<String> {
        self.layouts
            .iter()
            .flat_map(ParameterLayout::component_names)
            .collect()
    }

    fn log_density_and_gradient(&self, z: &[f64], grad: &mut [f64]) -> f64 {
        let theta = self.constrain(z);
        let mut grad_theta = vec![0.0; theta.len()];
        let mut lp: f64 = self
            .bijectors
            .iter()
            .zip(z)
            .map(|(bijector, value)| bijector.log_abs_det_jacobian(*value))
            .sum();
        for statement in &self.statements {
            lp += statement.evaluate(&theta, Some(&mut grad_theta));
            if !lp.is_finite() {
                grad.fill(0.0);
                return f64::NEG_INFINITY;
            }
        }
        for (k, bijector) in self.bijectors.iter().enumerate() {
            grad[k] = grad_theta[k].mul_add(
                bijector.jacobian(z[k]),
                bijector.grad_log_abs_det_jacobian(z[k]),
            );
        }
        lp
    }

    fn constrain(&self, z: &[f64]) -> Vec<f64> {
        self.bijectors
            .iter()
            .zip(z)
            .map(|(bijector, value)| bijector.forward(*value))
            .collect()
    }
}

/// Validate `spec` and `binding` together and build a [`CompiledModel`].
///
/// # Errors
///
/// Returns `CompileError` if the specification is malformed, the binding
/// does not satisfy it, shapes of a statement disagree, or a group index
/// falls outside the indexed vector.
pub fn compile(spec: &ModelSpec, binding: &DataBinding) -> Result<CompiledModel, CompileError> {
    spec.validate()?;
    binding.validate_against(spec)?;

    let mut layouts = Vec::with_capacity(spec.parameters().len());
    let mut bijectors = Vec::new();
    for decl in spec.parameters() {
        let len = match &decl.size {
            Some(size) => binding.resolve_size(&decl.name, size)?,
            None => 1,
        };
        let bijector = Bijector::from_bounds(decl.lower, decl.upper);
        layouts.push(ParameterLayout {
            name: decl.name.clone(),
            offset: bijectors.len(),
            len,
            is_scalar: decl.is_scalar(),
            bijector,
        });
        bijectors.extend(std::iter::repeat_n(bijector, len));
    }
    if bijectors.is_empty() {
        return Err(CompileError::NoParameters);
    }

    let compiler = Compiler {
        binding,
        layouts: &layouts,
    };
    let statements = spec
        .statements()
        .iter()
        .enumerate()
        .map(|(position, statement)| compiler.statement(position, statement))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompiledModel {
        layouts,
        bijectors,
        statements,
    })
}

struct Compiler<'a> {
    binding: &'a DataBinding,
    layouts: &'a [ParameterLayout],
}

impl Compiler<'_> {
    fn layout(&self, name: &str) -> Result<&ParameterLayout, CompileError> {
        self.layouts
            .iter()
            .find(|layout| layout.name == name)
            .ok_or_else(|| {
                CompileError::Spec(SpecError::UndeclaredParameter {
                    name: name.to_string(),
                })
            })
    }

    fn data(&self, name: &str) -> Result<&DataValue, CompileError> {
        self.binding.get(name).ok_or_else(|| {
            CompileError::Binding(BindingError::Missing {
                name: name.to_string(),
            })
        })
    }

    fn node(&self, expr: &Expr) -> Result<Node, CompileError> {
        Ok(match expr {
            Expr::Const(value) => Node::Const(*value),
            Expr::Data(name) => match self.data(name)? {
                value @ (DataValue::Int(_) | DataValue::Real(_)) => {
                    Node::ScalarData(value.as_scalar().unwrap_or(f64::NAN))
                }
                value => Node::VectorData(value.to_f64_vec()),
            },
            Expr::Param(name) => {
                let layout = self.layout(name)?;
                if layout.is_scalar {
                    Node::Scalar(layout.offset)
                } else {
                    Node::Vector {
                        offset: layout.offset,
                        len: layout.len,
                    }
                }
            }
            Expr::Element { param, position } => {
                let layout = self.layout(param)?;
                if *position == 0 || *position > layout.len {
                    return Err(CompileError::ElementOutOfRange {
                        param: param.clone(),
                        position: *position,
                        len: layout.len,
                    });
                }
                Node::Scalar(layout.offset + position - 1)
            }
            Expr::Indexed { param, index } => {
                let layout = self.layout(param)?;
                let DataValue::IntArray(codes) = self.data(index)? else {
                    return Err(CompileError::Spec(SpecError::InvalidIndex {
                        param: param.clone(),
                        index: index.clone(),
                    }));
                };
                let gathered = codes
                    .iter()
                    .enumerate()
                    .map(|(position, code)| {
                        usize::try_from(*code)
                            .ok()
                            .filter(|code| (1..=layout.len).contains(code))
                            .map(|code| code - 1)
                            .ok_or_else(|| CompileError::IndexOutOfRange {
                                param: param.clone(),
                                index: index.clone(),
                                position,
                                value: *code,
                                len: layout.len,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Node::Gather {
                    offset: layout.offset,
                    index: gathered,
                }
            }
            Expr::Add(lhs, rhs) => Node::Add(Box::new(self.node(lhs)?), Box::new(self.node(rhs)?)),
            Expr::Mul(lhs, rhs) => Node::Mul(Box::new(self.node(lhs)?), Box::new(self.node(rhs)?)),
        })
    }

    fn statement(
        &self,
        position: usize,
        statement: &Statement,
    ) -> Result<CompiledStatement, CompileError> {
        let Statement::Sample {
            target,
            distribution,
        } = statement;
        let family = match distribution {
            Distribution::Normal { .. } => Family::Normal,
            Distribution::Cauchy { .. } => Family::Cauchy,
            Distribution::Uniform { .. } => Family::Uniform,
        };
        let [first, second] = distribution.arguments();
        let target = self.node(target)?;
        let first = self.node(first)?;
        let second = self.node(second)?;

        let len = common_length(position, &[&target, &first, &second])?;
        let constant = [
            target.is_constant(),
            first.is_constant(),
            second.is_constant(),
        ];
        Ok(CompiledStatement {
            family,
            target,
            first,
            second,
            len,
            constant,
        })
    }
}

fn common_length(statement: usize, nodes: &[&Node]) -> Result<usize, CompileError> {
    let mut common: Option<usize> = None;
    for node in nodes {
        check_operands(statement, node)?;
        if let Some(len) = node.len() {
            match common {
                Some(expected) if expected != len => {
                    return Err(CompileError::ShapeMismatch {
                        statement,
                        expected,
                        found: len,
                    });
                }
                _ => common = Some(len),
            }
        }
    }
    Ok(common.unwrap_or(1))
}

fn check_operands(statement: usize, node: &Node) -> Result<(), CompileError> {
    if let Node::Add(lhs, rhs) | Node::Mul(lhs, rhs) = node {
        check_operands(statement, lhs)?;
        check_operands(statement, rhs)?;
        if let (Some(left), Some(right)) = (lhs.len(), rhs.len())
            && left != right
        {
            return Err(CompileError::ShapeMismatch {
                statement,
                expected: left,
                found: right,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RadonData;
    use crate::models::RadonModel;
    use crate::spec::{DataDecl, ParamDecl};
    use approx::assert_relative_eq;
    use statrs::distribution::{Cauchy, Continuous, Normal};

    fn varying_intercept() -> (ModelSpec, DataBinding) {
        let spec = ModelSpec::new(
            vec![
                DataDecl::int("N").with_lower(0),
                DataDecl::int("J").with_lower(1),
                DataDecl::int_array("county", "N")
                    .with_lower(1)
                    .with_upper("J"),
                DataDecl::real_vector("x", "N"),
                DataDecl::real_vector("y", "N"),
            ],
            vec![
                ParamDecl::vector("a", "J"),
                ParamDecl::scalar("b"),
                ParamDecl::scalar("mu_a"),
                ParamDecl::scalar("sigma_a").with_lower(0.0).with_upper(100.0),
                ParamDecl::scalar("sigma_y").with_lower(0.0),
            ],
            vec![
                Statement::sample(Expr::param("mu_a"), Distribution::normal(0.0, 100.0)),
                Statement::sample(
                    Expr::param("a"),
                    Distribution::normal(Expr::param("mu_a"), Expr::param("sigma_a")),
                ),
                Statement::sample(Expr::param("b"), Distribution::cauchy(0.0, 2.5)),
                Statement::sample(
                    Expr::data("y"),
                    Distribution::normal(
                        Expr::indexed("a", "county") + Expr::param("b") * Expr::data("x"),
                        Expr::param("sigma_y"),
                    ),
                ),
            ],
        );
        let mut binding = DataBinding::new();
        binding
            .insert_int("N", 5)
            .insert_int("J", 2)
            .insert_int_array("county", vec![1, 1, 2, 2, 2])
            .insert_real_array("x", vec![0.0, 1.0, 0.0, 0.0, 1.0])
            .insert_real_array("y", vec![1.2, 0.4, 1.9, 1.5, 0.8]);
        (spec, binding)
    }

    #[test]
    fn layout_assigns_contiguous_offsets() {
        let (spec, binding) = varying_intercept();
        let model = compile(&spec, &binding).expect("model compiles");
        assert_eq!(model.dim(), 6);
        assert_eq!(
            model.parameter_names(),
            vec!["a[1]", "a[2]", "b", "mu_a", "sigma_a", "sigma_y"]
        );
        assert_eq!(model.layouts()[1].offset, 2);
    }

    #[test]
    fn constrained_density_matches_reference_densities() {
        let (spec, binding) = varying_intercept();
        let model = compile(&spec, &binding).expect("model compiles");
        let theta = [1.1, 1.6, -0.5, 1.3, 0.4, 0.7];

        let mut expected = Normal::new(0.0, 100.0).expect("valid").ln_pdf(1.3);
        let prior_a = Normal::new(1.3, 0.4).expect("valid");
        expected += prior_a.ln_pdf(1.1) + prior_a.ln_pdf(1.6);
        expected += Cauchy::new(0.0, 2.5).expect("valid").ln_pdf(-0.5);
        let rows = [(0, 0.0, 1.2), (0, 1.0, 0.4), (1, 0.0, 1.9), (1, 0.0, 1.5), (1, 1.0, 0.8)];
        for (county, x, y) in rows {
            let mu = theta[county] - 0.5 * x;
            expected += Normal::new(mu, 0.7).expect("valid").ln_pdf(y);
        }

        assert_relative_eq!(model.log_density_constrained(&theta), expected, epsilon = 1e-9);
    }

    fn three_counties() -> RadonData {
        RadonData::new(
            vec![1.2, 0.4, 1.9, 1.5, 0.8, 0.3, 1.1],
            vec![0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0],
            vec![0, 0, 1, 1, 1, 2, 2],
            vec!["AITKIN".into(), "ANOKA".into(), "BECKER".into()],
        )
        .with_county_uranium(vec![-0.7, 0.2, 0.5])
    }

    fn assert_gradient_matches(model: &CompiledModel, z: &[f64]) {
        let mut grad = vec![0.0; model.dim()];
        model.log_density_and_gradient(z, &mut grad);

        let h = 1e-6;
        for k in 0..z.len() {
            let mut up = z.to_vec();
            let mut down = z.to_vec();
            up[k] += h;
            down[k] -= h;
            let numeric = (model.log_density(&up) - model.log_density(&down)) / (2.0 * h);
            assert_relative_eq!(grad[k], numeric, epsilon = 1e-4, max_relative = 1e-5);
        }
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let (spec, binding) = varying_intercept();
        let model = compile(&spec, &binding).expect("model compiles");
        assert_gradient_matches(&model, &[0.9, 1.4, -0.3, 1.0, -1.2, -0.4]);
    }

    #[test]
    fn county_slope_gradient_matches_finite_differences() {
        let binding = RadonModel::VaryingInterceptSlope
            .bind(&three_counties())
            .expect("binding builds");
        let model = compile(&RadonModel::VaryingInterceptSlope.spec(), &binding)
            .expect("model compiles");
        // a[1..3], b[1..3], mu_a, mu_b, sigma_a, sigma_b, sigma_y
        assert_eq!(model.dim(), 11);
        let z = [0.9, 1.4, 1.1, -0.3, -0.8, 0.2, 1.0, -0.5, -1.2, -2.0, -0.4];
        assert_gradient_matches(&model, &z);
    }

    #[test]
    fn group_predictor_gradient_matches_finite_differences() {
        let binding = RadonModel::GroupPredictor
            .bind(&three_counties())
            .expect("uranium is present");
        let model =
            compile(&RadonModel::GroupPredictor.spec(), &binding).expect("model compiles");
        // a[1..3], b, g0, g1, sigma_a, sigma_y
        assert_eq!(model.dim(), 8);
        assert_gradient_matches(&model, &[0.9, 1.4, 1.1, -0.6, 1.2, 0.7, -1.5, -0.4]);
    }

    #[test]
    fn group_predictor_density_uses_county_uranium() {
        let binding = RadonModel::GroupPredictor
            .bind(&three_counties())
            .expect("uranium is present");
        let model =
            compile(&RadonModel::GroupPredictor.spec(), &binding).expect("model compiles");
        let theta = [0.9, 1.4, 1.1, -0.6, 1.2, 0.7, 0.3, 0.8];
        let (g0, g1, sigma_a, sigma_y) = (1.2, 0.7, 0.3, 0.8);

        let vague = Normal::new(0.0, 100.0).expect("valid");
        let mut expected = vague.ln_pdf(g0) + vague.ln_pdf(g1) + vague.ln_pdf(-0.6);
        for (a, u) in theta[..3].iter().zip([-0.7, 0.2, 0.5]) {
            expected += Normal::new(g1.mul_add(u, g0), sigma_a)
                .expect("valid")
                .ln_pdf(*a);
        }
        let data = three_counties();
        for row in 0..data.n_obs() {
            let mu = (-0.6f64).mul_add(data.floor[row], theta[data.county[row]]);
            expected += Normal::new(mu, sigma_y)
                .expect("valid")
                .ln_pdf(data.log_radon[row]);
        }

        assert_relative_eq!(model.log_density_constrained(&theta), expected, epsilon = 1e-9);
    }

    #[test]
    fn uniform_bounds_receive_gradient() {
        let spec = ModelSpec::new(
            vec![DataDecl::real("y")],
            vec![
                ParamDecl::scalar("lo").with_upper(0.0),
                ParamDecl::scalar("hi").with_lower(1.0),
            ],
            vec![Statement::sample(
                Expr::data("y"),
                Distribution::uniform(Expr::param("lo"), Expr::param("hi")),
            )],
        );
        let mut binding = DataBinding::new();
        binding.insert_real("y", 0.5);
        let model = compile(&spec, &binding).expect("model compiles");
        let z = [0.2, -0.3];
        let mut grad = vec![0.0; 2];
        model.log_density_and_gradient(&z, &mut grad);
        let h = 1e-6;
        for k in 0..2 {
            let mut up = z.to_vec();
            let mut down = z.to_vec();
            up[k] += h;
            down[k] -= h;
            let numeric = (model.log_density(&up) - model.log_density(&down)) / (2.0 * h);
            assert_relative_eq!(grad[k], numeric, epsilon = 1e-5);
        }
    }

    #[test]
    fn unconstrain_inverts_constrain() {
        let (spec, binding) = varying_intercept();
        let model = compile(&spec, &binding).expect("model compiles");
        let z = vec![0.9, 1.4, -0.3, 1.0, -1.2, -0.4];
        let round_trip = model.unconstrain(&model.constrain(&z));
        for (left, right) in round_trip.iter().zip(&z) {
            assert_relative_eq!(left, right, epsilon = 1e-9);
        }
    }

    #[test]
    fn group_index_beyond_vector_is_rejected() {
        let (mut spec, mut binding) = varying_intercept();
        binding.insert_int("J", 3);
        binding.insert_int_array("county", vec![1, 1, 2, 2, 3]);
        spec = ModelSpec::new(
            spec.data().to_vec(),
            vec![
                ParamDecl::vector("a", 2_usize),
                ParamDecl::scalar("sigma_y").with_lower(0.0),
            ],
            vec![Statement::sample(
                Expr::data("y"),
                Distribution::normal(Expr::indexed("a", "county"), Expr::param("sigma_y")),
            )],
        );
        assert!(matches!(
            compile(&spec, &binding),
            Err(CompileError::IndexOutOfRange {
                position: 4,
                value: 3,
                len: 2,
                ..
            })
        ));
    }

    #[test]
    fn mismatched_vector_lengths_are_rejected() {
        let spec = ModelSpec::new(
            vec![
                DataDecl::int("N"),
                DataDecl::real_vector("y", "N"),
                DataDecl::real_vector("u", 3_usize),
            ],
            vec![ParamDecl::scalar("b")],
            vec![Statement::sample(
                Expr::data("y"),
                Distribution::normal(Expr::param("b") * Expr::data("u"), 1.0),
            )],
        );
        let mut binding = DataBinding::new();
        binding
            .insert_int("N", 2)
            .insert_real_array("y", vec![0.0, 1.0])
            .insert_real_array("u", vec![0.0, 1.0, 2.0]);
        assert!(matches!(
            compile(&spec, &binding),
            Err(CompileError::ShapeMismatch { statement: 0, .. })
        ));
    }

    #[test]
    fn binding_errors_surface_through_compile() {
        let (spec, mut binding) = varying_intercept();
        binding.insert_real_array("y", vec![1.0]);
        assert!(matches!(
            compile(&spec, &binding),
            Err(CompileError::Binding(BindingError::LengthMismatch { .. }))
        ));
    }
}
