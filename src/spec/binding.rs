//! Data bindings: concrete values for the names declared in a data block.

use std::collections::BTreeMap;

use log::debug;
use thiserror::Error;

use super::{DataDecl, DataKind, Limit, ModelSpec, Size};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindingError {
    #[error("no value bound for declared data `{name}`")]
    Missing { name: String },
    #[error("`{name}` is declared as {expected} but bound as {found}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("size `{size}` of `{name}` does not resolve to a non-negative int")]
    UnresolvedSize { name: String, size: String },
    #[error("bound `{limit}` of `{name}` does not resolve to a bound scalar")]
    UnresolvedLimit { name: String, limit: String },
    #[error("`{name}` has length {found}, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("`{name}` element {position} = {value} lies outside [{lower}, {upper}]")]
    OutOfBounds {
        name: String,
        position: usize,
        value: f64,
        lower: f64,
        upper: f64,
    },
    #[error("`{name}` element {position} is not finite")]
    NonFinite { name: String, position: usize },
}

/// A bound value.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Int(i64),
    Real(f64),
    IntArray(Vec<i64>),
    RealArray(Vec<f64>),
}

impl DataValue {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::IntArray(_) => "int array",
            Self::RealArray(_) => "vector",
        }
    }

    /// Scalar value as `f64`, if this is a scalar.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            Self::IntArray(_) | Self::RealArray(_) => None,
        }
    }

    /// Elements as `f64` (scalars yield one element).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Self::Int(value) => vec![*value as f64],
            Self::Real(value) => vec![*value],
            Self::IntArray(values) => values.iter().map(|value| *value as f64).collect(),
            Self::RealArray(values) => values.clone(),
        }
    }

    const fn len(&self) -> Option<usize> {
        match self {
            Self::Int(_) | Self::Real(_) => None,
            Self::IntArray(values) => Some(values.len()),
            Self::RealArray(values) => Some(values.len()),
        }
    }
}

const fn expected_kind(decl: &DataDecl) -> &'static str {
    match (decl.kind, decl.size.is_some()) {
        (DataKind::Int, false) => "int",
        (DataKind::Real, false) => "real",
        (DataKind::Int, true) => "int array",
        (DataKind::Real, true) => "vector",
    }
}

/// Mapping from declared data names to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataBinding {
    values: BTreeMap<String, DataValue>,
}

impl DataBinding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: DataValue) -> &mut Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn insert_int(&mut self, name: &str, value: i64) -> &mut Self {
        self.insert(name, DataValue::Int(value))
    }

    pub fn insert_real(&mut self, name: &str, value: f64) -> &mut Self {
        self.insert(name, DataValue::Real(value))
    }

    pub fn insert_int_array(&mut self, name: &str, values: Vec<i64>) -> &mut Self {
        self.insert(name, DataValue::IntArray(values))
    }

    pub fn insert_real_array(&mut self, name: &str, values: Vec<f64>) -> &mut Self {
        self.insert(name, DataValue::RealArray(values))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.values.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve an array size against this binding.
    ///
    /// # Errors
    ///
    /// Returns `BindingError::UnresolvedSize` if a named size is unbound,
    /// not an int scalar, or negative.
    pub fn resolve_size(&self, owner: &str, size: &Size) -> Result<usize, BindingError> {
        match size {
            Size::Literal(value) => Ok(*value),
            Size::Data(name) => match self.get(name) {
                Some(DataValue::Int(value)) => {
                    usize::try_from(*value).map_err(|_| BindingError::UnresolvedSize {
                        name: owner.to_string(),
                        size: name.clone(),
                    })
                }
                _ => Err(BindingError::UnresolvedSize {
                    name: owner.to_string(),
                    size: name.clone(),
                }),
            },
        }
    }

    fn resolve_limit(&self, owner: &str, limit: &Limit) -> Result<f64, BindingError> {
        match limit {
            Limit::Literal(value) => Ok(*value),
            Limit::Data(name) => self
                .get(name)
                .and_then(DataValue::as_scalar)
                .ok_or_else(|| BindingError::UnresolvedLimit {
                    name: owner.to_string(),
                    limit: name.clone(),
                }),
        }
    }

    /// Check this binding against the data block of `spec`.
    ///
    /// Every declared name must be bound with the declared kind, arrays must
    /// have the declared length, reals must be finite, and values must
    /// respect declared bounds. Entries the specification does not declare
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first `BindingError` found, in declaration order.
    pub fn validate_against(&self, spec: &ModelSpec) -> Result<(), BindingError> {
        for decl in spec.data() {
            self.validate_decl(decl)?;
        }
        for name in self.names() {
            if spec.data_decl(name).is_none() {
                debug!("ignoring binding `{name}`, which is not declared in the data block");
            }
        }
        Ok(())
    }

    fn validate_decl(&self, decl: &DataDecl) -> Result<(), BindingError> {
        let name = decl.name.as_str();
        let value = self.get(name).ok_or_else(|| BindingError::Missing {
            name: name.to_string(),
        })?;

        let kind_matches = matches!(
            (decl.kind, decl.size.is_some(), value),
            (DataKind::Int, false, DataValue::Int(_))
                | (DataKind::Real, false, DataValue::Real(_))
                | (DataKind::Int, true, DataValue::IntArray(_))
                | (DataKind::Real, true, DataValue::RealArray(_))
        );
        if !kind_matches {
            return Err(BindingError::WrongKind {
                name: name.to_string(),
                expected: expected_kind(decl),
                found: value.kind_name(),
            });
        }

        if let (Some(size), Some(found)) = (&decl.size, value.len()) {
            let expected = self.resolve_size(name, size)?;
            if found != expected {
                return Err(BindingError::LengthMismatch {
                    name: name.to_string(),
                    expected,
                    found,
                });
            }
        }

        let elements = value.to_f64_vec();
        if let Some(position) = elements.iter().position(|value| !value.is_finite()) {
            return Err(BindingError::NonFinite {
                name: name.to_string(),
                position,
            });
        }

        let lower = decl
            .lower
            .as_ref()
            .map(|limit| self.resolve_limit(name, limit))
            .transpose()?
            .unwrap_or(f64::NEG_INFINITY);
        let upper = decl
            .upper
            .as_ref()
            .map(|limit| self.resolve_limit(name, limit))
            .transpose()?
            .unwrap_or(f64::INFINITY);
        if let Some((position, value)) = elements
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| *value < lower || *value > upper)
        {
            return Err(BindingError::OutOfBounds {
                name: name.to_string(),
                position,
                value,
                lower,
                upper,
            });
        }
        Ok(())
    }
}
