//! # Observation table
//!
//! Defines the radon observation table: one row per household measurement
//! with a log-transformed response, a floor indicator, and a 0-based county
//! code indexing into a fixed county lookup.
//!
//! # Examples
//!
//! ```
//! use radon_multilevel::RadonData;
//!
//! let data = RadonData::new(
//!     vec![0.8, 1.2, 0.4],
//!     vec![0.0, 1.0, 0.0],
//!     vec![0, 0, 1],
//!     vec!["AITKIN".to_string(), "ANOKA".to_string()],
//! );
//!
//! assert!(data.validate().is_ok());
//! assert_eq!(data.n_counties(), 2);
//! ```
//!
//! ```
//! use radon_multilevel::RadonData;
//!
//! // county code 2 has no entry in the lookup
//! let data = RadonData::new(vec![0.8], vec![0.0], vec![2], vec!["AITKIN".to_string()]);
//!
//! assert!(data.validate().is_err());
//! ```

use thiserror::Error;

pub mod loader;
pub mod synthetic;

pub use loader::{LoadError, load_radon, load_radon_from_readers};
pub use synthetic::{SimulationConfig, SimulationError, simulate_radon};

/// Errors returned when validating an observation table.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("observation table must contain at least one row")]
    Empty,
    #[error("county lookup must contain at least one county")]
    NoCounties,
    #[error("column `{column}` has {len} rows; expected {expected}")]
    LengthMismatch {
        column: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("log radon contains a non-finite value at row {row}")]
    NonFiniteResponse { row: usize },
    #[error("floor indicator must be 0 or 1; found {value} at row {row}")]
    InvalidFloor { row: usize, value: f64 },
    #[error("county code {code} at row {row} is outside the lookup of {n_counties} counties")]
    CountyOutOfRange {
        row: usize,
        code: usize,
        n_counties: usize,
    },
    #[error("county uranium has {len} entries; expected one per county ({n_counties})")]
    UraniumLength { len: usize, n_counties: usize },
    #[error("county uranium contains a non-finite value for county {county}")]
    NonFiniteUranium { county: usize },
}

#[derive(Debug, Clone)]
pub struct RadonData {
    /// `ln(activity + 0.1)` per measurement.
    pub log_radon: Vec<f64>,
    /// 0 for basement measurements, 1 for first floor.
    pub floor: Vec<f64>,
    /// 0-based index into `county_names`.
    pub county: Vec<usize>,
    pub county_names: Vec<String>,
    /// Log uranium per county, aligned with `county_names`.
    pub county_uranium: Option<Vec<f64>>,
}

impl RadonData {
    #[must_use]
    pub const fn new(
        log_radon: Vec<f64>,
        floor: Vec<f64>,
        county: Vec<usize>,
        county_names: Vec<String>,
    ) -> Self {
        Self {
            log_radon,
            floor,
            county,
            county_names,
            county_uranium: None,
        }
    }

    #[must_use]
    pub fn with_county_uranium(self, county_uranium: Vec<f64>) -> Self {
        Self {
            county_uranium: Some(county_uranium),
            ..self
        }
    }

    #[must_use]
    pub const fn n_obs(&self) -> usize {
        self.log_radon.len()
    }

    #[must_use]
    pub const fn n_counties(&self) -> usize {
        self.county_names.len()
    }

    #[must_use]
    pub fn county_index(&self, name: &str) -> Option<usize> {
        self.county_names.iter().position(|county| county == name)
    }

    #[must_use]
    pub fn rows_for_county(&self, code: usize) -> Vec<usize> {
        self.county
            .iter()
            .enumerate()
            .filter_map(|(row, county)| (*county == code).then_some(row))
            .collect()
    }

    /// County uranium broadcast to measurement rows.
    #[must_use]
    pub fn uranium_per_row(&self) -> Option<Vec<f64>> {
        let uranium = self.county_uranium.as_ref()?;
        self.county
            .iter()
            .map(|county| uranium.get(*county).copied())
            .collect()
    }

    /// Validate column lengths, value domains, and county codes.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the table is malformed.
    pub fn validate(&self) -> Result<(), InputError> {
        let n = self.n_obs();
        if n == 0 {
            return Err(InputError::Empty);
        }
        if self.county_names.is_empty() {
            return Err(InputError::NoCounties);
        }
        if self.floor.len() != n {
            return Err(InputError::LengthMismatch {
                column: "floor",
                len: self.floor.len(),
                expected: n,
            });
        }
        if self.county.len() != n {
            return Err(InputError::LengthMismatch {
                column: "county",
                len: self.county.len(),
                expected: n,
            });
        }
        if let Some(row) = self.log_radon.iter().position(|value| !value.is_finite()) {
            return Err(InputError::NonFiniteResponse { row });
        }
        if let Some((row, value)) = self
            .floor
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| *value != 0.0 && *value != 1.0)
        {
            return Err(InputError::InvalidFloor { row, value });
        }
        let n_counties = self.n_counties();
        if let Some((row, code)) = self
            .county
            .iter()
            .copied()
            .enumerate()
            .find(|(_, code)| *code >= n_counties)
        {
            return Err(InputError::CountyOutOfRange {
                row,
                code,
                n_counties,
            });
        }
        if let Some(uranium) = &self.county_uranium {
            if uranium.len() != n_counties {
                return Err(InputError::UraniumLength {
                    len: uranium.len(),
                    n_counties,
                });
            }
            if let Some(county) = uranium.iter().position(|value| !value.is_finite()) {
                return Err(InputError::NonFiniteUranium { county });
            }
        }
        Ok(())
    }
}
