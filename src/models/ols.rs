//! Classical least squares for the pooled regression, as a reference line
//! for the Bayesian fits.

use faer::Mat;

use super::ModelError;
use crate::input::RadonData;
use crate::utils::{solve_linear_system, usize_to_f64, vec_to_column};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OlsFit {
    pub intercept: f64,
    pub slope: f64,
    /// Residual standard deviation with `n - 2` degrees of freedom.
    pub residual_sd: f64,
}

impl OlsFit {
    #[must_use]
    pub fn predict(&self, floor: f64) -> f64 {
        self.slope.mul_add(floor, self.intercept)
    }
}

/// Regress log radon on floor, ignoring counties.
///
/// # Errors
///
/// Returns `ModelError::DegenerateDesign` if every row has the same floor
/// value or there are fewer than three rows.
pub fn ols_pooled(data: &RadonData) -> Result<OlsFit, ModelError> {
    data.validate()?;
    let n = data.n_obs();
    let varies = data
        .floor
        .iter()
        .any(|value| (value - data.floor[0]).abs() > f64::EPSILON);
    if n < 3 || !varies {
        return Err(ModelError::DegenerateDesign);
    }

    let design = Mat::from_fn(n, 2, |row, col| if col == 0 { 1.0 } else { data.floor[row] });
    let response = vec_to_column(&data.log_radon);
    let xtx = design.transpose() * &design;
    let xty = design.transpose() * &response;
    let beta = solve_linear_system(&xtx, &xty)?;
    let intercept = beta[(0, 0)];
    let slope = beta[(1, 0)];

    let rss = data
        .floor
        .iter()
        .zip(&data.log_radon)
        .map(|(x, y)| {
            let residual = y - slope.mul_add(*x, intercept);
            residual * residual
        })
        .sum::<f64>();

    Ok(OlsFit {
        intercept,
        slope,
        residual_sd: (rss / usize_to_f64(n - 2)).sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_exact_line() {
        let floor = vec![0.0, 1.0, 0.0, 1.0, 0.0];
        let log_radon = floor.iter().map(|x| 1.5 - 0.6 * x).collect();
        let data = RadonData::new(log_radon, floor, vec![0; 5], vec!["A".into()]);
        let fit = ols_pooled(&data).expect("floor varies");
        assert_relative_eq!(fit.intercept, 1.5, epsilon = 1e-10);
        assert_relative_eq!(fit.slope, -0.6, epsilon = 1e-10);
        assert_relative_eq!(fit.residual_sd, 0.0, epsilon = 1e-8);
        assert_relative_eq!(fit.predict(1.0), 0.9, epsilon = 1e-10);
    }

    #[test]
    fn slope_is_difference_of_group_means() {
        let data = RadonData::new(
            vec![1.0, 2.0, 3.0, 0.5, 1.5],
            vec![0.0, 0.0, 0.0, 1.0, 1.0],
            vec![0; 5],
            vec!["A".into()],
        );
        let fit = ols_pooled(&data).expect("floor varies");
        assert_relative_eq!(fit.intercept, 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.slope, -1.0, epsilon = 1e-10);
    }

    #[test]
    fn constant_floor_is_degenerate() {
        let data = RadonData::new(vec![1.0, 2.0, 3.0], vec![0.0; 3], vec![0; 3], vec!["A".into()]);
        assert!(matches!(ols_pooled(&data), Err(ModelError::DegenerateDesign)));
    }
}
