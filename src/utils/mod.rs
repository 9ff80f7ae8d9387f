/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Shared linear algebra and statistics utilities for the radon models.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities
//!
//! Shared helpers for solving linear systems, computing summary statistics,
//! and moving between faer matrices and plain slices.

use faer::Mat;
use faer::prelude::Solve;
use rand::RngExt;
use rand::rngs::StdRng;
use thiserror::Error;

/// Failure of a dense linear solve.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LinearSolveError {
    #[error("system matrix must be square; found {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("right-hand side rows ({rhs}) must match system size ({size})")]
    RhsMismatch { rhs: usize, size: usize },
    #[error("linear solve produced non-finite values")]
    SolveFailed,
}

/// Convert a count to `f64` without a lossy `as` cast.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}

/// # Errors
///
/// Returns `LinearSolveError` if shapes disagree or the solve produces non-finite values.
pub fn solve_linear_system(a: &Mat<f64>, b: &Mat<f64>) -> Result<Mat<f64>, LinearSolveError> {
    if a.nrows() != a.ncols() {
        return Err(LinearSolveError::NotSquare {
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    if b.nrows() != a.nrows() {
        return Err(LinearSolveError::RhsMismatch {
            rhs: b.nrows(),
            size: a.nrows(),
        });
    }
    let rhs = b.clone();
    let lu = a.full_piv_lu();
    let solution = lu.solve(rhs);
    if !matrix_is_finite(&solution) {
        return Err(LinearSolveError::SolveFailed);
    }
    Ok(solution)
}

/// Arithmetic mean of a slice, `NaN` when empty.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / usize_to_f64(values.len())
}

/// Population standard deviation (denominator `n`), `NaN` when empty.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let center = mean(values);
    let variance = values
        .iter()
        .map(|value| {
            let centered = value - center;
            centered * centered
        })
        .sum::<f64>()
        / usize_to_f64(values.len());
    variance.max(0.0).sqrt()
}

/// Box-Muller standard normal draw.
pub fn sample_standard_normal(rng: &mut StdRng) -> f64 {
    let u1 = (1.0_f64 - rng.random::<f64>()).max(f64::MIN_POSITIVE);
    let u2 = rng.random::<f64>();
    (-2.0_f64 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[must_use]
pub fn matrix_is_finite(matrix: &Mat<f64>) -> bool {
    for i in 0..matrix.nrows() {
        for j in 0..matrix.ncols() {
            if !matrix[(i, j)].is_finite() {
                return false;
            }
        }
    }
    true
}

#[must_use]
pub fn vec_to_column(values: &[f64]) -> Mat<f64> {
    Mat::from_fn(values.len(), 1, |row, _| values[row])
}

#[must_use]
pub fn column_to_vec(column: &Mat<f64>) -> Vec<f64> {
    (0..column.nrows()).map(|row| column[(row, 0)]).collect()
}

/// Copy column `col` of a matrix into a vector.
#[must_use]
pub fn column_values(matrix: &Mat<f64>, col: usize) -> Vec<f64> {
    (0..matrix.nrows()).map(|row| matrix[(row, col)]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn solve_linear_system_recovers_known_solution() {
        let a = Mat::from_fn(2, 2, |i, j| match (i, j) {
            (0, 0) => 2.0,
            (1, 1) => 4.0,
            _ => 1.0,
        });
        let b = Mat::from_fn(2, 1, |i, _| if i == 0 { 3.0 } else { 5.0 });
        let x = solve_linear_system(&a, &b).expect("system is well conditioned");
        assert_relative_eq!(x[(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[(1, 0)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn solve_linear_system_rejects_non_finite_solution() {
        let a = Mat::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 0.0 });
        let b = Mat::from_fn(2, 1, |i, _| if i == 0 { f64::NAN } else { 1.0 });
        let err = solve_linear_system(&a, &b).expect_err("non-finite rhs should fail");
        assert_eq!(err, LinearSolveError::SolveFailed);
    }

    #[test]
    fn solve_linear_system_rejects_rectangular_matrix() {
        let a = Mat::<f64>::zeros(2, 3);
        let b = Mat::<f64>::zeros(2, 1);
        let err = solve_linear_system(&a, &b).expect_err("rectangular system should fail");
        assert_eq!(err, LinearSolveError::NotSquare { rows: 2, cols: 3 });
    }

    #[test]
    fn mean_and_std_match_hand_computation() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(std_dev(&values), 2.0);
    }

    #[test]
    fn mean_of_empty_slice_is_nan() {
        assert!(mean(&[]).is_nan());
        assert!(std_dev(&[]).is_nan());
    }

    #[test]
    fn standard_normal_draws_have_unit_scale() {
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(7);
        let draws: Vec<f64> = (0..20_000)
            .map(|_| sample_standard_normal(&mut rng))
            .collect();
        assert!(mean(&draws).abs() < 0.05);
        assert!((std_dev(&draws) - 1.0).abs() < 0.05);
    }

    #[test]
    fn matrix_is_finite_detects_nan() {
        let matrix = Mat::from_fn(2, 1, |i, _| if i == 0 { 1.0 } else { f64::NAN });
        assert!(!matrix_is_finite(&matrix));
    }

    #[test]
    fn column_round_trip_preserves_values() {
        let values = vec![0.5, -1.5, 3.0];
        assert_eq!(column_to_vec(&vec_to_column(&values)), values);
    }
}
