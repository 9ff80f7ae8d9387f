//! Phase-space state and the leapfrog integrator with a diagonal metric.

use rand::rngs::StdRng;

use super::LogDensity;
use crate::utils::sample_standard_normal;

/// Position, momentum, and the cached log density and gradient at the position.
#[derive(Debug, Clone)]
pub struct PhasePoint {
    pub q: Vec<f64>,
    pub p: Vec<f64>,
    pub log_density: f64,
    pub grad: Vec<f64>,
}

impl PhasePoint {
    /// Evaluate `model` at `q` with zero momentum.
    pub fn at<M: LogDensity + ?Sized>(model: &M, q: Vec<f64>) -> Self {
        let mut grad = vec![0.0; q.len()];
        let log_density = model.log_density_and_gradient(&q, &mut grad);
        Self {
            p: vec![0.0; q.len()],
            q,
            log_density,
            grad,
        }
    }

    /// `H = -log p(q) + p' M^{-1} p / 2`.
    #[must_use]
    pub fn hamiltonian(&self, inv_mass: &[f64]) -> f64 {
        kinetic_energy(&self.p, inv_mass) - self.log_density
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.log_density.is_finite() && self.grad.iter().all(|value| value.is_finite())
    }
}

#[must_use]
pub fn kinetic_energy(p: &[f64], inv_mass: &[f64]) -> f64 {
    0.5 * p
        .iter()
        .zip(inv_mass)
        .map(|(momentum, scale)| momentum * momentum * scale)
        .sum::<f64>()
}

/// Draw `p ~ N(0, M)` for diagonal `M = diag(1 / inv_mass)`.
pub fn sample_momentum(rng: &mut StdRng, inv_mass: &[f64]) -> Vec<f64> {
    inv_mass
        .iter()
        .map(|scale| sample_standard_normal(rng) / scale.sqrt())
        .collect()
}

/// Leapfrog integrator over a fixed step size and metric.
pub struct Leapfrog<'a, M: ?Sized> {
    model: &'a M,
    step_size: f64,
    inv_mass: &'a [f64],
}

impl<'a, M: LogDensity + ?Sized> Leapfrog<'a, M> {
    pub const fn new(model: &'a M, step_size: f64, inv_mass: &'a [f64]) -> Self {
        Self {
            model,
            step_size,
            inv_mass,
        }
    }

    #[must_use]
    pub const fn inv_mass(&self) -> &[f64] {
        self.inv_mass
    }

    /// Advance `point` by one step, backwards in time when `forward` is false.
    pub fn step(&self, point: &mut PhasePoint, forward: bool) {
        let eps = if forward {
            self.step_size
        } else {
            -self.step_size
        };
        let half = 0.5 * eps;
        for (p, g) in point.p.iter_mut().zip(&point.grad) {
            *p = half.mul_add(*g, *p);
        }
        for ((q, p), scale) in point.q.iter_mut().zip(&point.p).zip(self.inv_mass) {
            *q = (eps * scale).mul_add(*p, *q);
        }
        point.log_density = self
            .model
            .log_density_and_gradient(&point.q, &mut point.grad);
        for (p, g) in point.p.iter_mut().zip(&point.grad) {
            *p = half.mul_add(*g, *p);
        }
    }
}
