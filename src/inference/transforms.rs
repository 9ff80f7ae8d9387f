//! Bijections between constrained parameters and the unconstrained space the
//! sampler moves in.
//!
//! For a constrained value `theta = f(z)` the sampler targets
//! `log p(f(z)) + log |f'(z)|`, so each bijector exposes the log Jacobian
//! and its derivative alongside the forward and inverse maps.

/// Constraint of one scalar parameter component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bijector {
    Identity,
    /// `theta = lower + exp(z)`
    Lower(f64),
    /// `theta = upper - exp(z)`
    Upper(f64),
    /// `theta = lower + (upper - lower) * logistic(z)`
    Interval(f64, f64),
}

impl Bijector {
    #[must_use]
    pub const fn from_bounds(lower: Option<f64>, upper: Option<f64>) -> Self {
        match (lower, upper) {
            (None, None) => Self::Identity,
            (Some(lower), None) => Self::Lower(lower),
            (None, Some(upper)) => Self::Upper(upper),
            (Some(lower), Some(upper)) => Self::Interval(lower, upper),
        }
    }

    /// Map unconstrained `z` to the constrained value.
    #[must_use]
    pub fn forward(self, z: f64) -> f64 {
        match self {
            Self::Identity => z,
            Self::Lower(lower) => lower + z.exp(),
            Self::Upper(upper) => upper - z.exp(),
            Self::Interval(lower, upper) => (upper - lower).mul_add(logistic(z), lower),
        }
    }

    /// Map a constrained value back to unconstrained space.
    ///
    /// Values on or outside the boundary map to `±inf` or `NaN`.
    #[must_use]
    pub fn inverse(self, theta: f64) -> f64 {
        match self {
            Self::Identity => theta,
            Self::Lower(lower) => (theta - lower).ln(),
            Self::Upper(upper) => (upper - theta).ln(),
            Self::Interval(lower, upper) => {
                let share = (theta - lower) / (upper - lower);
                (share / (1.0 - share)).ln()
            }
        }
    }

    /// `log |d theta / d z|` at `z`.
    #[must_use]
    pub fn log_abs_det_jacobian(self, z: f64) -> f64 {
        match self {
            Self::Identity => 0.0,
            Self::Lower(_) | Self::Upper(_) => z,
            Self::Interval(lower, upper) => (upper - lower).ln() - softplus(-z) - softplus(z),
        }
    }

    /// `d theta / d z` at `z`, used for the chain rule.
    #[must_use]
    pub fn jacobian(self, z: f64) -> f64 {
        match self {
            Self::Identity => 1.0,
            Self::Lower(_) => z.exp(),
            Self::Upper(_) => -z.exp(),
            Self::Interval(lower, upper) => {
                let s = logistic(z);
                (upper - lower) * s * (1.0 - s)
            }
        }
    }

    /// Derivative of [`Self::log_abs_det_jacobian`] with respect to `z`.
    #[must_use]
    pub fn grad_log_abs_det_jacobian(self, z: f64) -> f64 {
        match self {
            Self::Identity => 0.0,
            Self::Lower(_) | Self::Upper(_) => 1.0,
            Self::Interval(..) => 2.0_f64.mul_add(-logistic(z), 1.0),
        }
    }
}

fn logistic(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + exp(x))` without overflow.
fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const BIJECTORS: [Bijector; 4] = [
        Bijector::Identity,
        Bijector::Lower(0.0),
        Bijector::Upper(3.0),
        Bijector::Interval(0.0, 100.0),
    ];

    #[test]
    fn forward_then_inverse_is_identity() {
        for bijector in BIJECTORS {
            for z in [-3.0, -0.5, 0.0, 0.7, 2.5] {
                assert_relative_eq!(bijector.inverse(bijector.forward(z)), z, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn forward_respects_bounds() {
        for z in [-30.0, -1.0, 0.0, 1.0, 30.0] {
            assert!(Bijector::Lower(0.0).forward(z) > 0.0);
            assert!(Bijector::Upper(3.0).forward(z) < 3.0);
            let theta = Bijector::Interval(0.0, 100.0).forward(z);
            assert!((0.0..=100.0).contains(&theta));
        }
    }

    #[test]
    fn jacobian_matches_finite_difference() {
        let h = 1e-6;
        for bijector in BIJECTORS {
            for z in [-1.3, 0.0, 0.9] {
                let numeric = (bijector.forward(z + h) - bijector.forward(z - h)) / (2.0 * h);
                assert_relative_eq!(bijector.jacobian(z), numeric, epsilon = 1e-5);
                assert_relative_eq!(
                    bijector.log_abs_det_jacobian(z),
                    bijector.jacobian(z).abs().ln(),
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn log_jacobian_gradient_matches_finite_difference() {
        let h = 1e-6;
        for bijector in BIJECTORS {
            for z in [-2.0, 0.3, 1.7] {
                let numeric = (bijector.log_abs_det_jacobian(z + h)
                    - bijector.log_abs_det_jacobian(z - h))
                    / (2.0 * h);
                assert_relative_eq!(
                    bijector.grad_log_abs_det_jacobian(z),
                    numeric,
                    epsilon = 1e-5
                );
            }
        }
    }

    #[test]
    fn from_bounds_picks_matching_variant() {
        assert_eq!(Bijector::from_bounds(None, None), Bijector::Identity);
        assert_eq!(Bijector::from_bounds(Some(0.0), None), Bijector::Lower(0.0));
        assert_eq!(
            Bijector::from_bounds(Some(0.0), Some(1.0)),
            Bijector::Interval(0.0, 1.0)
        );
    }
}
