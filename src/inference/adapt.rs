//! Warmup adaptation: dual-averaging step size and windowed estimation of a
//! diagonal inverse mass matrix.

use super::LogDensity;
use super::hmc::{Leapfrog, PhasePoint};
use crate::utils::usize_to_f64;

/// Nesterov dual averaging of `log(step_size)` towards a target acceptance.
#[derive(Debug, Clone)]
pub struct DualAveraging {
    target_accept: f64,
    log_eps: f64,
    log_eps_bar: f64,
    h_bar: f64,
    mu: f64,
    step: usize,
}

impl DualAveraging {
    const GAMMA: f64 = 0.05;
    const T0: f64 = 10.0;
    const KAPPA: f64 = 0.75;

    #[must_use]
    pub fn new(target_accept: f64, step_size: f64) -> Self {
        let log_eps = step_size.ln();
        Self {
            target_accept,
            log_eps,
            log_eps_bar: log_eps,
            h_bar: 0.0,
            mu: (10.0 * step_size).ln(),
            step: 0,
        }
    }

    pub fn update(&mut self, accept_prob: f64) {
        self.step += 1;
        let m = usize_to_f64(self.step);
        let w = 1.0 / (m + Self::T0);
        self.h_bar = (1.0 - w).mul_add(self.h_bar, w * (self.target_accept - accept_prob));
        self.log_eps = self.mu - (m.sqrt() / Self::GAMMA) * self.h_bar;
        let m_kappa = m.powf(-Self::KAPPA);
        self.log_eps_bar = m_kappa.mul_add(self.log_eps, (1.0 - m_kappa) * self.log_eps_bar);
    }

    /// Step size to use for the next warmup transition.
    #[must_use]
    pub fn step_size(&self) -> f64 {
        self.log_eps.exp()
    }

    /// Smoothed step size to freeze after warmup.
    #[must_use]
    pub fn adapted_step_size(&self) -> f64 {
        self.log_eps_bar.exp()
    }

    pub fn restart(&mut self, step_size: f64) {
        *self = Self::new(self.target_accept, step_size);
    }
}

/// Streaming per-component variance.
#[derive(Debug, Clone)]
pub struct WelfordVariance {
    mean: Vec<f64>,
    m2: Vec<f64>,
    count: usize,
}

impl WelfordVariance {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            mean: vec![0.0; dim],
            m2: vec![0.0; dim],
            count: 0,
        }
    }

    pub fn update(&mut self, x: &[f64]) {
        self.count += 1;
        let n = usize_to_f64(self.count);
        for ((mean, m2), value) in self.mean.iter_mut().zip(&mut self.m2).zip(x) {
            let delta = value - *mean;
            *mean += delta / n;
            *m2 += delta * (value - *mean);
        }
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Sample variance shrunk towards `1e-3`, or ones with fewer than two samples.
    #[must_use]
    pub fn regularized_variance(&self) -> Vec<f64> {
        if self.count < 2 {
            return vec![1.0; self.mean.len()];
        }
        let n = usize_to_f64(self.count);
        let weight = n / (n + 5.0);
        self.m2
            .iter()
            .map(|m2| weight.mul_add(m2 / (n - 1.0), 1e-3 * (5.0 / (n + 5.0))))
            .collect()
    }

    pub fn reset(&mut self) {
        self.mean.fill(0.0);
        self.m2.fill(0.0);
        self.count = 0;
    }
}

/// Warmup windows as `(start, end)` iteration ranges.
///
/// An initial fast window tunes step size only, slow windows of doubling
/// length collect draws for the metric, and a terminal fast window retunes
/// step size against the final metric. Runs shorter than 50 iterations
/// adapt step size only.
#[must_use]
pub fn compute_windows(warmup: usize) -> Vec<(usize, usize)> {
    if warmup < 50 {
        return vec![(0, warmup)];
    }
    let init_buffer = 75.min(warmup / 5);
    let term_buffer = 50.min(warmup / 5);
    let slow_end = warmup - term_buffer;

    let mut windows = vec![(0, init_buffer)];
    let mut start = init_buffer;
    let mut size = 25;
    while start < slow_end {
        let mut end = (start + size).min(slow_end);
        // Fold a short remainder into the current window.
        if slow_end - end < 2 * size {
            end = slow_end;
        }
        windows.push((start, end));
        start = end;
        size *= 2;
    }
    windows.push((slow_end, warmup));
    windows
}

/// Step size plus diagonal metric adaptation over the warmup schedule.
#[derive(Debug, Clone)]
pub struct WindowedAdaptation {
    dual: DualAveraging,
    variance: WelfordVariance,
    windows: Vec<(usize, usize)>,
    current: usize,
    inv_mass: Vec<f64>,
}

impl WindowedAdaptation {
    #[must_use]
    pub fn new(dim: usize, warmup: usize, target_accept: f64, step_size: f64) -> Self {
        Self {
            dual: DualAveraging::new(target_accept, step_size),
            variance: WelfordVariance::new(dim),
            windows: compute_windows(warmup),
            current: 0,
            inv_mass: vec![1.0; dim],
        }
    }

    fn in_slow_window(&self) -> bool {
        self.current > 0 && self.current + 1 < self.windows.len()
    }

    /// Record warmup iteration `iter` ending at position `q`.
    ///
    /// Returns `true` when a slow window closed and the metric changed; the
    /// caller should then search a new step size and call [`Self::restart`].
    pub fn update(&mut self, iter: usize, q: &[f64], accept_prob: f64) -> bool {
        self.dual.update(accept_prob);
        let Some(&(_, end)) = self.windows.get(self.current) else {
            return false;
        };
        if self.in_slow_window() {
            self.variance.update(q);
        }
        if iter + 1 < end {
            return false;
        }
        let metric_updated = self.in_slow_window();
        if metric_updated {
            self.inv_mass = self.variance.regularized_variance();
            self.variance.reset();
        }
        self.current += 1;
        metric_updated
    }

    pub fn restart(&mut self, step_size: f64) {
        self.dual.restart(step_size);
    }

    #[must_use]
    pub fn step_size(&self) -> f64 {
        self.dual.step_size()
    }

    #[must_use]
    pub fn adapted_step_size(&self) -> f64 {
        self.dual.adapted_step_size()
    }

    #[must_use]
    pub fn inv_mass(&self) -> &[f64] {
        &self.inv_mass
    }
}

/// Double or halve a step size until one leapfrog step from `q` crosses an
/// acceptance probability of one half.
pub fn find_reasonable_step_size<M: LogDensity + ?Sized>(
    model: &M,
    q: &[f64],
    inv_mass: &[f64],
) -> f64 {
    let mut start = PhasePoint::at(model, q.to_vec());
    if !start.is_finite() {
        return 0.01;
    }
    start.p = inv_mass.iter().map(|scale| 1.0 / scale.sqrt()).collect();
    let h0 = start.hamiltonian(inv_mass);

    let log_accept = |step_size: f64| {
        let mut point = start.clone();
        Leapfrog::new(model, step_size, inv_mass).step(&mut point, true);
        let delta = h0 - point.hamiltonian(inv_mass);
        if delta.is_finite() {
            delta
        } else {
            f64::NEG_INFINITY
        }
    };

    let mut step_size = 1.0;
    let increase = log_accept(step_size) > 0.5_f64.ln();
    for _ in 0..100 {
        let next = if increase {
            step_size * 2.0
        } else {
            step_size * 0.5
        };
        if !(1e-10..=1e7).contains(&next) {
            break;
        }
        let crossed = if increase {
            log_accept(next) < 0.5_f64.ln()
        } else {
            log_accept(next) > 0.5_f64.ln()
        };
        step_size = next;
        if crossed {
            break;
        }
    }
    step_size
}
