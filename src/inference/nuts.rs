//! No-U-Turn sampling with multinomial trajectory sampling.
//!
//! Each transition doubles a trajectory in a random direction until the
//! no-U-turn criterion fires, the energy error diverges, or the maximum tree
//! depth is reached. The next state is drawn from the trajectory with
//! weights `exp(H0 - H)`.

use log::debug;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use super::adapt::{WindowedAdaptation, find_reasonable_step_size};
use super::hmc::{Leapfrog, PhasePoint, sample_momentum};
use super::{LogDensity, SamplerConfig, SamplerError};
use crate::utils::usize_to_f64;

/// Energy error above which a trajectory is declared divergent.
const DIVERGENCE_THRESHOLD: f64 = 1000.0;
const MAX_INIT_ATTEMPTS: usize = 100;

/// Draws and per-iteration diagnostics of one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainDraws {
    /// Retained constrained draws, one vector per iteration.
    pub draws: Vec<Vec<f64>>,
    pub divergent: Vec<bool>,
    pub tree_depth: Vec<usize>,
    pub accept_prob: Vec<f64>,
    /// Step size frozen at the end of warmup.
    pub step_size: f64,
    /// Adapted diagonal inverse mass matrix.
    pub inv_mass: Vec<f64>,
}

impl ChainDraws {
    #[must_use]
    pub fn divergences(&self) -> usize {
        self.divergent.iter().filter(|flag| **flag).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

/// Outcome of one transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub point: PhasePoint,
    pub depth: usize,
    pub divergent: bool,
    pub accept_prob: f64,
}

struct Tree {
    left: PhasePoint,
    right: PhasePoint,
    proposal: PhasePoint,
    log_sum_weight: f64,
    n_leapfrog: usize,
    sum_accept_prob: f64,
    divergent: bool,
    turning: bool,
}

fn log_sum_exp(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max == f64::NEG_INFINITY {
        f64::NEG_INFINITY
    } else {
        max + ((a - max).exp() + (b - max).exp()).ln()
    }
}

fn is_turning(left: &PhasePoint, right: &PhasePoint, inv_mass: &[f64]) -> bool {
    let mut dot_left = 0.0;
    let mut dot_right = 0.0;
    for k in 0..inv_mass.len() {
        let dq = right.q[k] - left.q[k];
        dot_left += dq * inv_mass[k] * left.p[k];
        dot_right += dq * inv_mass[k] * right.p[k];
    }
    dot_left < 0.0 || dot_right < 0.0
}

fn build_leaf<M: LogDensity + ?Sized>(
    integrator: &Leapfrog<'_, M>,
    from: &PhasePoint,
    forward: bool,
    h0: f64,
) -> Tree {
    let mut point = from.clone();
    integrator.step(&mut point, forward);
    let energy_error = point.hamiltonian(integrator.inv_mass()) - h0;
    let (log_weight, accept_prob, divergent) = if energy_error.is_finite() {
        (
            -energy_error,
            (-energy_error).exp().min(1.0),
            energy_error > DIVERGENCE_THRESHOLD,
        )
    } else {
        (f64::NEG_INFINITY, 0.0, true)
    };
    Tree {
        left: point.clone(),
        right: point.clone(),
        proposal: point,
        log_sum_weight: log_weight,
        n_leapfrog: 1,
        sum_accept_prob: accept_prob,
        divergent,
        turning: false,
    }
}

fn build_tree<M: LogDensity + ?Sized>(
    integrator: &Leapfrog<'_, M>,
    from: &PhasePoint,
    depth: usize,
    forward: bool,
    h0: f64,
    rng: &mut StdRng,
) -> Tree {
    if depth == 0 {
        return build_leaf(integrator, from, forward, h0);
    }
    let mut inner = build_tree(integrator, from, depth - 1, forward, h0, rng);
    if inner.divergent || inner.turning {
        return inner;
    }
    let edge = if forward { &inner.right } else { &inner.left };
    let outer = build_tree(integrator, edge, depth - 1, forward, h0, rng);

    let merged_weight = log_sum_exp(inner.log_sum_weight, outer.log_sum_weight);
    if rng.random::<f64>() < (outer.log_sum_weight - merged_weight).exp() {
        inner.proposal = outer.proposal;
    }
    inner.log_sum_weight = merged_weight;
    inner.n_leapfrog += outer.n_leapfrog;
    inner.sum_accept_prob += outer.sum_accept_prob;
    inner.divergent |= outer.divergent;
    inner.turning |= outer.turning;
    if forward {
        inner.right = outer.right;
    } else {
        inner.left = outer.left;
    }
    inner.turning |= is_turning(&inner.left, &inner.right, integrator.inv_mass());
    inner
}

/// One NUTS transition from `current`.
pub fn transition<M: LogDensity + ?Sized>(
    integrator: &Leapfrog<'_, M>,
    current: &PhasePoint,
    max_treedepth: usize,
    rng: &mut StdRng,
) -> Transition {
    let mut start = current.clone();
    start.p = sample_momentum(rng, integrator.inv_mass());
    let h0 = start.hamiltonian(integrator.inv_mass());

    let mut tree = Tree {
        left: start.clone(),
        right: start.clone(),
        proposal: start,
        log_sum_weight: 0.0,
        n_leapfrog: 0,
        sum_accept_prob: 0.0,
        divergent: false,
        turning: false,
    };

    let mut depth = 0;
    while depth < max_treedepth {
        let forward = rng.random::<bool>();
        let edge = if forward { &tree.right } else { &tree.left };
        let subtree = build_tree(integrator, edge, depth, forward, h0, rng);
        depth += 1;

        tree.n_leapfrog += subtree.n_leapfrog;
        tree.sum_accept_prob += subtree.sum_accept_prob;
        if subtree.divergent {
            tree.divergent = true;
            break;
        }
        if subtree.turning {
            break;
        }

        // Biased progressive sampling favours the newer subtree.
        if rng.random::<f64>() < (subtree.log_sum_weight - tree.log_sum_weight).exp() {
            tree.proposal = subtree.proposal;
        }
        tree.log_sum_weight = log_sum_exp(tree.log_sum_weight, subtree.log_sum_weight);
        if forward {
            tree.right = subtree.right;
        } else {
            tree.left = subtree.left;
        }
        if is_turning(&tree.left, &tree.right, integrator.inv_mass()) {
            break;
        }
    }

    let accept_prob = tree.sum_accept_prob / usize_to_f64(tree.n_leapfrog.max(1));
    Transition {
        point: tree.proposal,
        depth,
        divergent: tree.divergent,
        accept_prob,
    }
}

fn initial_point<M: LogDensity + ?Sized>(
    model: &M,
    radius: f64,
    chain: usize,
    rng: &mut StdRng,
) -> Result<PhasePoint, SamplerError> {
    for _ in 0..MAX_INIT_ATTEMPTS {
        let q = (0..model.dim())
            .map(|_| radius * 2.0_f64.mul_add(rng.random::<f64>(), -1.0))
            .collect();
        let point = PhasePoint::at(model, q);
        if point.is_finite() {
            return Ok(point);
        }
    }
    Err(SamplerError::InitializationFailed {
        chain,
        attempts: MAX_INIT_ATTEMPTS,
    })
}

/// Run one chain: warmup with adaptation, then retained sampling.
///
/// # Errors
///
/// Returns `SamplerError::InitializationFailed` if no finite starting point
/// is found.
pub fn run_chain<M: LogDensity + ?Sized>(
    model: &M,
    config: &SamplerConfig,
    chain: usize,
) -> Result<ChainDraws, SamplerError> {
    let mut rng = StdRng::seed_from_u64(config.chain_seed(chain));
    let mut current = initial_point(model, config.init_radius, chain, &mut rng)?;

    let mut inv_mass = vec![1.0; model.dim()];
    let mut step_size = find_reasonable_step_size(model, &current.q, &inv_mass);
    let mut adaptation =
        WindowedAdaptation::new(model.dim(), config.warmup, config.target_accept, step_size);

    let retained = config.retained_draws();
    let mut out = ChainDraws {
        draws: Vec::with_capacity(retained),
        divergent: Vec::with_capacity(retained),
        tree_depth: Vec::with_capacity(retained),
        accept_prob: Vec::with_capacity(retained),
        step_size,
        inv_mass: inv_mass.clone(),
    };

    for iter in 0..config.iterations {
        let warming_up = iter < config.warmup;
        if warming_up {
            step_size = adaptation.step_size();
        }
        let integrator = Leapfrog::new(model, step_size, &inv_mass);
        let next = transition(&integrator, &current, config.max_treedepth, &mut rng);
        current = next.point;

        if warming_up {
            if adaptation.update(iter, &current.q, next.accept_prob) {
                inv_mass = adaptation.inv_mass().to_vec();
                let restarted = find_reasonable_step_size(model, &current.q, &inv_mass);
                adaptation.restart(restarted);
            }
            if iter + 1 == config.warmup {
                step_size = adaptation.adapted_step_size();
                debug!("chain {chain}: warmup finished with step size {step_size:.4}");
            }
            continue;
        }

        if (iter - config.warmup).is_multiple_of(config.thin) {
            out.draws.push(model.constrain(&current.q));
            out.divergent.push(next.divergent);
            out.tree_depth.push(next.depth);
            out.accept_prob.push(next.accept_prob);
        }
    }

    out.step_size = step_size;
    out.inv_mass = inv_mass;
    Ok(out)
}
