//! Expected state-visit counts under the softmax path distribution.

use crate::{
    Error, Result,
    mdp::{Mdp, Trajectory},
    value_iter::{backward_value_iter, forward_value_iter_absorbing},
};

use super::destination::infer_destination;

/// Expected number of visits to each state on the way from `origin` to
/// `dest`.
///
/// A forward pass from the origin (with the destination absorbing, so walks
/// are cut on first arrival) and a backward pass from the destination factor
/// every walk through a state into a prefix and a suffix:
///
/// ```text
/// occ[s] = exp(F[s] + B[s] - F[dest])
/// ```
///
/// The destination's own entry is `0` by convention: its reward is never
/// collected, since the walk ends there. The origin's entry is at least `1`
/// (it is departed once, plus any revisits). When `origin == dest` all
/// entries are `0`.
///
/// # Errors
///
/// Returns [`Error::UnreachableDestinations`] if `dest` cannot be reached
/// from `origin`.
pub fn occupancies_toward<M: Mdp>(
    mdp: &M,
    origin: usize,
    dest: usize,
    beta: f64,
    max_iters: Option<usize>,
) -> Result<Vec<f64>> {
    if dest >= mdp.num_states() {
        return Err(Error::StateOutOfBounds {
            state: dest,
            num_states: mdp.num_states(),
        });
    }
    let forward = forward_value_iter_absorbing(mdp, origin, Some(dest), beta, max_iters)?;
    if origin == dest {
        return Ok(vec![0.0; mdp.num_states()]);
    }
    if !forward[dest].is_finite() {
        return Err(Error::UnreachableDestinations);
    }
    let backward = backward_value_iter(mdp, dest, beta, max_iters)?;

    let mut occupancies: Vec<f64> = forward
        .iter()
        .zip(&backward)
        .map(|(&f, &b)| {
            if f.is_finite() && b.is_finite() {
                (f + b - forward[dest]).exp()
            } else {
                0.0
            }
        })
        .collect();
    occupancies[dest] = 0.0;
    Ok(occupancies)
}

/// Expected future visit counts given a trajectory, marginalized over an
/// uncertain destination.
///
/// The destination posterior of [`infer_destination`] weights one
/// [`occupancies_toward`] run per candidate, each started from the
/// trajectory's endpoint. Candidates with zero posterior mass are skipped,
/// so a candidate unreachable from the endpoint does not fail the whole
/// computation as long as some candidate explains the data.
pub fn infer_occupancies<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    beta: f64,
    dests: &[usize],
    max_iters: Option<usize>,
) -> Result<Vec<f64>> {
    let posterior = infer_destination(mdp, traj, beta, dests, max_iters)?;
    let origin = traj.end_state(mdp).ok_or(Error::EmptyTrajectory)?;
    mix_by_weights(mdp, origin, dests, &posterior, beta, max_iters)
}

/// Expected visit counts from a bare start state, with no trajectory
/// evidence: destinations are mixed by the uniform prior instead of a
/// posterior.
pub fn infer_occupancies_from_start<M: Mdp>(
    mdp: &M,
    start: usize,
    beta: f64,
    dests: &[usize],
    max_iters: Option<usize>,
) -> Result<Vec<f64>> {
    if dests.is_empty() {
        return Err(Error::EmptyDestinationSet);
    }
    let prior = vec![1.0 / dests.len() as f64; dests.len()];
    mix_by_weights(mdp, start, dests, &prior, beta, max_iters)
}

fn mix_by_weights<M: Mdp>(
    mdp: &M,
    origin: usize,
    dests: &[usize],
    weights: &[f64],
    beta: f64,
    max_iters: Option<usize>,
) -> Result<Vec<f64>> {
    let mut mixed = vec![0.0; mdp.num_states()];
    for (&dest, &weight) in dests.iter().zip(weights) {
        if weight <= 0.0 {
            continue;
        }
        let occupancies = occupancies_toward(mdp, origin, dest, beta, max_iters)?;
        for (m, occ) in mixed.iter_mut().zip(&occupancies) {
            *m += weight * occ;
        }
    }
    Ok(mixed)
}
