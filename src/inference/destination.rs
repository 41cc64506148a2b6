//! Posterior over candidate destinations given an observed trajectory.

use crate::{
    Error, Result,
    mdp::{Mdp, Trajectory},
    utils::logsumexp,
    value_iter::backward_value_iter,
};

/// Posterior probability of each candidate destination.
///
/// Under the softmax-rational model with a uniform prior, the likelihood of
/// the observed steps given destination `d` is proportional to
/// `exp(V_d[end] - V_d[start])`: the harder the observed prefix is to explain
/// as progress toward `d`, the lower its weight. The returned vector is
/// aligned with `dests` and sums to one.
///
/// An empty trajectory carries no evidence and yields the uniform prior.
///
/// # Errors
///
/// Returns [`Error::EmptyDestinationSet`] for an empty candidate set,
/// [`Error::UnreachableDestinations`] when no candidate is reachable from
/// the trajectory's endpoint, and validation errors for malformed input.
pub fn infer_destination<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    beta: f64,
    dests: &[usize],
    max_iters: Option<usize>,
) -> Result<Vec<f64>> {
    if dests.is_empty() {
        return Err(Error::EmptyDestinationSet);
    }
    for &d in dests {
        if d >= mdp.num_states() {
            return Err(Error::StateOutOfBounds {
                state: d,
                num_states: mdp.num_states(),
            });
        }
    }
    if traj.is_empty() {
        return Ok(vec![1.0 / dests.len() as f64; dests.len()]);
    }
    traj.validate(mdp)?;

    let start = traj.start().ok_or(Error::EmptyTrajectory)?;
    let end = traj.end_state(mdp).ok_or(Error::EmptyTrajectory)?;

    let mut log_weights = Vec::with_capacity(dests.len());
    for &d in dests {
        let values = backward_value_iter(mdp, d, beta, max_iters)?;
        let weight = if values[end].is_finite() && values[start].is_finite() {
            values[end] - values[start]
        } else {
            f64::NEG_INFINITY
        };
        log_weights.push(weight);
    }

    let normalizer = logsumexp(&log_weights);
    if !normalizer.is_finite() {
        return Err(Error::UnreachableDestinations);
    }
    Ok(log_weights
        .into_iter()
        .map(|w| (w - normalizer).exp())
        .collect())
}
