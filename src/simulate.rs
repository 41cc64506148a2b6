//! Sampling trajectories from the softmax-rational policy.

use rand::Rng;

use crate::{
    Error, Result,
    mdp::{Mdp, Trajectory},
    utils::weighted_sample,
    value_iter::backward_value_iter,
};

/// Action distribution of the softmax-rational agent in `state`.
///
/// With `values` the backward soft values for the agent's goal, action `a`
/// is chosen with probability proportional to
/// `exp(reward(state) / beta + values[transition(state, a)])`: the relative
/// soft value of where the action leads. Actions leading only to unreachable
/// states get zero probability.
///
/// # Errors
///
/// Returns [`Error::NoReachableSuccessor`] when every action leads to an
/// unreachable state; the goal cannot be reached from here.
pub fn softmax_action_distribution<M: Mdp>(
    mdp: &M,
    values: &[f64],
    state: usize,
    beta: f64,
) -> Result<Vec<(M::Action, f64)>> {
    if state >= mdp.num_states() {
        return Err(Error::StateOutOfBounds {
            state,
            num_states: mdp.num_states(),
        });
    }
    let reward = mdp.state_rewards()[state];

    let log_weights: Vec<(M::Action, f64)> = mdp
        .actions(state)
        .into_iter()
        .filter_map(|a| {
            let succ = mdp.transition(state, a)?;
            Some((a, reward / beta + values[succ]))
        })
        .collect();

    let max = log_weights
        .iter()
        .map(|&(_, w)| w)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(Error::NoReachableSuccessor { state });
    }

    let unnormalized: Vec<(M::Action, f64)> = log_weights
        .into_iter()
        .map(|(a, w)| (a, (w - max).exp()))
        .collect();
    let total: f64 = unnormalized.iter().map(|&(_, w)| w).sum();
    Ok(unnormalized
        .into_iter()
        .map(|(a, w)| (a, w / total))
        .collect())
}

/// Sample one trajectory of the softmax-rational agent from `start` toward
/// `goal`.
///
/// Runs backward value iteration once, then walks the policy of
/// [`softmax_action_distribution`] until the goal is reached or `max_steps`
/// steps have been taken. The trajectory is empty when `start == goal`.
///
/// # Errors
///
/// Returns [`Error::NoReachableSuccessor`] if the walk enters a state from
/// which the goal is unreachable. With the policy above this can only happen
/// at the start.
pub fn simulate<M, R>(
    mdp: &M,
    start: usize,
    goal: usize,
    beta: f64,
    max_steps: usize,
    rng: &mut R,
) -> Result<Trajectory<M::Action>>
where
    M: Mdp,
    R: Rng,
{
    let values = backward_value_iter(mdp, goal, beta, None)?;

    let mut traj = Trajectory::new();
    let mut state = start;
    while state != goal && traj.len() < max_steps {
        let distribution = softmax_action_distribution(mdp, &values, state, beta)?;
        let action =
            weighted_sample(rng, &distribution).ok_or(Error::NoReachableSuccessor { state })?;
        traj.push(mdp, state, action)?;
        state = match mdp.transition(state, action) {
            Some(next) => next,
            None => return Err(Error::NoReachableSuccessor { state }),
        };
    }
    Ok(traj)
}
