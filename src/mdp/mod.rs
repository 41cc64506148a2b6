//! MDP collaborator contract and observed trajectories
//!
//! The estimation core is written against the [`Mdp`] trait rather than a
//! concrete model: any finite state space with an enumerable action set, a
//! (possibly partial) transition function and a per-state reward table can be
//! plugged in. [`gridworld::GridWorldMdp`] is the reference implementation.

pub mod gridworld;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Contract the estimation core requires from an MDP.
///
/// States are dense integer indices in `[0, num_states)`. Rewards are
/// state-indexed and collected on departure: taking any action out of state
/// `s` collects `state_rewards()[s]`.
pub trait Mdp {
    /// Action label. Only equality of the successor state matters to the
    /// core; the label is carried so trajectories stay replayable.
    type Action: Copy + fmt::Display;

    /// Number of states `S`.
    fn num_states(&self) -> usize;

    /// Reward table of length `S`, immutable for the duration of a run.
    fn state_rewards(&self) -> &[f64];

    /// Actions that are valid in `state`.
    fn actions(&self, state: usize) -> Vec<Self::Action>;

    /// Successor of `state` under `action`, or `None` when the action is
    /// invalid there.
    fn transition(&self, state: usize, action: Self::Action) -> Option<usize>;

    /// States reachable from `state` in one step.
    fn successors(&self, state: usize) -> Vec<usize> {
        self.actions(state)
            .into_iter()
            .filter_map(|a| self.transition(state, a))
            .collect()
    }
}

/// An observed sequence of `(state, action)` steps.
///
/// May be empty; every estimation routine special-cases that (no score or
/// gradient is defined for an empty trajectory).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory<A> {
    steps: Vec<(usize, A)>,
}

impl<A: Copy> Trajectory<A> {
    /// Empty trajectory.
    pub fn new() -> Self {
        Trajectory { steps: Vec::new() }
    }

    /// Build from raw steps without validation. Use [`Trajectory::validate`]
    /// before feeding externally sourced data into the estimators.
    pub fn from_steps(steps: Vec<(usize, A)>) -> Self {
        Trajectory { steps }
    }

    /// Append a step, validating it against the MDP.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateOutOfBounds`] or [`Error::UndefinedTransition`]
    /// if the step could not have been taken in `mdp`.
    pub fn push<M>(&mut self, mdp: &M, state: usize, action: A) -> Result<()>
    where
        M: Mdp<Action = A>,
        A: fmt::Display,
    {
        if state >= mdp.num_states() {
            return Err(Error::StateOutOfBounds {
                state,
                num_states: mdp.num_states(),
            });
        }
        if mdp.transition(state, action).is_none() {
            return Err(Error::UndefinedTransition {
                state,
                action: action.to_string(),
            });
        }
        self.steps.push((state, action));
        Ok(())
    }

    /// Check that every step is within bounds and every transition defined.
    pub fn validate<M>(&self, mdp: &M) -> Result<()>
    where
        M: Mdp<Action = A>,
        A: fmt::Display,
    {
        for &(state, action) in &self.steps {
            if state >= mdp.num_states() {
                return Err(Error::StateOutOfBounds {
                    state,
                    num_states: mdp.num_states(),
                });
            }
            if mdp.transition(state, action).is_none() {
                return Err(Error::UndefinedTransition {
                    state,
                    action: action.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn steps(&self) -> &[(usize, A)] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// State the trajectory starts from, if any step was recorded.
    pub fn start(&self) -> Option<usize> {
        self.steps.first().map(|&(s, _)| s)
    }

    /// Destination of the final step, obtained through the MDP's transition
    /// function. `None` for empty trajectories or undefined final steps.
    pub fn end_state<M>(&self, mdp: &M) -> Option<usize>
    where
        M: Mdp<Action = A>,
    {
        let &(state, action) = self.steps.last()?;
        mdp.transition(state, action)
    }

    /// Cumulative reward collected over the trajectory: one departure reward
    /// per recorded step.
    pub fn sum_rewards<M>(&self, mdp: &M) -> f64
    where
        M: Mdp<Action = A>,
    {
        let rewards = mdp.state_rewards();
        self.steps.iter().map(|&(s, _)| rewards[s]).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::gridworld::{Action, GridWorldMdp};
    use super::*;

    fn corridor() -> GridWorldMdp {
        GridWorldMdp::new(3, 1, HashMap::from([((2, 0), -10.0)]), -1.0).unwrap()
    }

    #[test]
    fn push_validates_states_and_transitions() {
        let g = corridor();
        let mut traj = Trajectory::new();
        traj.push(&g, 2, Action::North).unwrap();
        traj.push(&g, 1, Action::North).unwrap();

        assert!(matches!(
            traj.clone().push(&g, 3, Action::North),
            Err(Error::StateOutOfBounds { state: 3, .. })
        ));
        // East leaves the single-column grid.
        assert!(matches!(
            traj.push(&g, 0, Action::East),
            Err(Error::UndefinedTransition { state: 0, .. })
        ));
    }

    #[test]
    fn endpoints_and_rewards() {
        let g = corridor();
        let mut traj = Trajectory::new();
        assert_eq!(traj.start(), None);
        assert_eq!(traj.end_state(&g), None);
        assert_eq!(traj.sum_rewards(&g), 0.0);

        traj.push(&g, 2, Action::North).unwrap();
        traj.push(&g, 1, Action::North).unwrap();
        assert_eq!(traj.start(), Some(2));
        assert_eq!(traj.end_state(&g), Some(0));
        // Departure rewards: -10 from state 2, -1 from state 1.
        assert_eq!(traj.sum_rewards(&g), -11.0);
    }

    #[test]
    fn serde_round_trip() {
        let g = corridor();
        let mut traj = Trajectory::new();
        traj.push(&g, 2, Action::North).unwrap();
        traj.push(&g, 1, Action::North).unwrap();

        let json = serde_json::to_string(&traj).unwrap();
        let back: Trajectory<Action> = serde_json::from_str(&json).unwrap();
        assert_eq!(traj, back);
    }
}
