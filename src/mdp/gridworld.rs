//! 8-connected grid-world MDP, the reference collaborator for the estimators.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, mdp::Mdp};

/// One of the eight compass moves. There is no stay-in-place action; the
/// goal of a value-iteration run is absorbing by construction instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Action {
    /// All eight moves, in a fixed order.
    pub const ALL: [Action; 8] = [
        Action::North,
        Action::South,
        Action::East,
        Action::West,
        Action::NorthEast,
        Action::NorthWest,
        Action::SouthEast,
        Action::SouthWest,
    ];

    /// Row/column displacement of the move.
    fn delta(self) -> (isize, isize) {
        match self {
            Action::North => (-1, 0),
            Action::South => (1, 0),
            Action::East => (0, 1),
            Action::West => (0, -1),
            Action::NorthEast => (-1, 1),
            Action::NorthWest => (-1, -1),
            Action::SouthEast => (1, 1),
            Action::SouthWest => (1, -1),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::North => "N",
            Action::South => "S",
            Action::East => "E",
            Action::West => "W",
            Action::NorthEast => "NE",
            Action::NorthWest => "NW",
            Action::SouthEast => "SE",
            Action::SouthWest => "SW",
        };
        write!(f, "{name}")
    }
}

/// A `rows x cols` grid with one reward per cell.
///
/// Cell `(x, y)` (row `x`, column `y`) maps to state index `x * cols + y`.
/// Rewards default to `default_reward` with sparse per-cell overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridWorldMdp {
    rows: usize,
    cols: usize,
    state_rewards: Vec<f64>,
}

impl GridWorldMdp {
    /// Build a grid world.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CellOutOfBounds`] for an override outside the grid
    /// and [`Error::NonFiniteReward`] for a non-finite reward value.
    pub fn new(
        rows: usize,
        cols: usize,
        reward_overrides: HashMap<(usize, usize), f64>,
        default_reward: f64,
    ) -> Result<Self> {
        let mut state_rewards = vec![default_reward; rows * cols];
        for (&(x, y), &reward) in &reward_overrides {
            if x >= rows || y >= cols {
                return Err(Error::CellOutOfBounds { x, y, rows, cols });
            }
            if !reward.is_finite() {
                return Err(Error::NonFiniteReward {
                    state: x * cols + y,
                    value: reward,
                });
            }
            state_rewards[x * cols + y] = reward;
        }
        Ok(GridWorldMdp {
            rows,
            cols,
            state_rewards,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// State index of cell `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CellOutOfBounds`] when the cell is outside the grid.
    pub fn coor_to_state(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.rows || y >= self.cols {
            return Err(Error::CellOutOfBounds {
                x,
                y,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(x * self.cols + y)
    }

    /// Cell `(x, y)` of a state index.
    pub fn state_to_coor(&self, state: usize) -> Result<(usize, usize)> {
        if state >= self.state_rewards.len() {
            return Err(Error::StateOutOfBounds {
                state,
                num_states: self.state_rewards.len(),
            });
        }
        Ok((state / self.cols, state % self.cols))
    }

    fn neighbor(&self, state: usize, action: Action) -> Option<usize> {
        let x = (state / self.cols) as isize;
        let y = (state % self.cols) as isize;
        let (dx, dy) = action.delta();
        let (nx, ny) = (x + dx, y + dy);
        if nx < 0 || ny < 0 || nx >= self.rows as isize || ny >= self.cols as isize {
            return None;
        }
        Some(nx as usize * self.cols + ny as usize)
    }
}

impl Mdp for GridWorldMdp {
    type Action = Action;

    fn num_states(&self) -> usize {
        self.state_rewards.len()
    }

    fn state_rewards(&self) -> &[f64] {
        &self.state_rewards
    }

    fn actions(&self, state: usize) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|&a| self.neighbor(state, a).is_some())
            .collect()
    }

    fn transition(&self, state: usize, action: Action) -> Option<usize> {
        self.neighbor(state, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_bounds_overrides() {
        let err = GridWorldMdp::new(3, 3, HashMap::from([((3, 0), -1.0)]), 0.0);
        assert!(matches!(err, Err(Error::CellOutOfBounds { x: 3, y: 0, .. })));
    }

    #[test]
    fn rejects_non_finite_rewards() {
        let err = GridWorldMdp::new(2, 2, HashMap::from([((0, 0), f64::NAN)]), 0.0);
        assert!(matches!(err, Err(Error::NonFiniteReward { state: 0, .. })));
    }

    #[test]
    fn reward_table_applies_overrides() {
        let g = GridWorldMdp::new(3, 3, HashMap::from([((2, 0), -3.0), ((1, 1), -4.0)]), -1.0)
            .unwrap();
        assert_eq!(g.state_rewards()[6], -3.0);
        assert_eq!(g.state_rewards()[4], -4.0);
        assert_eq!(g.state_rewards()[0], -1.0);
    }

    #[test]
    fn coordinate_round_trip() {
        let g = GridWorldMdp::new(3, 3, HashMap::new(), 0.0).unwrap();
        assert_eq!(g.coor_to_state(2, 2).unwrap(), 8);
        assert_eq!(g.state_to_coor(6).unwrap(), (2, 0));
        assert!(g.coor_to_state(0, 3).is_err());
        assert!(g.state_to_coor(9).is_err());
    }

    #[test]
    fn connectivity_is_eight_way_within_bounds() {
        let g = GridWorldMdp::new(3, 3, HashMap::new(), 0.0).unwrap();
        // Corner, edge and center cells of a 3x3 grid.
        assert_eq!(g.actions(0).len(), 3);
        assert_eq!(g.actions(1).len(), 5);
        assert_eq!(g.actions(4).len(), 8);

        let mut succ = g.successors(4);
        succ.sort_unstable();
        assert_eq!(succ, vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn corridor_has_line_connectivity() {
        let g = GridWorldMdp::new(3, 1, HashMap::new(), 0.0).unwrap();
        assert_eq!(g.successors(0), vec![1]);
        let mut mid = g.successors(1);
        mid.sort_unstable();
        assert_eq!(mid, vec![0, 2]);
        assert_eq!(g.successors(2), vec![1]);
    }
}
