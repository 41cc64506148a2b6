//! Estimation of how rational a softmax-optimal agent is.
//!
//! A softmax-rational agent heads for a goal but randomizes over paths,
//! weighting each path by the exponential of its cumulative reward scaled by
//! an inverse temperature `beta`. Small `beta` approaches deterministic
//! shortest-path behavior; large `beta` approaches a uniform walk. Given a
//! grid-world trajectory, this crate estimates that `beta`, and answers the
//! related questions of where the agent is heading and which states it will
//! visit on the way.
//!
//! The pieces:
//!
//! - [`mdp`]: the [`mdp::Mdp`] collaborator contract, observed
//!   [`mdp::Trajectory`] data and the 8-connected
//!   [`mdp::gridworld::GridWorldMdp`].
//! - [`value_iter`]: soft (log-sum-exp) value iteration in both directions,
//!   plus the deterministic shortest-path reference it tends to as
//!   `beta -> 0`.
//! - [`inference`]: destination posteriors, expected state occupancies, and
//!   the three `beta` search strategies with their analytic score gradient.
//! - [`simulate`]: sampling trajectories from the softmax policy, for
//!   generating test data and validating estimates end to end.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! use rand::{SeedableRng, rngs::StdRng};
//! use rationality::inference::{SimpleSearchOptions, beta_simple_search};
//! use rationality::mdp::gridworld::GridWorldMdp;
//! use rationality::simulate::simulate;
//!
//! # fn main() -> rationality::Result<()> {
//! let grid = GridWorldMdp::new(6, 1, HashMap::new(), -1.0)?;
//! let goal = grid.coor_to_state(5, 0)?;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let traj = simulate(&grid, 0, goal, 0.9, 200, &mut rng)?;
//!
//! let options = SimpleSearchOptions {
//!     min_beta: 0.4,
//!     max_beta: 1.3,
//!     ..SimpleSearchOptions::default()
//! };
//! let estimate = beta_simple_search(&grid, &traj, goal, None, &options)?;
//! assert!(estimate.is_some());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod inference;
pub mod mdp;
pub mod simulate;
pub mod utils;
pub mod value_iter;

pub use error::{Error, Result};
pub use inference::{
    BinarySearchOptions, GradientAscentOptions, GradientTerms, LearningRate, SearchStep,
    SearchTrace, SimpleSearchOptions, beta_binary_search, beta_gradient_ascent,
    beta_simple_search, compute_gradient, compute_gradient_terms, compute_score,
    infer_destination, infer_occupancies, infer_occupancies_from_start, occupancies_toward,
};
pub use mdp::{Mdp, Trajectory};
pub use value_iter::{backward_value_iter, forward_value_iter, max_update, shortest_path};
