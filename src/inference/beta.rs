//! Estimation of the softmax inverse temperature `beta`.
//!
//! The log-likelihood of a trajectory under the softmax-rational model, up to
//! a `beta`-independent constant, is the *score*
//!
//! ```text
//! score(beta) = R / beta + V_beta[end] - V_beta[start]
//! ```
//!
//! where `R` is the trajectory's cumulative reward and `V_beta` the backward
//! soft values for the agent's goal. Small `beta` means near-deterministic
//! reward maximization; large `beta` means near-uniform behavior. The score
//! is maximized over `beta` by one of three strategies: finite-difference
//! bisection ([`beta_simple_search`]), gradient-sign bisection
//! ([`beta_binary_search`]), or gradient ascent ([`beta_gradient_ascent`]).
//! Each strategy has a `_traced` twin that additionally records its iterates;
//! the trace never influences the estimate.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    mdp::{Mdp, Trajectory},
    value_iter::backward_value_iter,
};

use super::occupancy::occupancies_toward;

/// Starting iterate used when a search is given no initial guess.
pub const DEFAULT_GUESS: f64 = 3.0;

/// Score of a trajectory for a known goal at inverse temperature `beta`.
///
/// # Errors
///
/// Returns [`Error::EmptyTrajectory`] when the trajectory has no steps, and
/// propagates validation and value-iteration errors.
pub fn compute_score<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    beta: f64,
    max_iters: Option<usize>,
) -> Result<f64> {
    if traj.is_empty() {
        return Err(Error::EmptyTrajectory);
    }
    traj.validate(mdp)?;
    let start = traj.start().ok_or(Error::EmptyTrajectory)?;
    let end = traj.end_state(mdp).ok_or(Error::EmptyTrajectory)?;

    let values = backward_value_iter(mdp, goal, beta, max_iters)?;
    Ok(traj.sum_rewards(mdp) / beta + values[end] - values[start])
}

/// The gradient of the score together with its two expectation terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientTerms {
    /// `d score / d beta`.
    pub gradient: f64,
    /// Expected reward still to be collected between the trajectory's end
    /// and the goal. Exactly `0` when the trajectory already ends there.
    pub ex_1: f64,
    /// Expected reward collected between the trajectory's start and the
    /// goal.
    pub ex_2: f64,
}

/// Analytic score gradient, decomposed into its terms.
///
/// Differentiating the score gives
///
/// ```text
/// d score / d beta = -(R + ex_1 - ex_2) / beta^2
/// ```
///
/// where the expectations are reward-weighted state occupancies under the
/// softmax path distribution toward the goal.
pub fn compute_gradient_terms<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    beta: f64,
    max_iters: Option<usize>,
) -> Result<GradientTerms> {
    if traj.is_empty() {
        return Err(Error::EmptyTrajectory);
    }
    traj.validate(mdp)?;
    let start = traj.start().ok_or(Error::EmptyTrajectory)?;
    let end = traj.end_state(mdp).ok_or(Error::EmptyTrajectory)?;
    let rewards = mdp.state_rewards();

    let expected_reward = |origin: usize| -> Result<f64> {
        let occupancies = occupancies_toward(mdp, origin, goal, beta, max_iters)?;
        Ok(occupancies
            .iter()
            .zip(rewards)
            .map(|(occ, r)| occ * r)
            .sum())
    };

    let ex_1 = if end == goal { 0.0 } else { expected_reward(end)? };
    let ex_2 = expected_reward(start)?;
    let gradient = -(traj.sum_rewards(mdp) + ex_1 - ex_2) / (beta * beta);
    Ok(GradientTerms {
        gradient,
        ex_1,
        ex_2,
    })
}

/// Analytic score gradient. See [`compute_gradient_terms`].
pub fn compute_gradient<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    beta: f64,
    max_iters: Option<usize>,
) -> Result<f64> {
    compute_gradient_terms(mdp, traj, goal, beta, max_iters).map(|t| t.gradient)
}

/// Step-size schedule for [`beta_gradient_ascent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LearningRate {
    /// The same rate at every iteration.
    Constant(f64),
    /// `max(k / (s * i + 1), base)` at iteration `i`: aggressive early
    /// steps decaying toward a floor.
    Harmonic { k: f64, s: f64, base: f64 },
}

impl LearningRate {
    /// Rate at iteration `i` (zero-based).
    pub fn rate(&self, iteration: usize) -> f64 {
        match *self {
            LearningRate::Constant(rate) => rate,
            LearningRate::Harmonic { k, s, base } => (k / (s * iteration as f64 + 1.0)).max(base),
        }
    }

    /// The default schedule: `k = 5`, `s = 2`, `base = 0.2`.
    pub fn default_harmonic() -> Self {
        LearningRate::Harmonic {
            k: 5.0,
            s: 2.0,
            base: 0.2,
        }
    }
}

/// One recorded iterate of a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchStep {
    pub iteration: usize,
    /// The midpoint probed this iteration (bisection strategies) or the
    /// iterate after this iteration's update (gradient ascent).
    pub beta: f64,
    /// Score slope at `beta`: analytic for the gradient-based strategies,
    /// a central finite difference for [`beta_simple_search`].
    pub gradient: Option<f64>,
    /// Bracket before this iteration's narrowing, for bisection strategies.
    pub bracket: Option<(f64, f64)>,
}

/// Recorded iterates of one search run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchTrace {
    pub steps: Vec<SearchStep>,
}

/// Tuning knobs for [`beta_simple_search`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimpleSearchOptions {
    /// Finite-difference half-width for probing the score slope.
    pub delta: f64,
    /// Stop once the bracket is narrower than this.
    pub beta_threshold: f64,
    pub min_beta: f64,
    pub max_beta: f64,
    /// Iterations to run before the width check may stop the search.
    pub min_iters: usize,
    pub max_iters: usize,
    /// Iteration cap handed to every value-iteration run.
    pub vi_max_iters: Option<usize>,
}

impl Default for SimpleSearchOptions {
    fn default() -> Self {
        SimpleSearchOptions {
            delta: 1e-2,
            beta_threshold: 5e-6,
            min_beta: 0.7,
            max_beta: 11.0,
            min_iters: 5,
            max_iters: 20,
            vi_max_iters: None,
        }
    }
}

/// Tuning knobs for [`beta_binary_search`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinarySearchOptions {
    /// Stop once the gradient magnitude drops below this.
    pub grad_threshold: f64,
    /// Stop once the bracket is narrower than this.
    pub beta_threshold: f64,
    pub min_beta: f64,
    pub max_beta: f64,
    pub min_iters: usize,
    pub max_iters: usize,
    pub vi_max_iters: Option<usize>,
}

impl Default for BinarySearchOptions {
    fn default() -> Self {
        BinarySearchOptions {
            grad_threshold: 1e-9,
            beta_threshold: 5e-5,
            min_beta: 0.7,
            max_beta: 11.0,
            min_iters: 10,
            max_iters: 30,
            vi_max_iters: None,
        }
    }
}

/// Tuning knobs for [`beta_gradient_ascent`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientAscentOptions {
    /// Stop once the step magnitude drops below this.
    pub threshold: f64,
    /// Per-iteration cap on the step magnitude.
    pub max_update: f64,
    pub min_beta: f64,
    pub max_beta: f64,
    pub min_iters: usize,
    pub max_iters: usize,
    pub learning_rate: LearningRate,
    pub vi_max_iters: Option<usize>,
}

impl Default for GradientAscentOptions {
    fn default() -> Self {
        GradientAscentOptions {
            threshold: 1e-9,
            max_update: 4.0,
            min_beta: 0.1,
            max_beta: 11.0,
            min_iters: 10,
            max_iters: 30,
            learning_rate: LearningRate::default_harmonic(),
            vi_max_iters: None,
        }
    }
}

/// Maximize the score by bisecting on a finite-difference slope estimate.
///
/// Two score evaluations at `mid +- delta` decide which half of the bracket
/// keeps the maximum; on a tie the upper half is discarded. The width check
/// runs both before and after each narrowing, but only once `min_iters`
/// iterations have passed.
///
/// An empty trajectory carries no evidence, so the guess (possibly `None`)
/// is handed back unchanged; a `None` guess on a non-empty trajectory
/// starts from the bracket midpoint.
///
/// # Panics
///
/// Panics if the iterate ever leaves the bracket, including a `guess`
/// outside `[min_beta, max_beta]`.
pub fn beta_simple_search<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    guess: Option<f64>,
    options: &SimpleSearchOptions,
) -> Result<Option<f64>> {
    simple_search_impl(mdp, traj, goal, guess, options, None)
}

/// [`beta_simple_search`] with its iterates recorded into `trace`.
pub fn beta_simple_search_traced<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    guess: Option<f64>,
    options: &SimpleSearchOptions,
    trace: &mut SearchTrace,
) -> Result<Option<f64>> {
    simple_search_impl(mdp, traj, goal, guess, options, Some(trace))
}

fn simple_search_impl<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    guess: Option<f64>,
    options: &SimpleSearchOptions,
    mut trace: Option<&mut SearchTrace>,
) -> Result<Option<f64>> {
    if traj.is_empty() {
        return Ok(guess);
    }

    let mut lo = options.min_beta;
    let mut hi = options.max_beta;
    let mut mid = guess.unwrap_or((lo + hi) / 2.0);

    for iteration in 0..options.max_iters {
        assert!(
            lo <= mid && mid <= hi,
            "iterate {mid} escaped the bracket [{lo}, {hi}]"
        );

        let below = compute_score(mdp, traj, goal, mid - options.delta, options.vi_max_iters)?;
        let above = compute_score(mdp, traj, goal, mid + options.delta, options.vi_max_iters)?;
        if let Some(t) = trace.as_deref_mut() {
            t.steps.push(SearchStep {
                iteration,
                beta: mid,
                gradient: Some((above - below) / (2.0 * options.delta)),
                bracket: Some((lo, hi)),
            });
        }
        if iteration >= options.min_iters && hi - lo < options.beta_threshold {
            break;
        }

        if above - below > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        if iteration >= options.min_iters && hi - lo < options.beta_threshold {
            break;
        }

        mid = (lo + hi) / 2.0;
    }
    Ok(Some(mid))
}

/// Maximize the score by bisecting on the sign of the analytic gradient.
///
/// A positive gradient at the midpoint moves the lower bound up, a negative
/// one moves the upper bound down. Stops early once the gradient magnitude
/// falls below `grad_threshold`.
///
/// Empty-trajectory and `None`-guess handling match [`beta_simple_search`].
///
/// # Panics
///
/// Panics if the iterate ever leaves the bracket.
pub fn beta_binary_search<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    guess: Option<f64>,
    options: &BinarySearchOptions,
) -> Result<Option<f64>> {
    binary_search_impl(mdp, traj, goal, guess, options, None)
}

/// [`beta_binary_search`] with its iterates recorded into `trace`.
pub fn beta_binary_search_traced<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    guess: Option<f64>,
    options: &BinarySearchOptions,
    trace: &mut SearchTrace,
) -> Result<Option<f64>> {
    binary_search_impl(mdp, traj, goal, guess, options, Some(trace))
}

fn binary_search_impl<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    guess: Option<f64>,
    options: &BinarySearchOptions,
    mut trace: Option<&mut SearchTrace>,
) -> Result<Option<f64>> {
    if traj.is_empty() {
        return Ok(guess);
    }

    let mut lo = options.min_beta;
    let mut hi = options.max_beta;
    let mut mid = guess.unwrap_or((lo + hi) / 2.0);

    for iteration in 0..options.max_iters {
        assert!(
            lo <= mid && mid <= hi,
            "iterate {mid} escaped the bracket [{lo}, {hi}]"
        );

        let gradient = compute_gradient(mdp, traj, goal, mid, options.vi_max_iters)?;
        if !gradient.is_finite() {
            return Err(Error::NonFiniteUpdate {
                value: gradient,
                iteration,
            });
        }
        if let Some(t) = trace.as_deref_mut() {
            t.steps.push(SearchStep {
                iteration,
                beta: mid,
                gradient: Some(gradient),
                bracket: Some((lo, hi)),
            });
        }
        if iteration >= options.min_iters && gradient.abs() < options.grad_threshold {
            break;
        }

        if gradient > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        if iteration >= options.min_iters && hi - lo < options.beta_threshold {
            break;
        }

        mid = (lo + hi) / 2.0;
    }
    Ok(Some(mid))
}

/// Maximize the score by gradient ascent with a clipped, scheduled step.
///
/// Each step is the learning rate times the analytic gradient, clipped to
/// `+-max_update`. Steps that are not clearly positive (below `1e-5`,
/// including all negative ones) are instead applied reversed and amplified
/// 130-fold, which kicks the iterate away from flat or downhill regions
/// instead of letting it creep. The iterate is clamped into
/// `[min_beta, max_beta]` after every update.
///
/// An empty trajectory hands back the guess unchanged; a `None` guess starts
/// from [`DEFAULT_GUESS`].
///
/// # Errors
///
/// Returns [`Error::NonFiniteUpdate`] if a step evaluates to NaN or
/// infinity.
pub fn beta_gradient_ascent<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    guess: Option<f64>,
    options: &GradientAscentOptions,
) -> Result<Option<f64>> {
    gradient_ascent_impl(mdp, traj, goal, guess, options, None)
}

/// [`beta_gradient_ascent`] with its iterates recorded into `trace`.
pub fn beta_gradient_ascent_traced<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    guess: Option<f64>,
    options: &GradientAscentOptions,
    trace: &mut SearchTrace,
) -> Result<Option<f64>> {
    gradient_ascent_impl(mdp, traj, goal, guess, options, Some(trace))
}

fn gradient_ascent_impl<M: Mdp>(
    mdp: &M,
    traj: &Trajectory<M::Action>,
    goal: usize,
    guess: Option<f64>,
    options: &GradientAscentOptions,
    mut trace: Option<&mut SearchTrace>,
) -> Result<Option<f64>> {
    if traj.is_empty() {
        return Ok(guess);
    }

    let mut curr = guess.unwrap_or(DEFAULT_GUESS);
    for iteration in 0..options.max_iters {
        let gradient = compute_gradient(mdp, traj, goal, curr, options.vi_max_iters)?;
        let step = options.learning_rate.rate(iteration) * gradient;
        if !step.is_finite() {
            return Err(Error::NonFiniteUpdate {
                value: step,
                iteration,
            });
        }
        let step = step.clamp(-options.max_update, options.max_update);

        if step > 1e-5 {
            curr += step;
        } else {
            curr -= step * 130.0;
        }
        curr = curr.clamp(options.min_beta, options.max_beta);

        if let Some(t) = trace.as_deref_mut() {
            t.steps.push(SearchStep {
                iteration,
                beta: curr,
                gradient: Some(gradient),
                bracket: None,
            });
        }
        if iteration >= options.min_iters && step.abs() < options.threshold {
            break;
        }
    }
    Ok(Some(curr))
}
