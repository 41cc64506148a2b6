//! Soft value iteration, its convergence metric, and the deterministic
//! shortest-path reference.
//!
//! The soft value of a state is the log-sum-exp over all goal-reaching paths
//! of their cumulative reward scaled by `1/beta`. As `beta -> 0` this tends
//! to the (scaled) deterministic shortest-path value computed by
//! [`shortest_path`]; larger `beta` flattens the path distribution toward
//! uniform. `f64::NEG_INFINITY` is the "unreachable" sentinel throughout: a
//! genuine IEEE infinity, so that it vanishes inside log-sum-exp and compares
//! below every finite value.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{Error, Result, mdp::Mdp, utils::logsumexp};

/// Convergence threshold for value-iteration runs without an explicit cap.
pub const CONVERGENCE_THRESHOLD: f64 = 1e-9;

/// Iteration cap applied when the caller does not supply one. Exceeding it
/// is not an error; the current vector is returned as-is.
pub const DEFAULT_MAX_ITERS: usize = 1000;

/// Largest per-state update between two successive value vectors.
///
/// A state still unreachable on both sides contributes `0`; a state that
/// switched between reachable and unreachable contributes `+inf`, forcing
/// iteration to continue; otherwise the absolute difference. This is the
/// stopping criterion for value iteration, not a general vector distance.
///
/// # Panics
///
/// Panics if the vectors differ in length.
pub fn max_update(old: &[f64], new: &[f64]) -> f64 {
    assert_eq!(old.len(), new.len(), "value vectors must have equal length");
    let mut worst = 0.0f64;
    for (&o, &n) in old.iter().zip(new) {
        let update = match (o == f64::NEG_INFINITY, n == f64::NEG_INFINITY) {
            (true, true) => 0.0,
            (false, false) => (n - o).abs(),
            _ => return f64::INFINITY,
        };
        worst = worst.max(update);
    }
    worst
}

fn check_state<M: Mdp>(mdp: &M, state: usize) -> Result<()> {
    if state >= mdp.num_states() {
        return Err(Error::StateOutOfBounds {
            state,
            num_states: mdp.num_states(),
        });
    }
    Ok(())
}

fn check_beta(beta: f64) -> Result<()> {
    if !beta.is_finite() || beta <= 0.0 {
        return Err(Error::InvalidBeta { value: beta });
    }
    Ok(())
}

/// Soft value of reaching `goal` from every state.
///
/// Initialization is the zero-step value: `0` at the goal, `-inf` elsewhere;
/// `max_iters == Some(0)` returns it untouched. The goal entry stays pinned
/// at `0` (the goal is absorbing). Each iteration applies the synchronous
/// backup
///
/// ```text
/// V'[s] = logsumexp over actions a of ( reward(s) / beta + V[transition(s, a)] )
/// ```
///
/// and the run stops once [`max_update`] drops below [`CONVERGENCE_THRESHOLD`]
/// or the iteration cap is reached. No convergence is guaranteed for
/// arbitrary graphs; callers bound iterations by the graph diameter or accept
/// the capped vector.
pub fn backward_value_iter<M: Mdp>(
    mdp: &M,
    goal: usize,
    beta: f64,
    max_iters: Option<usize>,
) -> Result<Vec<f64>> {
    check_state(mdp, goal)?;
    check_beta(beta)?;

    let s_count = mdp.num_states();
    let rewards = mdp.state_rewards();
    let successors: Vec<Vec<usize>> = (0..s_count).map(|s| mdp.successors(s)).collect();

    let mut values = vec![f64::NEG_INFINITY; s_count];
    values[goal] = 0.0;

    let mut candidates = Vec::new();
    for _ in 0..max_iters.unwrap_or(DEFAULT_MAX_ITERS) {
        let mut next = vec![f64::NEG_INFINITY; s_count];
        next[goal] = 0.0;
        for s in 0..s_count {
            if s == goal {
                continue;
            }
            candidates.clear();
            for &succ in &successors[s] {
                candidates.push(rewards[s] / beta + values[succ]);
            }
            next[s] = logsumexp(&candidates);
        }
        let update = max_update(&values, &next);
        values = next;
        if update < CONVERGENCE_THRESHOLD {
            break;
        }
    }
    Ok(values)
}

/// Soft value of reaching every state from `start`.
///
/// The recursion of [`backward_value_iter`] run over the transposed
/// transition structure, so one run covers all candidate goals:
/// `forward_value_iter(mdp, s0, ..)[g]` agrees with
/// `backward_value_iter(mdp, g, ..)[s0]` once both have iterated enough
/// (exactly, up to the weight of walks that revisit `g`).
///
/// Unlike the backward goal, the start is not absorbing: walks may leave and
/// return, so its own entry is `log(1 + loop weight)`, at least `0`.
pub fn forward_value_iter<M: Mdp>(
    mdp: &M,
    start: usize,
    beta: f64,
    max_iters: Option<usize>,
) -> Result<Vec<f64>> {
    forward_value_iter_absorbing(mdp, start, None, beta, max_iters)
}

/// Forward pass with an optional absorbing sink.
///
/// When `sink` is set, that state receives value normally but never passes
/// it on: paths are cut at their first arrival there. Occupancy inference
/// uses this to count only walks that have not yet reached the destination.
pub(crate) fn forward_value_iter_absorbing<M: Mdp>(
    mdp: &M,
    start: usize,
    sink: Option<usize>,
    beta: f64,
    max_iters: Option<usize>,
) -> Result<Vec<f64>> {
    check_state(mdp, start)?;
    check_beta(beta)?;

    let s_count = mdp.num_states();
    let rewards = mdp.state_rewards();
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); s_count];
    for p in 0..s_count {
        if Some(p) == sink {
            continue;
        }
        for succ in mdp.successors(p) {
            predecessors[succ].push(p);
        }
    }

    let mut values = vec![f64::NEG_INFINITY; s_count];
    values[start] = 0.0;

    let mut candidates = Vec::new();
    for _ in 0..max_iters.unwrap_or(DEFAULT_MAX_ITERS) {
        let mut next = vec![f64::NEG_INFINITY; s_count];
        for s in 0..s_count {
            candidates.clear();
            // The zero-length walk is always available at the start.
            if s == start {
                candidates.push(0.0);
            }
            for &p in &predecessors[s] {
                candidates.push(rewards[p] / beta + values[p]);
            }
            next[s] = logsumexp(&candidates);
        }
        let update = max_update(&values, &next);
        values = next;
        if update < CONVERGENCE_THRESHOLD {
            break;
        }
    }
    Ok(values)
}

#[derive(PartialEq)]
struct QueueEntry {
    cost: f64,
    state: usize,
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the cheapest entry first.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.state.cmp(&self.state))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Exact best cumulative reward to reach `dest` from every state.
///
/// Dijkstra over step costs `-reward(s)`, the `beta -> 0` limit of
/// [`backward_value_iter`] (up to the `1/beta` scaling). `0` at the
/// destination, `-inf` where no path exists.
///
/// # Errors
///
/// Returns [`Error::PositiveReward`] if any state carries a positive reward;
/// the non-negative-cost requirement of Dijkstra would be violated.
pub fn shortest_path<M: Mdp>(mdp: &M, dest: usize) -> Result<Vec<f64>> {
    check_state(mdp, dest)?;

    let s_count = mdp.num_states();
    let rewards = mdp.state_rewards();
    if let Some(state) = (0..s_count).find(|&s| rewards[s] > 0.0) {
        return Err(Error::PositiveReward {
            state,
            value: rewards[state],
        });
    }

    // Reversed edges: reaching `succ` from `p` costs -reward(p).
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); s_count];
    for p in 0..s_count {
        for succ in mdp.successors(p) {
            incoming[succ].push(p);
        }
    }

    let mut dist = vec![f64::INFINITY; s_count];
    dist[dest] = 0.0;
    let mut queue = BinaryHeap::new();
    queue.push(QueueEntry {
        cost: 0.0,
        state: dest,
    });

    while let Some(QueueEntry { cost, state }) = queue.pop() {
        if cost > dist[state] {
            continue;
        }
        for &p in &incoming[state] {
            let next_cost = cost - rewards[p];
            if next_cost < dist[p] {
                dist[p] = next_cost;
                queue.push(QueueEntry {
                    cost: next_cost,
                    state: p,
                });
            }
        }
    }

    Ok(dist
        .into_iter()
        .map(|d| if d.is_finite() { -d } else { f64::NEG_INFINITY })
        .collect())
}
