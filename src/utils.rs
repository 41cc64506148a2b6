//! Shared numeric helpers for the rationality crate

use rand::Rng;

/// Numerically stable log-sum-exp.
///
/// Subtracts the running maximum before exponentiating so that inputs spanning
/// hundreds of log-units neither overflow nor underflow. An empty slice, or a
/// slice whose entries are all negative infinity, yields negative infinity:
/// the log of an empty sum.
pub fn logsumexp(values: &[f64]) -> f64 {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum = values.iter().map(|v| (v - max).exp()).sum::<f64>();
    max + sum.ln()
}

/// Sample one item from a weighted distribution.
///
/// Draws a threshold uniformly in `[0, total)` and walks the weights until it
/// crosses zero. Returns `None` when `items` is empty or the total weight is
/// not positive; callers are expected to hand in a proper distribution.
///
/// The last item is returned as a fallback if accumulated rounding keeps the
/// threshold from crossing zero.
pub fn weighted_sample<R, T>(rng: &mut R, items: &[(T, f64)]) -> Option<T>
where
    R: Rng,
    T: Clone,
{
    let total: f64 = items.iter().map(|(_, w)| *w).sum();
    if items.is_empty() || !total.is_finite() || total <= 0.0 {
        return None;
    }

    let mut threshold = rng.random::<f64>() * total;
    for (item, weight) in items {
        if threshold < *weight {
            return Some(item.clone());
        }
        threshold -= weight;
    }
    items.last().map(|(item, _)| item.clone())
}
