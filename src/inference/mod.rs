//! Inference over softmax-rational agents.
//!
//! Three questions about an observed trajectory, answered in terms of the
//! soft values of [`crate::value_iter`]:
//!
//! - [`destination`]: which candidate goal is the agent heading for?
//! - [`occupancy`]: how often will each state be visited on the way?
//! - [`beta`]: how rational is the agent, i.e. what inverse temperature
//!   best explains the observed steps?

pub mod beta;
pub mod destination;
pub mod occupancy;

pub use beta::{
    BinarySearchOptions, GradientAscentOptions, GradientTerms, LearningRate, SearchStep,
    SearchTrace, SimpleSearchOptions, beta_binary_search, beta_binary_search_traced,
    beta_gradient_ascent, beta_gradient_ascent_traced, beta_simple_search,
    beta_simple_search_traced, compute_gradient, compute_gradient_terms, compute_score,
};
pub use destination::infer_destination;
pub use occupancy::{infer_occupancies, infer_occupancies_from_start, occupancies_toward};
