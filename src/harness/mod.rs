//! Trial-based optimization harness
//!
//! A small ask/tell harness: a [`Tuner`] owns the [`Study`] and a pluggable
//! [`Sampler`], starts trials one at a time and records what was suggested and
//! observed. Samplers see the study read-only.
//!
//! # Example
//!
//! ```ignore
//! let mut tuner = Tuner::new(RandomSampler::new());
//! let mut trial = tuner.ask().await?;
//! let c = trial.suggest_float("C", 1e-3, 1e3, true).await?;
//! trial.complete(evaluate(c));
//! ```

mod distribution;
mod sampler;
mod study;
mod tuner;

pub use distribution::Distribution;
pub use sampler::{RandomSampler, Sampler};
pub use study::{FrozenTrial, SearchSpace, Study, TrialState, intersection_search_space};
pub use tuner::{Objective, Trial, Tuner};
