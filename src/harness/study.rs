//! Trial records and the study that orders them

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::distribution::Distribution;
use crate::params::Configuration;

/// Parameter name -> distribution
pub type SearchSpace = BTreeMap<String, Distribution>;

/// Trial status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialState {
    Running,
    Complete,
    Failed,
    Pruned,
}

impl TrialState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, TrialState::Running)
    }
}

/// Snapshot of a single trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrozenTrial {
    /// Position in the study, starting at 0
    pub number: usize,
    pub state: TrialState,
    /// Observed loss, present once the trial completed
    pub value: Option<f64>,
    pub params: Configuration,
    pub distributions: SearchSpace,
}

impl FrozenTrial {
    pub fn running(number: usize) -> Self {
        FrozenTrial {
            number,
            state: TrialState::Running,
            value: None,
            params: Configuration::new(),
            distributions: SearchSpace::new(),
        }
    }

    /// A finished trial with a recorded loss
    pub fn completed(
        number: usize,
        value: f64,
        params: Configuration,
        distributions: SearchSpace,
    ) -> Self {
        FrozenTrial {
            number,
            state: TrialState::Complete,
            value: Some(value),
            params,
            distributions,
        }
    }
}

/// Ordered trial history of one optimization run. Lower values are better.
#[derive(Debug, Clone, Default)]
pub struct Study {
    trials: Vec<FrozenTrial>,
}

impl Study {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trials(&self) -> &[FrozenTrial] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Append an externally built trial; its number is reassigned to its position.
    pub fn add_trial(&mut self, mut trial: FrozenTrial) -> usize {
        trial.number = self.trials.len();
        self.trials.push(trial);
        self.trials.len() - 1
    }

    pub fn completed(&self) -> impl Iterator<Item = &FrozenTrial> {
        self.trials
            .iter()
            .filter(|t| t.state == TrialState::Complete)
    }

    /// Completed trial with the lowest value
    pub fn best_trial(&self) -> Option<&FrozenTrial> {
        self.completed()
            .filter(|t| t.value.is_some_and(|v| !v.is_nan()))
            .min_by(|a, b| {
                let (a, b) = (a.value.unwrap_or(f64::INFINITY), b.value.unwrap_or(f64::INFINITY));
                a.total_cmp(&b)
            })
    }

    /// Value of the most recent completed trial, searching backwards past
    /// running, failed and pruned entries.
    pub fn last_completed_value(&self) -> Option<f64> {
        self.trials
            .iter()
            .rev()
            .filter(|t| t.state == TrialState::Complete)
            .find_map(|t| t.value)
    }

    pub(crate) fn trial_mut(&mut self, number: usize) -> Option<&mut FrozenTrial> {
        self.trials.get_mut(number)
    }
}

/// Distributions shared by every completed trial.
///
/// A parameter survives only when all completed trials suggested it with the
/// same distribution. Without completed trials the result is empty.
pub fn intersection_search_space(trials: &[FrozenTrial]) -> SearchSpace {
    let mut completed = trials.iter().filter(|t| t.state == TrialState::Complete);

    let Some(first) = completed.next() else {
        return SearchSpace::new();
    };

    let mut space = first.distributions.clone();
    for trial in completed {
        space.retain(|name, distribution| trial.distributions.get(name) == Some(distribution));
    }
    space
}
