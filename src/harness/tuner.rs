//! Sequential ask/tell driver

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::distribution::Distribution;
use super::sampler::Sampler;
use super::study::{FrozenTrial, SearchSpace, Study, TrialState};
use crate::error::{Result, TunerError};
use crate::params::{Configuration, ParamValue};

/// Evaluates one trial and reports its loss (lower is better).
///
/// Errors that are not [`TunerError`]s, and `TunerError::Objective`, fail the
/// trial and the run continues. Any other `TunerError` aborts the run.
#[async_trait]
pub trait Objective: Send {
    async fn evaluate(&mut self, trial: &mut Trial<'_>) -> anyhow::Result<f64>;
}

/// Owns the study and the sampler and runs trials one at a time
pub struct Tuner {
    study: Study,
    sampler: Box<dyn Sampler>,
}

impl Tuner {
    pub fn new(sampler: impl Sampler + 'static) -> Self {
        Tuner {
            study: Study::new(),
            sampler: Box::new(sampler),
        }
    }

    pub fn study(&self) -> &Study {
        &self.study
    }

    pub fn best_trial(&self) -> Option<&FrozenTrial> {
        self.study.best_trial()
    }

    /// Start a new trial. The sampler proposes its relative configuration here,
    /// once per trial.
    pub async fn ask(&mut self) -> Result<Trial<'_>> {
        let number = self.study.add_trial(FrozenTrial::running(0));
        let snapshot = self.study.trials()[number].clone();

        let relative_space = self
            .sampler
            .infer_relative_search_space(&self.study, &snapshot);
        let relative_params = match self
            .sampler
            .sample_relative(&self.study, &snapshot, &relative_space)
            .await
        {
            Ok(params) => params,
            Err(e) => {
                self.finish(number, TrialState::Failed, None);
                return Err(e);
            }
        };

        Ok(Trial {
            tuner: self,
            number,
            relative_space,
            relative_params,
        })
    }

    /// Run `n_trials` trials strictly in sequence.
    #[instrument(level = "info", skip(self, objective))]
    pub async fn optimize<O>(&mut self, n_trials: usize, objective: &mut O) -> Result<()>
    where
        O: Objective + ?Sized,
    {
        for _ in 0..n_trials {
            let mut trial = self.ask().await?;
            let number = trial.number();

            match objective.evaluate(&mut trial).await {
                Ok(value) if value.is_nan() => {
                    warn!(trial = number, "objective returned NaN, marking trial failed");
                    trial.fail();
                }
                Ok(value) => {
                    let params = trial.params().clone();
                    trial.complete(value);
                    info!(trial = number, value, ?params, "trial finished");
                }
                Err(e) => {
                    trial.fail();
                    match e.downcast::<TunerError>() {
                        Ok(TunerError::Objective(reason)) => {
                            warn!(trial = number, error = %reason, "trial failed");
                        }
                        Ok(err) => return Err(err),
                        Err(other) => warn!(trial = number, error = %other, "trial failed"),
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self, number: usize, state: TrialState, value: Option<f64>) {
        if let Some(trial) = self.study.trial_mut(number) {
            trial.state = state;
            trial.value = value;
        }
    }
}

/// Handle to the running trial
pub struct Trial<'a> {
    tuner: &'a mut Tuner,
    number: usize,
    relative_space: SearchSpace,
    relative_params: Configuration,
}

impl Trial<'_> {
    pub fn number(&self) -> usize {
        self.number
    }

    /// Values suggested so far in this trial
    pub fn params(&self) -> &Configuration {
        &self.tuner.study.trials()[self.number].params
    }

    pub fn relative_params(&self) -> &Configuration {
        &self.relative_params
    }

    /// Value for `name`, taken from the relative configuration when the
    /// parameter belongs to the relative space, otherwise sampled independently.
    pub async fn suggest(&mut self, name: &str, distribution: Distribution) -> Result<ParamValue> {
        distribution
            .validate()
            .map_err(|reason| TunerError::InvalidValue {
                name: name.to_string(),
                reason,
            })?;

        let recorded = &self.tuner.study.trials()[self.number];
        if let Some(existing) = recorded.params.get(name) {
            return match recorded.distributions.get(name) {
                Some(known) if *known != distribution => Err(TunerError::InvalidValue {
                    name: name.to_string(),
                    reason: format!(
                        "already suggested as {}, now requested as {}",
                        known.describe(),
                        distribution.describe()
                    ),
                }),
                _ => Ok(existing.clone()),
            };
        }

        let proposed = match (
            self.relative_space.get(name),
            self.relative_params.get(name),
        ) {
            (Some(known), Some(value)) if *known == distribution => value.clone(),
            _ => {
                let tuner = &mut *self.tuner;
                let snapshot = tuner.study.trials()[self.number].clone();
                tuner
                    .sampler
                    .sample_independent(&tuner.study, &snapshot, name, &distribution)
                    .await?
            }
        };

        let value = distribution.coerce(name, &proposed)?;
        if let Some(trial) = self.tuner.study.trial_mut(self.number) {
            trial.params.insert(name.to_string(), value.clone());
            trial.distributions.insert(name.to_string(), distribution);
        }
        Ok(value)
    }

    pub async fn suggest_float(&mut self, name: &str, low: f64, high: f64, log: bool) -> Result<f64> {
        let value = self.suggest(name, Distribution::Float { low, high, log }).await?;
        value.as_f64().ok_or_else(|| TunerError::InvalidValue {
            name: name.to_string(),
            reason: format!("expected a number, got {}", value),
        })
    }

    pub async fn suggest_int(&mut self, name: &str, low: i64, high: i64, log: bool) -> Result<i64> {
        let value = self.suggest(name, Distribution::Int { low, high, log }).await?;
        value.as_i64().ok_or_else(|| TunerError::InvalidValue {
            name: name.to_string(),
            reason: format!("expected an integer, got {}", value),
        })
    }

    pub async fn suggest_categorical(
        &mut self,
        name: &str,
        choices: Vec<ParamValue>,
    ) -> Result<ParamValue> {
        self.suggest(name, Distribution::Categorical { choices }).await
    }

    /// Record the observed loss and close the trial
    pub fn complete(self, value: f64) {
        self.tuner.finish(self.number, TrialState::Complete, Some(value));
    }

    pub fn fail(self) {
        self.tuner.finish(self.number, TrialState::Failed, None);
    }

    pub fn prune(self) {
        self.tuner.finish(self.number, TrialState::Pruned, None);
    }
}
