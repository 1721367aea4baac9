//! Sampler that delegates every configuration to the tuning conversation.
//!
//! The harness asks twice per trial in the worst case: once jointly for the
//! known search space and then per parameter for anything outside it. Trial 0
//! has no known space, so all of its parameters arrive one by one; the first
//! of those requests fetches the whole initial configuration and the rest are
//! served from the cache. From trial 1 on the relative request carries the
//! previous loss and is the only point where the model is consulted.

use async_trait::async_trait;
use tracing::debug;

use crate::conversation::Conversation;
use crate::error::{Result, TunerError};
use crate::harness::{
    Distribution, FrozenTrial, RandomSampler, Sampler, SearchSpace, Study,
    intersection_search_space,
};
use crate::params::{Configuration, ParamValue};

pub struct LlmSampler {
    conversation: Conversation,
    fallback: RandomSampler,
    initial_params: Option<Configuration>,
}

impl LlmSampler {
    pub fn new(conversation: Conversation) -> Self {
        LlmSampler {
            conversation,
            fallback: RandomSampler::new(),
            initial_params: None,
        }
    }

    /// Replace the sampler used for out-of-space parameters after trial 0
    pub fn with_fallback(mut self, fallback: RandomSampler) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn initial_params(&self) -> Option<&Configuration> {
        self.initial_params.as_ref()
    }
}

#[async_trait]
impl Sampler for LlmSampler {
    fn infer_relative_search_space(&mut self, study: &Study, _trial: &FrozenTrial) -> SearchSpace {
        intersection_search_space(study.trials())
    }

    async fn sample_relative(
        &mut self,
        study: &Study,
        trial: &FrozenTrial,
        search_space: &SearchSpace,
    ) -> Result<Configuration> {
        if search_space.is_empty() {
            return Ok(Configuration::new());
        }

        let loss = if self.conversation.turn() == 0 {
            None
        } else {
            study.last_completed_value()
        };
        debug!(trial = trial.number, ?loss, "requesting relative configuration");
        self.conversation.sample(loss).await
    }

    async fn sample_independent(
        &mut self,
        study: &Study,
        trial: &FrozenTrial,
        param_name: &str,
        distribution: &Distribution,
    ) -> Result<ParamValue> {
        if trial.number != 0 {
            debug!(
                trial = trial.number,
                param = param_name,
                "parameter outside the relative space, sampling at random"
            );
            return self
                .fallback
                .sample_independent(study, trial, param_name, distribution)
                .await;
        }

        if self.initial_params.is_none() {
            let params = self.conversation.sample(None).await?;
            self.initial_params = Some(params);
        }

        self.initial_params
            .as_ref()
            .and_then(|params| params.get(param_name))
            .cloned()
            .ok_or_else(|| TunerError::MissingParameter(param_name.to_string()))
    }
}
