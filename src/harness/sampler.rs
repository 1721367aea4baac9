//! Pluggable sampling strategies

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::distribution::Distribution;
use super::study::{FrozenTrial, SearchSpace, Study};
use crate::error::{Result, TunerError};
use crate::params::{Configuration, ParamValue};

/// Strategy consulted by the [`Tuner`](super::Tuner) at every trial.
///
/// At trial start the tuner asks for the jointly known search space and then
/// for one relative configuration covering it. Parameters suggested later that
/// fall outside that space are requested one at a time through
/// `sample_independent`.
#[async_trait]
pub trait Sampler: Send {
    fn infer_relative_search_space(&mut self, study: &Study, trial: &FrozenTrial) -> SearchSpace;

    async fn sample_relative(
        &mut self,
        study: &Study,
        trial: &FrozenTrial,
        search_space: &SearchSpace,
    ) -> Result<Configuration>;

    async fn sample_independent(
        &mut self,
        study: &Study,
        trial: &FrozenTrial,
        param_name: &str,
        distribution: &Distribution,
    ) -> Result<ParamValue>;
}

/// Uniform random sampling, every parameter drawn independently
pub struct RandomSampler {
    rng: StdRng,
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSampler {
    pub fn new() -> Self {
        RandomSampler {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sampler
    pub fn seeded(seed: u64) -> Self {
        RandomSampler {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self, param_name: &str, distribution: &Distribution) -> Result<ParamValue> {
        distribution
            .validate()
            .map_err(|reason| TunerError::InvalidValue {
                name: param_name.to_string(),
                reason,
            })?;
        Ok(distribution.sample(&mut self.rng))
    }
}

#[async_trait]
impl Sampler for RandomSampler {
    fn infer_relative_search_space(&mut self, _study: &Study, _trial: &FrozenTrial) -> SearchSpace {
        SearchSpace::new()
    }

    async fn sample_relative(
        &mut self,
        _study: &Study,
        _trial: &FrozenTrial,
        _search_space: &SearchSpace,
    ) -> Result<Configuration> {
        Ok(Configuration::new())
    }

    async fn sample_independent(
        &mut self,
        _study: &Study,
        _trial: &FrozenTrial,
        param_name: &str,
        distribution: &Distribution,
    ) -> Result<ParamValue> {
        self.sample(param_name, distribution)
    }
}
