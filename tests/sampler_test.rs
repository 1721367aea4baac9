mod common;

use async_trait::async_trait;
use common::{SVM_SPACE, ScriptedModel};
use ghosttuner::harness::{
    Distribution, FrozenTrial, Objective, RandomSampler, Sampler, SearchSpace, Study, Trial,
    TrialState, Tuner,
};
use ghosttuner::{
    Configuration, Conversation, ConversationSettings, LlmSampler, ParamValue, TunerError,
};

fn svm_space() -> SearchSpace {
    SearchSpace::from([
        ("C".to_string(), Distribution::log_float(0.001, 1000.0)),
        ("gamma".to_string(), Distribution::log_float(0.0001, 1.0)),
    ])
}

fn sampler_with(model: &std::sync::Arc<ScriptedModel>) -> LlmSampler {
    let conversation = Conversation::new(
        model.clone(),
        ConversationSettings::new("SVM classifier", SVM_SPACE, 5),
    );
    LlmSampler::new(conversation).with_fallback(RandomSampler::seeded(11))
}

fn completed(number: usize, value: f64) -> FrozenTrial {
    let params = Configuration::from([
        ("C".to_string(), ParamValue::Float(1.0)),
        ("gamma".to_string(), ParamValue::Float(0.1)),
    ]);
    FrozenTrial::completed(number, value, params, svm_space())
}

/// Suggests every parameter of the space and returns a loss from the script
struct ScriptedLoss {
    space: SearchSpace,
    losses: Vec<f64>,
    seen: Vec<Configuration>,
}

impl ScriptedLoss {
    fn new(space: SearchSpace, losses: &[f64]) -> Self {
        ScriptedLoss {
            space,
            losses: losses.to_vec(),
            seen: Vec::new(),
        }
    }
}

#[async_trait]
impl Objective for ScriptedLoss {
    async fn evaluate(&mut self, trial: &mut Trial<'_>) -> anyhow::Result<f64> {
        for (name, distribution) in &self.space {
            trial.suggest(name, distribution.clone()).await?;
        }
        self.seen.push(trial.params().clone());
        Ok(self.losses[trial.number()])
    }
}

#[tokio::test]
async fn test_cold_start_returns_empty_without_model_call() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let mut sampler = sampler_with(&model);
    let study = Study::new();
    let trial = FrozenTrial::running(0);

    let space = sampler.infer_relative_search_space(&study, &trial);
    assert!(space.is_empty());
    let params = sampler
        .sample_relative(&study, &trial, &space)
        .await
        .unwrap();
    assert!(params.is_empty());
    assert_eq!(model.calls(), 0);
    assert_eq!(sampler.conversation().turn(), 0);
}

#[tokio::test]
async fn test_first_trial_makes_a_single_model_call() {
    let model = ScriptedModel::new([r#"{"C": 1.0, "gamma": 0.1}"#]);
    let mut sampler = sampler_with(&model);
    let study = Study::new();
    let trial = FrozenTrial::running(0);
    let space = svm_space();

    let c = sampler
        .sample_independent(&study, &trial, "C", &space["C"])
        .await
        .unwrap();
    let gamma = sampler
        .sample_independent(&study, &trial, "gamma", &space["gamma"])
        .await
        .unwrap();

    assert_eq!(c, ParamValue::Float(1.0));
    assert_eq!(gamma, ParamValue::Float(0.1));
    assert_eq!(model.calls(), 1);
    assert_eq!(sampler.conversation().turn(), 1);
    assert_eq!(sampler.initial_params().map(|p| p.len()), Some(2));
}

#[tokio::test]
async fn test_parameter_missing_from_initial_reply() {
    let model = ScriptedModel::new([r#"{"C": 1.0}"#]);
    let mut sampler = sampler_with(&model);
    let study = Study::new();
    let trial = FrozenTrial::running(0);
    let space = svm_space();

    sampler
        .sample_independent(&study, &trial, "C", &space["C"])
        .await
        .unwrap();
    let err = sampler
        .sample_independent(&study, &trial, "gamma", &space["gamma"])
        .await
        .unwrap_err();
    match err {
        TunerError::MissingParameter(name) => assert_eq!(name, "gamma"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_later_trials_fall_back_to_random_sampling() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let mut sampler = sampler_with(&model);
    let study = Study::new();
    let trial = FrozenTrial::running(3);
    let depth = Distribution::int(2, 8);
    let kernel = Distribution::categorical(["rbf", "linear", "poly"]);

    for _ in 0..20 {
        let value = sampler
            .sample_independent(&study, &trial, "depth", &depth)
            .await
            .unwrap();
        assert!(depth.contains(&value));
        let value = sampler
            .sample_independent(&study, &trial, "kernel", &kernel)
            .await
            .unwrap();
        assert!(kernel.contains(&value));
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_relative_sampling_reports_last_completed_loss() {
    let model = ScriptedModel::new([
        r#"{"C": 1.0, "gamma": 0.1}"#,
        r#"{"C": 3.0, "gamma": 0.2}"#,
    ]);
    let mut sampler = sampler_with(&model);
    let space = svm_space();

    // Trial 0 opened the conversation
    let mut study = Study::new();
    sampler
        .sample_independent(&study, &FrozenTrial::running(0), "C", &space["C"])
        .await
        .unwrap();

    study.add_trial(completed(0, 0.3));
    study.add_trial(completed(1, 0.125));
    let mut failed = FrozenTrial::running(2);
    failed.state = TrialState::Failed;
    study.add_trial(failed);
    let current = FrozenTrial::running(3);
    study.add_trial(current.clone());

    let relative = sampler.infer_relative_search_space(&study, &current);
    assert_eq!(relative, space);
    let params = sampler
        .sample_relative(&study, &current, &relative)
        .await
        .unwrap();
    assert_eq!(params["C"], ParamValue::Float(3.0));
    assert!(model.prompt(1).starts_with("loss = 1.2500e-01."));
}

#[tokio::test]
async fn test_optimize_feeds_each_loss_back_to_the_model() {
    let model = ScriptedModel::new([
        r#"{"C": 1.0, "gamma": 0.1}"#,
        r#"{"C": 10.0, "gamma": 0.01}"#,
        r#"{"C": 100.0, "gamma": 0.001}"#,
    ]);
    let mut tuner = Tuner::new(sampler_with(&model));
    let mut objective = ScriptedLoss::new(svm_space(), &[0.4, 0.2, 0.3]);

    tuner.optimize(3, &mut objective).await.unwrap();

    assert_eq!(model.calls(), 3);
    assert!(model.prompt(1).starts_with("loss = 4.0000e-01."));
    assert!(model.prompt(2).starts_with("loss = 2.0000e-01."));

    let trials = tuner.study().trials();
    assert!(trials.iter().all(|t| t.state == TrialState::Complete));
    assert_eq!(objective.seen[0]["C"], ParamValue::Float(1.0));
    assert_eq!(objective.seen[1]["C"], ParamValue::Float(10.0));
    assert_eq!(objective.seen[2]["gamma"], ParamValue::Float(0.001));

    let best = tuner.best_trial().unwrap();
    assert_eq!(best.number, 1);
    assert_eq!(best.params["gamma"], ParamValue::Float(0.01));
}

#[tokio::test]
async fn test_malformed_reply_aborts_optimize() {
    let model = ScriptedModel::new([r#"{"C": 1.0, "gamma": 0.1}"#, "no idea"]);
    let mut tuner = Tuner::new(sampler_with(&model));
    let mut objective = ScriptedLoss::new(svm_space(), &[0.4, 0.2]);

    let result = tuner.optimize(2, &mut objective).await;

    assert!(matches!(result, Err(TunerError::MalformedResponse { .. })));
    let trials = tuner.study().trials();
    assert_eq!(trials.len(), 2);
    assert_eq!(trials[0].state, TrialState::Complete);
    assert_eq!(trials[1].state, TrialState::Failed);
}
