//! Objective that evaluates configurations with an external command.
//!
//! The command receives the configuration as a single-line JSON object, both
//! as its last argument and in `GHOSTTUNER_PARAMS`, and must print the loss
//! on the last non-empty line of stdout.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, TunerError};
use crate::harness::{Objective, SearchSpace, Trial};
use crate::params::render_line;

pub const PARAMS_ENV: &str = "GHOSTTUNER_PARAMS";
pub const TRIAL_ENV: &str = "GHOSTTUNER_TRIAL";

pub struct CommandObjective {
    program: String,
    args: Vec<String>,
    space: SearchSpace,
}

impl CommandObjective {
    pub fn new(command: &[String], space: SearchSpace) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| TunerError::Config("no evaluation command configured".to_string()))?;
        Ok(CommandObjective {
            program: program.clone(),
            args: args.to_vec(),
            space,
        })
    }
}

/// Loss printed on the last non-empty line
pub fn parse_loss(stdout: &str) -> Result<f64> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .ok_or_else(|| TunerError::Objective("command printed nothing".to_string()))?;
    line.parse::<f64>()
        .map_err(|_| TunerError::Objective(format!("cannot read a loss from {:?}", line)))
}

#[async_trait]
impl Objective for CommandObjective {
    async fn evaluate(&mut self, trial: &mut Trial<'_>) -> anyhow::Result<f64> {
        for (name, distribution) in &self.space {
            trial.suggest(name, distribution.clone()).await?;
        }
        let params = render_line(trial.params());
        debug!(trial = trial.number(), %params, program = %self.program, "evaluating");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&params)
            .env(PARAMS_ENV, &params)
            .env(TRIAL_ENV, trial.number().to_string())
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|e| {
                TunerError::Objective(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            return Err(TunerError::Objective(format!(
                "{} exited with {}",
                self.program, output.status
            ))
            .into());
        }

        Ok(parse_loss(&String::from_utf8_lossy(&output.stdout))?)
    }
}
