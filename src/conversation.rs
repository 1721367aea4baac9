//! The tuning conversation: one user/assistant exchange per requested configuration.
//!
//! The history starts with a single system message and grows by exactly one
//! prompt and one reply for every successful [`Conversation::sample`] call, so
//! after `n` turns it holds `1 + 2n` messages. A failed call leaves both the
//! history and the turn counter untouched, and the same turn can be retried.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::api::{ChatMessage, ChatRequest, OutputFormat};
use crate::error::{Result, TunerError};
use crate::params::{Configuration, ParamValue, parse_configuration};
use crate::prompting::{self, CONFIG_MARKER};
use crate::ChatModel;

/// How replies are shaped, fixed when the conversation is created
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseFormat {
    /// The whole reply is a JSON object
    Structured,
    /// A free-text `Analysis:` line followed by a `Config:` line holding the JSON object
    AnalysisAndConfig,
}

impl ResponseFormat {
    pub fn from_chain_of_thought(enabled: bool) -> Self {
        if enabled {
            ResponseFormat::AnalysisAndConfig
        } else {
            ResponseFormat::Structured
        }
    }

    pub fn is_chain_of_thought(&self) -> bool {
        matches!(self, ResponseFormat::AnalysisAndConfig)
    }

    /// Provider-side constraint. The analysis line is free text, so only the
    /// structured variant can ask for a JSON object.
    pub fn output_format(&self) -> OutputFormat {
        match self {
            ResponseFormat::Structured => OutputFormat::JsonObject,
            ResponseFormat::AnalysisAndConfig => OutputFormat::Text,
        }
    }

    pub fn parse(&self, reply: &str) -> Result<Configuration> {
        match self {
            ResponseFormat::Structured => parse_configuration(reply.trim()),
            ResponseFormat::AnalysisAndConfig => parse_analysis_and_config(reply),
        }
    }
}

fn parse_analysis_and_config(reply: &str) -> Result<Configuration> {
    let Some(marker) = reply.rfind(CONFIG_MARKER) else {
        return Err(TunerError::malformed(
            format!("missing {:?} marker", CONFIG_MARKER),
            reply,
        ));
    };
    let tail = &reply[marker + CONFIG_MARKER.len()..];

    match (tail.find('{'), tail.rfind('}')) {
        (Some(start), Some(end)) if start < end => parse_configuration(&tail[start..=end])
            .map_err(|e| match e {
                TunerError::MalformedResponse { reason, .. } => TunerError::malformed(reason, reply),
                other => other,
            }),
        _ => Err(TunerError::malformed(
            format!("no JSON object after {:?}", CONFIG_MARKER),
            reply,
        )),
    }
}

/// Example configuration shown in the opening prompt when none is supplied
pub fn default_example() -> Configuration {
    Configuration::from([
        ("C".to_string(), ParamValue::Float(1.0)),
        ("gamma".to_string(), ParamValue::Float(0.1)),
    ])
}

/// Session parameters, supplied by whoever constructs the conversation
#[derive(Clone, Debug)]
pub struct ConversationSettings {
    pub model_type: String,
    pub search_space: String,
    pub budget: usize,
    pub chain_of_thought: bool,
    pub example: Configuration,
}

impl ConversationSettings {
    pub fn new(model_type: impl Into<String>, search_space: impl Into<String>, budget: usize) -> Self {
        ConversationSettings {
            model_type: model_type.into(),
            search_space: search_space.into(),
            budget,
            chain_of_thought: false,
            example: default_example(),
        }
    }

    pub fn with_chain_of_thought(mut self, enabled: bool) -> Self {
        self.chain_of_thought = enabled;
        self
    }

    pub fn with_example(mut self, example: Configuration) -> Self {
        self.example = example;
        self
    }
}

pub struct Conversation {
    model: Arc<dyn ChatModel + Send + Sync>,
    model_type: String,
    search_space: String,
    budget: usize,
    example: Configuration,
    format: ResponseFormat,
    turn: usize,
    history: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(model: Arc<dyn ChatModel + Send + Sync>, settings: ConversationSettings) -> Self {
        Conversation {
            model,
            model_type: settings.model_type,
            search_space: settings.search_space,
            budget: settings.budget,
            example: settings.example,
            format: ResponseFormat::from_chain_of_thought(settings.chain_of_thought),
            turn: 0,
            history: vec![ChatMessage::system(prompting::SYSTEM_PROMPT)],
        }
    }

    /// Number of configurations already requested
    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn remaining(&self) -> usize {
        self.budget.saturating_sub(self.turn)
    }

    pub fn is_exhausted(&self) -> bool {
        self.turn >= self.budget
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn search_space(&self) -> &str {
        &self.search_space
    }

    /// Build the prompt for the next turn without sending it.
    ///
    /// The first turn takes no loss; every later turn requires one.
    pub fn next_message(&self, loss: Option<f64>) -> Result<String> {
        match (self.turn, loss) {
            (0, None) => Ok(prompting::initial_message(
                &self.model_type,
                &self.search_space,
                self.budget,
                &self.example,
            )),
            (0, Some(loss)) => Err(TunerError::InvalidState(format!(
                "no trial has completed before the first turn, got loss {}",
                loss
            ))),
            (_, Some(loss)) => Ok(prompting::transition_message(
                loss,
                self.format.is_chain_of_thought(),
            )),
            (turn, None) => Err(TunerError::InvalidState(format!(
                "a loss must be provided after the first trial (turn {})",
                turn
            ))),
        }
    }

    /// Ask the model for the next configuration.
    #[instrument(level = "info", skip(self), fields(turn = self.turn, model = self.model.name()))]
    pub async fn sample(&mut self, loss: Option<f64>) -> Result<Configuration> {
        let prompt = self.next_message(loss)?;
        if self.is_exhausted() {
            warn!(
                budget = self.budget,
                "requesting a configuration beyond the declared budget"
            );
        }
        debug!(prompt = %prompt, "sending prompt");

        let checkpoint = self.history.len();
        self.history.push(ChatMessage::user(prompt));

        let request = ChatRequest::new(&self.history)
            .with_temperature(0.0)
            .with_output_format(self.format.output_format());

        let reply = match self.model.chat(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                self.history.truncate(checkpoint);
                return Err(TunerError::Provider(e));
            }
        };
        debug!(reply = %reply.content, "received reply");
        self.history.push(ChatMessage::assistant(reply.content));

        let content = &self.history[self.history.len() - 1].content;
        match self.format.parse(content) {
            Ok(config) => {
                self.turn += 1;
                info!(turn = self.turn, ?config, "configuration proposed");
                Ok(config)
            }
            Err(e) => {
                warn!(error = %e, "discarding unparsable reply");
                self.history.truncate(checkpoint);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_parse() {
        let config = ResponseFormat::Structured
            .parse("  {\"C\": 1.0, \"gamma\": 0.1}\n")
            .unwrap();
        assert_eq!(config, default_example());
    }

    #[test]
    fn test_structured_rejects_prose() {
        let err = ResponseFormat::Structured
            .parse("Config: {\"C\": 1.0}")
            .unwrap_err();
        assert!(matches!(err, TunerError::MalformedResponse { .. }));
    }

    #[test]
    fn test_analysis_and_config_parse() {
        let reply = "Analysis: Larger C reduced the error, keep gamma small.\nConfig: {\"C\": 10.0, \"gamma\": 0.01}";
        let config = ResponseFormat::AnalysisAndConfig.parse(reply).unwrap();
        assert_eq!(config["C"], ParamValue::Float(10.0));
        assert_eq!(config["gamma"], ParamValue::Float(0.01));
    }

    #[test]
    fn test_analysis_and_config_uses_last_marker() {
        let reply = "Analysis: the previous Config: {\"C\": 1.0} was too weak.\nConfig: {\"C\": 5}";
        let config = ResponseFormat::AnalysisAndConfig.parse(reply).unwrap();
        assert_eq!(config["C"], ParamValue::Int(5));
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_analysis_and_config_errors() {
        let missing_marker = ResponseFormat::AnalysisAndConfig.parse("{\"C\": 1.0}");
        assert!(matches!(
            missing_marker,
            Err(TunerError::MalformedResponse { .. })
        ));

        let missing_object = ResponseFormat::AnalysisAndConfig.parse("Analysis: hm\nConfig: none");
        assert!(matches!(
            missing_object,
            Err(TunerError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_output_format_per_variant() {
        assert_eq!(
            ResponseFormat::Structured.output_format(),
            OutputFormat::JsonObject
        );
        assert_eq!(
            ResponseFormat::AnalysisAndConfig.output_format(),
            OutputFormat::Text
        );
    }
}
