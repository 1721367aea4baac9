//! Environment, provider and study configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::conversation::ConversationSettings;
use crate::error::{Result, TunerError};
use crate::harness::{Distribution, SearchSpace};
use crate::params::Configuration;
use crate::providers::{GeneralModelProvider, OllamaProvider, OpenAIProvider, ProviderKind};

/// Load environment variables from ./.env, then ~/.env.
/// Variables already set are never overwritten, so the process environment
/// wins over the project file, which wins over the home file.
/// Call this before parsing CLI args to ensure env vars are available.
pub fn load_env_file() {
    dotenv::dotenv().ok();

    if let Some(home) = dirs::home_dir() {
        dotenv::from_path(home.join(".env")).ok();
    }
}

/// Which model to talk to and how to reach it
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl ProviderSettings {
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn create_provider(&self) -> Result<GeneralModelProvider> {
        match self.provider {
            ProviderKind::Ollama => Ok(GeneralModelProvider::Ollama(match &self.base_url {
                Some(url) => OllamaProvider::new(url),
                None => OllamaProvider::default(),
            })),
            ProviderKind::OpenAI => {
                let api_key = self.api_key.as_deref().ok_or_else(|| {
                    TunerError::Config("OPENAI_API_KEY must be set for the openai provider".to_string())
                })?;
                let provider = match &self.base_url {
                    Some(url) => OpenAIProvider::new(url, api_key)?,
                    None => OpenAIProvider::default(api_key)?,
                };
                Ok(GeneralModelProvider::OpenAI(provider))
            }
        }
    }
}

fn default_budget() -> usize {
    10
}

/// Study description loaded from a TOML file
///
/// ```toml
/// model_type = "SVM classifier"
/// budget = 10
/// command = ["python", "train_svm.py"]
///
/// [params.C]
/// type = "float"
/// low = 0.001
/// high = 1000.0
/// log = true
///
/// [params.kernel]
/// type = "categorical"
/// choices = ["rbf", "linear"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    pub model_type: String,
    #[serde(default = "default_budget")]
    pub budget: usize,
    #[serde(default)]
    pub chain_of_thought: bool,
    /// Search space text shown to the model verbatim; rendered from `params` when absent
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub command: Vec<String>,
    pub params: BTreeMap<String, Distribution>,
}

impl StudyConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TunerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: StudyConfig = toml::from_str(content)
            .map_err(|e| TunerError::Config(format!("Failed to parse study file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.params.is_empty() {
            return Err(TunerError::Config("study declares no parameters".to_string()));
        }
        if self.budget == 0 {
            return Err(TunerError::Config("budget must be at least 1".to_string()));
        }
        for (name, distribution) in &self.params {
            distribution
                .validate()
                .map_err(|reason| TunerError::Config(format!("parameter {}: {}", name, reason)))?;
        }
        Ok(())
    }

    pub fn search_space(&self) -> SearchSpace {
        self.params.clone()
    }

    /// Text the model sees as the search space
    pub fn search_space_text(&self) -> String {
        match &self.description {
            Some(text) => text.trim_end().to_string(),
            None => self
                .params
                .iter()
                .map(|(name, distribution)| format!("- {}: {}", name, distribution.describe()))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Example reply built from a representative value of every parameter
    pub fn example(&self) -> Configuration {
        self.params
            .iter()
            .filter_map(|(name, distribution)| {
                distribution
                    .representative()
                    .map(|value| (name.clone(), value))
            })
            .collect()
    }

    pub fn conversation_settings(&self) -> ConversationSettings {
        ConversationSettings::new(&self.model_type, self.search_space_text(), self.budget)
            .with_chain_of_thought(self.chain_of_thought)
            .with_example(self.example())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    const SVM_STUDY: &str = r#"
model_type = "SVM classifier"
budget = 8
command = ["python", "train_svm.py"]

[params.C]
type = "float"
low = 0.001
high = 1000.0
log = true

[params.kernel]
type = "categorical"
choices = ["rbf", "linear"]

[params.degree]
type = "int"
low = 1
high = 5
"#;

    #[test]
    fn test_parse_study() {
        let study = StudyConfig::parse(SVM_STUDY).unwrap();
        assert_eq!(study.model_type, "SVM classifier");
        assert_eq!(study.budget, 8);
        assert!(!study.chain_of_thought);
        assert_eq!(study.command, vec!["python", "train_svm.py"]);
        assert_eq!(study.params["C"], Distribution::log_float(0.001, 1000.0));
        assert_eq!(study.params["degree"], Distribution::int(1, 5));
        assert_eq!(
            study.params["kernel"],
            Distribution::categorical(["rbf", "linear"])
        );
    }

    #[test]
    fn test_rendered_search_space_text() {
        let study = StudyConfig::parse(SVM_STUDY).unwrap();
        assert_eq!(
            study.search_space_text(),
            "- C: float in [0.001, 1000] (log scale)\n- degree: integer in [1, 5]\n- kernel: one of [\"rbf\", \"linear\"]"
        );
    }

    #[test]
    fn test_description_overrides_rendering() {
        let content = format!("description = \"C in [0.1, 10]\\n\"\n{}", SVM_STUDY);
        let study = StudyConfig::parse(&content).unwrap();
        assert_eq!(study.search_space_text(), "C in [0.1, 10]");
    }

    #[test]
    fn test_example_uses_representative_values() {
        let study = StudyConfig::parse(SVM_STUDY).unwrap();
        let example = study.example();
        assert_eq!(example["degree"], ParamValue::Int(3));
        assert_eq!(example["kernel"], ParamValue::Text("rbf".to_string()));
        assert!((example["C"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_integer_range_builds_settings() {
        let content = format!(
            "model_type = \"mlp\"\n[params.seed]\ntype = \"int\"\nlow = {}\nhigh = {}\n",
            i64::MIN,
            i64::MAX
        );
        let study = StudyConfig::parse(&content).unwrap();
        let settings = study.conversation_settings();
        assert_eq!(settings.example["seed"], ParamValue::Int(0));
        assert!(settings.search_space.contains("seed: integer in"));
    }

    #[test]
    fn test_invalid_studies() {
        let no_params = "model_type = \"mlp\"\n[params]\n";
        assert!(matches!(
            StudyConfig::parse(no_params),
            Err(TunerError::Config(_))
        ));

        let bad_range = "model_type = \"mlp\"\n[params.lr]\ntype = \"float\"\nlow = 1.0\nhigh = 0.1\n";
        assert!(matches!(
            StudyConfig::parse(bad_range),
            Err(TunerError::Config(_))
        ));
    }

    #[test]
    fn test_provider_settings() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.model_name(), "gpt-4-1106-preview");
        assert!(matches!(
            settings.create_provider(),
            Err(TunerError::Config(_))
        ));

        let settings = ProviderSettings {
            provider: ProviderKind::Ollama,
            model: Some("qwen2.5:7b".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.model_name(), "qwen2.5:7b");
        assert_eq!(
            settings.create_provider().unwrap().kind(),
            ProviderKind::Ollama
        );
    }
}
