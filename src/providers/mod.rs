pub(crate) mod ollama;
pub(crate) mod openai;

pub use ollama::{OllamaChatModel, OllamaProvider};
pub use openai::{OpenAIChatModel, OpenAIProvider};

use crate::{ChatModel, ModelProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAI,
    Ollama,
}

impl ProviderKind {
    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4-1106-preview",
            ProviderKind::Ollama => "llama3.1:latest",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(format!("Unknown provider: {}. Use 'openai' or 'ollama'", s)),
        }
    }
}

pub enum GeneralModelProvider {
    Ollama(OllamaProvider),
    OpenAI(OpenAIProvider),
}

impl GeneralModelProvider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            GeneralModelProvider::Ollama(_) => ProviderKind::Ollama,
            GeneralModelProvider::OpenAI(_) => ProviderKind::OpenAI,
        }
    }
}

#[async_trait]
impl ModelProvider for GeneralModelProvider {
    async fn list_models(&self) -> anyhow::Result<Vec<String>> {
        match self {
            GeneralModelProvider::Ollama(p) => p.list_models().await,
            GeneralModelProvider::OpenAI(p) => p.list_models().await,
        }
    }

    fn create_chat_model(&self, model_name: &str) -> Option<Arc<dyn ChatModel + Send + Sync>> {
        match self {
            GeneralModelProvider::Ollama(p) => p.create_chat_model(model_name),
            GeneralModelProvider::OpenAI(p) => p.create_chat_model(model_name),
        }
    }
}
