use async_trait::async_trait;
use std::sync::Arc;

pub mod api;
mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod harness;
pub mod objective;
pub mod params;
pub mod prompting;
pub mod providers;
pub mod sampler;
mod traffic_log;

pub use api::*;
pub use conversation::{Conversation, ConversationSettings, ResponseFormat};
pub use error::{Result, TunerError};
pub use params::{Configuration, ParamValue};
pub use providers::GeneralModelProvider;
pub use sampler::LlmSampler;

#[async_trait]
pub trait ChatModel {
    fn name(&self) -> &str;

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage>;
}

// Blanket implementation for Arc<dyn ChatModel> to make it easier to work with
#[async_trait]
impl ChatModel for Arc<dyn ChatModel + Send + Sync> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        (**self).chat(request).await
    }
}

#[async_trait]
pub trait ModelProvider {
    /// List available models from the provider
    async fn list_models(&self) -> anyhow::Result<Vec<String>>;

    /// Create a chat model by name, returned as Arc for sharing across threads
    fn create_chat_model(&self, model_name: &str) -> Option<Arc<dyn ChatModel + Send + Sync>>;
}
