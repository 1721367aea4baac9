use crate::api::{ChatMessage, ChatRequest, OutputFormat, Role};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct ModelDefinition {
    pub(crate) name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct ListModelsResponse {
    pub(crate) models: Vec<ModelDefinition>,
}

// Ollama representation of messages.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct Message {
    pub(crate) role: Role,
    pub(crate) content: String,
}

impl From<Message> for ChatMessage {
    fn from(msg: Message) -> Self {
        ChatMessage::new(msg.role, msg.content)
    }
}

impl From<&ChatMessage> for Message {
    fn from(msg: &ChatMessage) -> Message {
        Message {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub(crate) struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct OllamaRequest {
    pub(crate) model: String,

    pub(crate) messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) stream: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) options: Option<OllamaOptions>,
}

impl OllamaRequest {
    pub(crate) fn from_chat_request(model_name: &str, value: &ChatRequest) -> Self {
        let format = match value.output_format {
            OutputFormat::JsonObject => Some("json".to_string()),
            OutputFormat::Text => None,
        };
        let options = value.temperature.map(|temperature| OllamaOptions {
            temperature: Some(temperature),
        });

        OllamaRequest {
            model: model_name.to_string(),
            messages: value.messages.iter().map(|msg| msg.into()).collect(),
            stream: Some(false),
            format,
            options,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct OllamaResponse {
    pub(crate) message: Message,

    #[serde(flatten)]
    pub(crate) extra: serde_json::Value,
}

impl From<OllamaResponse> for ChatMessage {
    fn from(response: OllamaResponse) -> Self {
        response.message.into()
    }
}
