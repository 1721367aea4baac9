use super::api::{OllamaRequest, OllamaResponse};
use crate::client::Client;
use crate::traffic_log;
use crate::{ChatMessage, ChatModel, ChatRequest};
use async_trait::async_trait;

pub struct OllamaChatModel {
    client: Client,
    base_url: String,
    model_name: String,
}

impl OllamaChatModel {
    pub fn new(client: Client, base_url: String, model_name: String) -> Self {
        OllamaChatModel {
            client,
            base_url,
            model_name,
        }
    }
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        let url = format!("{}/api/chat", self.base_url);

        let api_request = OllamaRequest::from_chat_request(&self.model_name, request);
        traffic_log::log_request(&self.model_name, &api_request);

        match self
            .client
            .post::<_, _, OllamaResponse>(url, &api_request)
            .await
        {
            Ok(response) => {
                traffic_log::log_response(&self.model_name, &response);
                Ok(response.into())
            }
            Err(e) => {
                traffic_log::log_error(&self.model_name, &e.to_string());
                Err(e)
            }
        }
    }
}
