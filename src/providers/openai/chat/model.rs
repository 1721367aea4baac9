use crate::api::{ChatMessage, ChatRequest};
use crate::client::Client;
use crate::traffic_log;
use crate::ChatModel;
use async_trait::async_trait;

use super::api::{ChatCompletionRequest, ChatCompletionResponse};

#[derive(Clone)]
pub struct OpenAIChatModel {
    client: Client,
    base_url: String,
    model_name: String,
}

impl OpenAIChatModel {
    pub fn new(client: Client, base_url: String, model_name: String) -> Self {
        OpenAIChatModel {
            client,
            base_url,
            model_name,
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        let api_request = ChatCompletionRequest::from_request(self.model_name.clone(), request);
        traffic_log::log_request(&self.model_name, &api_request);

        match self
            .client
            .post::<_, _, ChatCompletionResponse>(self.chat_url(), &api_request)
            .await
        {
            Ok(response) => {
                traffic_log::log_response(&self.model_name, &response);
                ChatMessage::try_from(response)
            }
            Err(e) => {
                traffic_log::log_error(&self.model_name, &e.to_string());
                Err(e)
            }
        }
    }
}
