#![allow(dead_code)]

use async_trait::async_trait;
use ghosttuner::{ChatMessage, ChatModel, ChatRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Chat model that answers from a fixed script and keeps every request it saw.
/// A scripted `Err` entry makes that call fail at the provider level.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_outcomes(replies.into_iter().map(|r| Ok(r.into())))
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = Result<String, String>>) -> Arc<Self> {
        Arc::new(ScriptedModel {
            replies: Mutex::new(outcomes.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Content of the last user message of the `index`-th request
    pub fn prompt(&self, index: usize) -> String {
        let requests = self.requests.lock().unwrap();
        requests[index]
            .messages()
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(ChatMessage::assistant(reply)),
            Some(Err(reason)) => Err(anyhow::anyhow!(reason)),
            None => Err(anyhow::anyhow!("script exhausted")),
        }
    }
}

pub const SVM_SPACE: &str = "- C: float in [0.001, 1000] (log scale)\n- gamma: float in [0.0001, 1] (log scale)";
