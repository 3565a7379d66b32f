//! Test-only model double with queued replies.

use crate::agent::state::ChatMessage;
use crate::llm::{ModelCaller, ModelError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Model that pops pre-scripted replies in order and records every prompt.
///
/// Once the script runs out each call fails with [`ModelError::EmptyResponse`].
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of `invoke` calls so far, failed ones included
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Prompt text of each call, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ModelCaller for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().push(prompt);
        self.replies.lock().pop_front().ok_or(ModelError::EmptyResponse)
    }
}
