//! Scripted stand-ins for the language model, shared by this crate's tests and the binaries'
//! integration tests.

use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::llm::{ChatMessage, ChatModel, ChatReply, LlmClient, ToolSpec};

/// Replays canned completions in order and records every prompt it was given.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl ScriptedLlm {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { failure: Some(message.into()), ..Self::default() }
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().await.push(prompt.to_string());
        if let Some(message) = &self.failure {
            return Err(anyhow!("{message}"));
        }
        self.replies.lock().await.pop_front().ok_or_else(|| anyhow!("scripted llm has no replies left"))
    }
}

/// Replays canned chat turns in order and records the transcript seen on each call.
#[derive(Default)]
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<ChatReply>>,
    transcripts: Mutex<Vec<Vec<ChatMessage>>>,
    offered_tools: Mutex<Vec<Vec<String>>>,
    repeat_last: bool,
}

impl ScriptedChatModel {
    pub fn new(replies: impl IntoIterator<Item = ChatReply>) -> Self {
        Self { replies: Mutex::new(replies.into_iter().collect()), ..Self::default() }
    }

    /// Answers every call with `reply`, however many times it is asked.
    pub fn always(reply: ChatReply) -> Self {
        Self { repeat_last: true, ..Self::new([reply]) }
    }

    pub async fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.transcripts.lock().await.clone()
    }

    pub async fn offered_tools(&self) -> Vec<Vec<String>> {
        self.offered_tools.lock().await.clone()
    }

    pub async fn calls(&self) -> usize {
        self.transcripts.lock().await.len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<ChatReply> {
        self.transcripts.lock().await.push(messages.to_vec());
        self.offered_tools.lock().await.push(tools.iter().map(|tool| tool.name.clone()).collect());

        let mut replies = self.replies.lock().await;
        if self.repeat_last && replies.len() == 1 {
            return replies.front().cloned().ok_or_else(|| anyhow!("scripted chat is empty"));
        }
        replies.pop_front().ok_or_else(|| anyhow!("scripted chat model has no replies left"))
    }
}
