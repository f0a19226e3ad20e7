use std::sync::Arc;

use async_trait::async_trait;
use scout_core::{MessageHandle, StatusChannel, StatusChannelError};
use thiserror::Error;

use crate::messages::ChatReply;

/// Chat a command came from and where its replies go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatTarget(pub i64);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChatApiError {
    #[error("chat request failed: {0}")]
    Request(String),
    #[error("message id {0} is out of range for the chat platform")]
    InvalidMessageId(i64),
}

/// Outbound calls the bot makes to the chat platform.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatTarget,
        reply: &ChatReply,
    ) -> Result<MessageHandle, ChatApiError>;

    async fn edit_text(
        &self,
        chat: ChatTarget,
        message: MessageHandle,
        text: &str,
    ) -> Result<(), ChatApiError>;

    async fn send_document(
        &self,
        chat: ChatTarget,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ChatApiError>;
}

/// Status messages of one run, posted as plain text into one chat.
#[derive(Clone)]
pub struct ChatStatusChannel {
    api: Arc<dyn ChatApi>,
    chat: ChatTarget,
}

impl ChatStatusChannel {
    pub fn new(api: Arc<dyn ChatApi>, chat: ChatTarget) -> Self {
        Self { api, chat }
    }
}

#[async_trait]
impl StatusChannel for ChatStatusChannel {
    async fn send(&self, text: &str) -> Result<MessageHandle, StatusChannelError> {
        self.api
            .send_text(self.chat, &ChatReply::plain(text))
            .await
            .map_err(|error| StatusChannelError::Send(error.to_string()))
    }

    async fn edit(&self, handle: MessageHandle, text: &str) -> Result<(), StatusChannelError> {
        self.api
            .edit_text(self.chat, handle, text)
            .await
            .map_err(|error| StatusChannelError::Edit(error.to_string()))
    }
}
