//! Edit-in-place status messages for a single analysis run.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Identity of a status message previously sent on a [`StatusChannel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub i64);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StatusChannelError {
    #[error("status message send failed: {0}")]
    Send(String),
    #[error("status message edit failed: {0}")]
    Edit(String),
}

/// Outbound half of the chat platform used for status text.
#[async_trait]
pub trait StatusChannel: Send + Sync {
    async fn send(&self, text: &str) -> Result<MessageHandle, StatusChannelError>;
    async fn edit(&self, handle: MessageHandle, text: &str) -> Result<(), StatusChannelError>;
}

#[async_trait]
impl<T> StatusChannel for &T
where
    T: StatusChannel + ?Sized,
{
    async fn send(&self, text: &str) -> Result<MessageHandle, StatusChannelError> {
        (**self).send(text).await
    }

    async fn edit(&self, handle: MessageHandle, text: &str) -> Result<(), StatusChannelError> {
        (**self).edit(handle, text).await
    }
}

pub struct StatusReporter<C> {
    channel: C,
    handle: Option<MessageHandle>,
    correlation_id: String,
}

impl<C> StatusReporter<C>
where
    C: StatusChannel,
{
    pub fn new(channel: C, correlation_id: impl Into<String>) -> Self {
        Self { channel, handle: None, correlation_id: correlation_id.into() }
    }

    pub fn handle(&self) -> Option<MessageHandle> {
        self.handle
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Shows `text` to the user. Never fails: edit failures fall back to a
    /// fresh message, and a failing fallback is only logged.
    pub async fn report(&mut self, text: &str) {
        let Some(handle) = self.handle else {
            self.send_fresh(text).await;
            return;
        };

        match self.channel.edit(handle, text).await {
            Ok(()) => {
                debug!(
                    event_name = "run.status.edited",
                    correlation_id = %self.correlation_id,
                    message = handle.0,
                    "status message edited"
                );
            }
            Err(error) => {
                warn!(
                    event_name = "run.status.edit_failed",
                    correlation_id = %self.correlation_id,
                    message = handle.0,
                    error = %error,
                    "could not edit status message; sending a new one"
                );
                self.send_fresh(text).await;
            }
        }
    }

    async fn send_fresh(&mut self, text: &str) {
        match self.channel.send(text).await {
            Ok(handle) => {
                debug!(
                    event_name = "run.status.sent",
                    correlation_id = %self.correlation_id,
                    message = handle.0,
                    "status message sent"
                );
                self.handle = Some(handle);
            }
            Err(error) => {
                warn!(
                    event_name = "run.status.send_failed",
                    correlation_id = %self.correlation_id,
                    error = %error,
                    "status message could not be delivered"
                );
            }
        }
    }
}
