use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use scout_core::MessageHandle;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ParseMode};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analyze::AnalysisRunner;
use crate::chat::{ChatApi, ChatApiError, ChatTarget};
use crate::commands::{parse_chat_command, CommandContext, CommandRouter};
use crate::messages::{ChatReply, TextFormat};

/// [`ChatApi`] over the Telegram Bot API.
#[derive(Clone)]
pub struct TeloxideChat {
    bot: Bot,
}

impl TeloxideChat {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn request_error(error: teloxide::RequestError) -> ChatApiError {
    ChatApiError::Request(error.to_string())
}

#[async_trait]
impl ChatApi for TeloxideChat {
    async fn send_text(
        &self,
        chat: ChatTarget,
        reply: &ChatReply,
    ) -> Result<MessageHandle, ChatApiError> {
        let mut request = self.bot.send_message(ChatId(chat.0), reply.text.clone());
        if reply.format == TextFormat::Html {
            request = request.parse_mode(ParseMode::Html);
        }
        let message = request.await.map_err(request_error)?;
        Ok(MessageHandle(i64::from(message.id.0)))
    }

    async fn edit_text(
        &self,
        chat: ChatTarget,
        message: MessageHandle,
        text: &str,
    ) -> Result<(), ChatApiError> {
        let id =
            i32::try_from(message.0).map_err(|_| ChatApiError::InvalidMessageId(message.0))?;
        self.bot
            .edit_message_text(ChatId(chat.0), MessageId(id), text)
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat: ChatTarget,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ChatApiError> {
        let file = InputFile::memory(bytes).file_name(file_name.to_owned());
        self.bot.send_document(ChatId(chat.0), file).await.map_err(request_error)?;
        Ok(())
    }
}

/// Everything a message handler needs, shared across updates.
#[derive(Clone)]
pub struct BotState {
    router: Arc<CommandRouter<AnalysisRunner>>,
    chat: Arc<dyn ChatApi>,
    bot_username: Option<String>,
}

impl BotState {
    pub fn new(
        router: Arc<CommandRouter<AnalysisRunner>>,
        chat: Arc<dyn ChatApi>,
        bot_username: Option<String>,
    ) -> Self {
        Self { router, chat, bot_username }
    }

    pub fn router(&self) -> &CommandRouter<AnalysisRunner> {
        &self.router
    }

    /// Handles one incoming text message. Replies are best effort: a failed
    /// send is logged and the update is still considered handled.
    pub async fn handle_text(&self, chat: ChatTarget, text: &str) {
        let Some(command) = parse_chat_command(text, self.bot_username.as_deref()) else {
            return;
        };

        let ctx = CommandContext { chat, correlation_id: Uuid::new_v4().to_string() };
        debug!(
            event_name = "chat.command.received",
            correlation_id = %ctx.correlation_id,
            chat = chat.0,
            command = ?command,
            "chat command received"
        );

        let reply = match self.router.route(command, &ctx).await {
            Ok(Some(reply)) => reply,
            Ok(None) => return,
            Err(error) => {
                warn!(
                    event_name = "chat.command.failed",
                    correlation_id = %ctx.correlation_id,
                    chat = chat.0,
                    error = %error,
                    "chat command failed"
                );
                return;
            }
        };

        if let Err(error) = self.chat.send_text(chat, &reply).await {
            warn!(
                event_name = "chat.reply.failed",
                correlation_id = %ctx.correlation_id,
                chat = chat.0,
                error = %error,
                "could not deliver command reply"
            );
        }
    }
}

/// Long-polling Telegram dispatcher feeding [`BotState`].
pub struct BotRunner {
    bot: Bot,
    state: BotState,
}

impl BotRunner {
    pub fn new(bot: Bot, state: BotState) -> Self {
        Self { bot, state }
    }

    /// Looks up the bot's own username so `/cmd@other_bot` can be ignored.
    pub async fn fetch_username(bot: &Bot) -> Result<String, ChatApiError> {
        let me = bot.get_me().await.map_err(request_error)?;
        Ok(me.username().to_owned())
    }

    /// Dispatches updates until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handler = Update::filter_message().endpoint(on_message);

        let mut dispatcher = Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.state])
            .default_handler(|_| async {})
            .build();

        let token = dispatcher.shutdown_token();
        tokio::spawn(async move {
            shutdown.await;
            info!(event_name = "system.bot.stopping", "stopping telegram dispatcher");
            match token.shutdown() {
                Ok(stopped) => stopped.await,
                Err(error) => warn!(
                    event_name = "system.bot.shutdown_skipped",
                    error = ?error,
                    "dispatcher was not running"
                ),
            }
        });

        info!(event_name = "system.bot.started", "telegram dispatcher started");
        dispatcher.dispatch().await;
        info!(event_name = "system.bot.stopped", "telegram dispatcher stopped");
    }
}

async fn on_message(state: BotState, msg: Message) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        state.handle_text(ChatTarget(msg.chat.id.0), text).await;
    }
    respond(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scout_core::FilterConfig;

    use super::BotState;
    use crate::analyze::tests::{runner_with, StaticApi};
    use crate::chat::tests::{ChatEvent, RecordingChat};
    use crate::chat::ChatTarget;
    use crate::commands::CommandRouter;
    use crate::messages::TextFormat;

    fn state(chat: &Arc<RecordingChat>) -> BotState {
        let runner = runner_with(StaticApi::single_match(), chat.clone());
        let filters = scout_core::FilterStore::new(FilterConfig::default());
        let router = Arc::new(CommandRouter::new(filters, runner));
        BotState::new(router, chat.clone(), Some("scout_bot".to_owned()))
    }

    #[tokio::test]
    async fn start_replies_with_html_help() {
        let chat = RecordingChat::new();
        let state = state(&chat);

        state.handle_text(ChatTarget(3), "/start@scout_bot").await;

        let events = chat.events().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ChatEvent::Text { chat: 3, format: TextFormat::Html, text, .. }
                if text.contains("/analyze")
        ));
    }

    #[tokio::test]
    async fn set_command_updates_shared_filters() {
        let chat = RecordingChat::new();
        let state = state(&chat);

        state.handle_text(ChatTarget(3), "/set videos 4").await;

        assert_eq!(state.router().filters().snapshot().min_popular_posts, 4);
        assert_eq!(chat.last_text().await.as_deref(), Some("✅ Min popular videos set to 4"));
    }

    #[tokio::test]
    async fn plain_text_and_foreign_commands_are_ignored() {
        let chat = RecordingChat::new();
        let state = state(&chat);

        state.handle_text(ChatTarget(3), "just chatting").await;
        state.handle_text(ChatTarget(3), "/start@someone_else_bot").await;

        assert!(chat.events().await.is_empty());
    }

    #[tokio::test]
    async fn analyze_replies_only_through_the_run() {
        let chat = RecordingChat::new();
        let state = state(&chat);

        state.handle_text(ChatTarget(3), "/analyze @target").await;
        let delivered = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            chat.document_sent.notified(),
        )
        .await;

        assert!(delivered.is_ok());
        assert_eq!(chat.documents().await.len(), 1);
    }
}
