use async_trait::async_trait;
use scout_core::{FilterStore, FilterUpdate, TargetHandle};
use thiserror::Error;
use tracing::{info, warn};

use crate::chat::ChatTarget;
use crate::messages::{self, ChatReply};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Settings,
    Set { args: String },
    Analyze { handle: Option<String> },
    Unknown { name: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandContext {
    pub chat: ChatTarget,
    pub correlation_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("analysis could not be started: {0}")]
    Launch(String),
}

/// Parses a chat message into a command. Returns `None` for plain text and
/// for commands addressed to a different bot (`/start@other_bot`).
pub fn parse_chat_command(text: &str, bot_username: Option<&str>) -> Option<ChatCommand> {
    let trimmed = text.trim();
    let body = trimmed.strip_prefix('/')?;

    let mut parts = body.split_whitespace();
    let head = parts.next()?;
    let (name, addressee) = match head.split_once('@') {
        Some((name, addressee)) => (name, Some(addressee)),
        None => (head, None),
    };

    if let (Some(addressee), Some(own)) = (addressee, bot_username) {
        if !addressee.eq_ignore_ascii_case(own) {
            return None;
        }
    }

    let name = name.to_ascii_lowercase();
    let command = match name.as_str() {
        "start" | "help" => ChatCommand::Start,
        "settings" => ChatCommand::Settings,
        "set" => ChatCommand::Set { args: parts.collect::<Vec<_>>().join(" ") },
        "analyze" => ChatCommand::Analyze { handle: parts.next().map(str::to_owned) },
        _ => ChatCommand::Unknown { name },
    };
    Some(command)
}

/// Starts an analysis run in the background.
#[async_trait]
pub trait AnalysisLauncher: Send + Sync {
    async fn launch(
        &self,
        chat: ChatTarget,
        handle: TargetHandle,
        correlation_id: String,
    ) -> Result<(), CommandRouteError>;
}

pub struct CommandRouter<L> {
    filters: FilterStore,
    launcher: L,
}

impl<L> CommandRouter<L>
where
    L: AnalysisLauncher,
{
    pub fn new(filters: FilterStore, launcher: L) -> Self {
        Self { filters, launcher }
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Handles one command. `Ok(None)` means the command answers through its
    /// own status messages.
    pub async fn route(
        &self,
        command: ChatCommand,
        ctx: &CommandContext,
    ) -> Result<Option<ChatReply>, CommandRouteError> {
        match command {
            ChatCommand::Start => Ok(Some(messages::help_message(&self.filters.snapshot()))),
            ChatCommand::Settings => Ok(Some(messages::settings_message(&self.filters.snapshot()))),
            ChatCommand::Set { args } => Ok(Some(self.apply_filter_update(&args, ctx))),
            ChatCommand::Analyze { handle } => {
                let Some(handle) = handle.as_deref().and_then(TargetHandle::parse) else {
                    return Ok(Some(messages::analyze_usage()));
                };
                self.launcher.launch(ctx.chat, handle, ctx.correlation_id.clone()).await?;
                Ok(None)
            }
            ChatCommand::Unknown { name } => Ok(Some(messages::unknown_command(&name))),
        }
    }

    fn apply_filter_update(&self, args: &str, ctx: &CommandContext) -> ChatReply {
        match FilterUpdate::parse(args) {
            Ok(update) => {
                let updated = self.filters.set(update.param, update.value);
                info!(
                    event_name = "filters.updated",
                    correlation_id = %ctx.correlation_id,
                    chat = ctx.chat.0,
                    param = update.param.as_str(),
                    value = update.value,
                    max_followers = updated.max_followers,
                    min_views = updated.min_views,
                    min_popular_posts = updated.min_popular_posts,
                    "filter threshold changed"
                );
                messages::set_confirmation(update.param, update.value)
            }
            Err(error) => {
                warn!(
                    event_name = "filters.update_rejected",
                    correlation_id = %ctx.correlation_id,
                    chat = ctx.chat.0,
                    error = %error,
                    "filter update rejected"
                );
                messages::filter_error_message(&error)
            }
        }
    }
}
