//! Telegram interface for the follower scout.
//!
//! - **Commands** (`commands`) - `/start`, `/settings`, `/set`, `/analyze` parsing and routing
//! - **Messages** (`messages`) - reply texts for each command
//! - **Chat** (`chat`) - the outbound chat seam and the status channel built on it
//! - **Analyze** (`analyze`) - background analysis runs and report delivery
//! - **Bot** (`bot`) - teloxide adapter and the long-polling dispatcher
//!
//! ```text
//! Telegram update → BotState → CommandRouter → AnalysisRunner → CollectionPipeline
//!                                    ↓                 ↓
//!                               ChatReply        StatusReporter / xlsx document
//! ```

pub mod analyze;
pub mod bot;
pub mod chat;
pub mod commands;
pub mod messages;

pub use analyze::AnalysisRunner;
pub use bot::{BotRunner, BotState, TeloxideChat};
pub use chat::{ChatApi, ChatApiError, ChatStatusChannel, ChatTarget};
pub use commands::{
    parse_chat_command, AnalysisLauncher, ChatCommand, CommandContext, CommandRouter,
};
pub use messages::{ChatReply, TextFormat};
