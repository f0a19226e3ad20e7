use scout_core::{FilterConfig, FilterParam, FilterUpdateError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Html,
}

/// A reply ready to be posted to a chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub format: TextFormat,
}

impl ChatReply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), format: TextFormat::Plain }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self { text: text.into(), format: TextFormat::Html }
    }
}

const SET_EXAMPLES: &str = "/set followers 3000\n/set views 7000\n/set videos 2";

pub fn help_message(filters: &FilterConfig) -> ChatReply {
    ChatReply::html(format!(
        "<b>👋 Follower Scout</b>\n\n\
         Finds micro-influencers among an account's followers:\n\
         • Max followers: {max}\n\
         • Videos with ≥ {views} views: at least {videos}\n\n\
         <b>Commands:</b>\n\
         /analyze username - analyze an account\n\
         /settings - current filters\n\
         /set followers 3000 - max followers\n\
         /set views 7000 - min views\n\
         /set videos 2 - min popular videos\n\n\
         <b>Example:</b> /analyze username",
        max = filters.max_followers,
        views = filters.min_views,
        videos = filters.min_popular_posts,
    ))
}

pub fn settings_message(filters: &FilterConfig) -> ChatReply {
    ChatReply::html(format!(
        "⚙️ <b>Current filters:</b>\n\n\
         • Followers ≤ <b>{max}</b>\n\
         • Minimum videos with ≥ <b>{views}</b> views: <b>{videos}</b>\n\n\
         <b>To change them use:</b>\n\
         /set followers [number] - max followers\n\
         /set views [number] - min views\n\
         /set videos [number] - min popular videos",
        max = filters.max_followers,
        views = filters.min_views,
        videos = filters.min_popular_posts,
    ))
}

pub fn set_confirmation(param: FilterParam, value: u64) -> ChatReply {
    let label = match param {
        FilterParam::Followers => "Max followers",
        FilterParam::Views => "Min views",
        FilterParam::Videos => "Min popular videos",
    };
    ChatReply::plain(format!("✅ {label} set to {value}"))
}

pub fn filter_error_message(error: &FilterUpdateError) -> ChatReply {
    match error {
        FilterUpdateError::Usage => {
            ChatReply::plain(format!("❗ Wrong format. Use:\n{SET_EXAMPLES}"))
        }
        FilterUpdateError::InvalidValue(_) | FilterUpdateError::NegativeValue(_) => {
            ChatReply::plain("❗ The value must be a non-negative number")
        }
        FilterUpdateError::UnknownParameter(_) => ChatReply::plain(format!(
            "❗ Unknown parameter. Use: {}",
            FilterParam::valid_names()
        )),
    }
}

pub fn analyze_usage() -> ChatReply {
    ChatReply::plain("❗ Provide a username without @\nExample: /analyze username")
}

pub fn unknown_command(name: &str) -> ChatReply {
    ChatReply::plain(format!("❓ Unknown command /{name}. Send /start for the list of commands."))
}
