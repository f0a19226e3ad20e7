use async_trait::async_trait;

use crate::domain::{
    account::{AccountId, TargetHandle},
    follower::{FollowerRecord, PostSummary},
};

/// Result of one vendor lookup. Failures are values so a run can keep going
/// with partial data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Data(T),
    /// The request succeeded but carried nothing usable.
    Empty,
    /// The vendor reported an exhausted quota.
    RateLimited(String),
    /// Network, HTTP or decoding failure.
    Transport(String),
}

impl<T> FetchOutcome<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Data(_) => "data",
            Self::Empty => "empty",
            Self::RateLimited(_) => "rate_limited",
            Self::Transport(_) => "transport",
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }
}

/// Read-only view of the third-party social data API.
#[async_trait]
pub trait SocialDataApi: Send + Sync {
    async fn resolve_account(&self, handle: &TargetHandle) -> FetchOutcome<AccountId>;

    /// One page of followers. A page shorter than `page_size` is the last one.
    async fn list_followers_page(
        &self,
        account: &AccountId,
        offset: u32,
        page_size: u32,
    ) -> FetchOutcome<Vec<FollowerRecord>>;

    /// Recent posts, with the client's retry policy already applied.
    async fn list_posts(&self, account: &AccountId) -> FetchOutcome<Vec<PostSummary>>;
}
