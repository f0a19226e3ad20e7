use serde::{Deserialize, Serialize};

use crate::domain::account::AccountId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerRecord {
    pub handle: String,
    pub account_id: Option<AccountId>,
    pub display_name: String,
    pub follower_count: u64,
    pub biography: String,
}

impl FollowerRecord {
    /// Listings occasionally carry entries without a username; those are
    /// counted for pagination but never analyzed.
    pub fn has_handle(&self) -> bool {
        !self.handle.is_empty()
    }

    /// Identifier used for post lookups: the internal id when the listing
    /// carried one, otherwise the public handle.
    pub fn post_lookup_id(&self) -> AccountId {
        match &self.account_id {
            Some(id) if !id.as_str().is_empty() => id.clone(),
            _ => AccountId(self.handle.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub views: u64,
}

/// Aggregate view statistics over one follower's fetched posts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewStats {
    pub total_posts: u64,
    pub popular_posts: u64,
    pub max_views: u64,
    pub mean_views: u64,
}

impl ViewStats {
    /// Returns `None` for an empty post list. Max and mean cover every post,
    /// not only the popular ones.
    pub fn compute(posts: &[PostSummary], popular_threshold: u64) -> Option<Self> {
        if posts.is_empty() {
            return None;
        }

        let total_posts = posts.len() as u64;
        let popular_posts = posts.iter().filter(|post| post.views >= popular_threshold).count();
        let max_views = posts.iter().map(|post| post.views).max().unwrap_or_default();
        let sum: u128 = posts.iter().map(|post| u128::from(post.views)).sum();
        let mean_views = ((sum as f64) / (total_posts as f64)).round() as u64;

        Some(Self { total_posts, popular_posts: popular_posts as u64, max_views, mean_views })
    }
}
