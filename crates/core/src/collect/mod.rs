//! Follower collection pipeline: resolve the target account, page through its
//! followers, fetch each candidate's posts and keep those passing the filters.
//!
//! Every vendor call is awaited in sequence. The only pacing is the fixed pause
//! between follower pages and the retry backoff inside the post lookup.

pub mod progress;
pub mod source;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    domain::{
        account::{AccountId, TargetHandle},
        follower::{FollowerRecord, ViewStats},
        result::ResultRow,
    },
    errors::AnalysisError,
    filters::FilterStore,
    status::{StatusChannel, StatusReporter},
};

use self::progress::ProgressThrottle;
pub use self::source::{FetchOutcome, SocialDataApi};

pub const DEFAULT_PROFILE_URL_PREFIX: &str = "https://www.tiktok.com/@";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineSettings {
    pub page_size: u32,
    pub page_delay: Duration,
    pub progress_every: usize,
    pub progress_interval: Duration,
    pub profile_url_prefix: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            page_delay: Duration::from_secs(1),
            progress_every: 10,
            progress_interval: Duration::from_secs(3),
            profile_url_prefix: DEFAULT_PROFILE_URL_PREFIX.to_owned(),
        }
    }
}

/// User-visible progress of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStage {
    Resolving,
    FetchingFollowers,
    Analyzing { total: usize },
    Progress { current: usize, total: usize },
    BuildingReport,
    Completed { matches: usize },
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolving => f.write_str("🔍 Fetching account info..."),
            Self::FetchingFollowers => f.write_str("👥 Fetching the follower list..."),
            Self::Analyzing { total } => write!(f, "📊 Starting analysis of {total} followers..."),
            Self::Progress { current, total } => {
                write!(f, "📊 Analyzing follower {current}/{total}...")
            }
            Self::BuildingReport => f.write_str("📄 Building the report..."),
            Self::Completed { matches } => write!(f, "✅ Found {matches} matching accounts!"),
        }
    }
}

/// Output of a successful run, handed to the report builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisReport {
    pub handle: TargetHandle,
    pub followers_scanned: usize,
    pub rows: Vec<ResultRow>,
}

pub struct CollectionPipeline {
    api: Arc<dyn SocialDataApi>,
    filters: FilterStore,
    settings: PipelineSettings,
}

impl CollectionPipeline {
    pub fn new(
        api: Arc<dyn SocialDataApi>,
        filters: FilterStore,
        settings: PipelineSettings,
    ) -> Self {
        Self { api, filters, settings }
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    pub async fn run<C>(
        &self,
        handle: &TargetHandle,
        reporter: &mut StatusReporter<C>,
        correlation_id: &str,
    ) -> Result<AnalysisReport, AnalysisError>
    where
        C: StatusChannel,
    {
        reporter.report(&RunStage::Resolving.to_string()).await;
        let account = self.resolve(handle, correlation_id).await?;

        reporter.report(&RunStage::FetchingFollowers.to_string()).await;
        let followers = self.collect_followers(&account, correlation_id).await;
        info!(
            event_name = "run.followers.collected",
            correlation_id,
            handle = %handle,
            followers = followers.len(),
            "follower pagination finished"
        );
        if followers.is_empty() {
            return Err(AnalysisError::NoFollowers);
        }

        let total = followers.len();
        reporter.report(&RunStage::Analyzing { total }.to_string()).await;
        let rows = self.filter_followers(&followers, reporter, correlation_id).await;

        if rows.is_empty() {
            return Err(AnalysisError::NoMatches);
        }

        Ok(AnalysisReport { handle: handle.clone(), followers_scanned: total, rows })
    }

    async fn resolve(
        &self,
        handle: &TargetHandle,
        correlation_id: &str,
    ) -> Result<AccountId, AnalysisError> {
        match self.api.resolve_account(handle).await {
            FetchOutcome::Data(account) => {
                info!(
                    event_name = "run.account.resolved",
                    correlation_id,
                    handle = %handle,
                    "target account resolved"
                );
                Ok(account)
            }
            FetchOutcome::RateLimited(message) => {
                warn!(
                    event_name = "run.account.rate_limited",
                    correlation_id,
                    handle = %handle,
                    vendor_message = %message,
                    "vendor quota exhausted during account lookup"
                );
                Err(AnalysisError::RateLimited(message))
            }
            other => {
                warn!(
                    event_name = "run.account.unresolved",
                    correlation_id,
                    handle = %handle,
                    outcome = other.kind(),
                    "target account could not be resolved"
                );
                Err(AnalysisError::NotFound)
            }
        }
    }

    /// Pages until the first short page. A page that is not data counts as
    /// empty, so a quota hit mid-way truncates the list instead of failing.
    /// Page length is judged on what the vendor listed; entries without a
    /// handle are dropped only afterwards.
    pub async fn collect_followers(
        &self,
        account: &AccountId,
        correlation_id: &str,
    ) -> Vec<FollowerRecord> {
        let page_size = self.settings.page_size.max(1);
        let mut followers = Vec::new();
        let mut offset = 0_u32;

        loop {
            let page = match self.api.list_followers_page(account, offset, page_size).await {
                FetchOutcome::Data(page) => page,
                FetchOutcome::Empty => Vec::new(),
                outcome => {
                    warn!(
                        event_name = "run.followers.page_failed",
                        correlation_id,
                        offset,
                        outcome = outcome.kind(),
                        collected = followers.len(),
                        "follower page unavailable; stopping pagination"
                    );
                    Vec::new()
                }
            };

            let received = page.len();
            let before = followers.len();
            followers.extend(page.into_iter().filter(FollowerRecord::has_handle));
            debug!(
                event_name = "run.followers.page",
                correlation_id,
                offset,
                received,
                unnamed = received - (followers.len() - before),
                collected = followers.len(),
                "follower page received"
            );

            if received < page_size as usize {
                break;
            }
            offset = offset.saturating_add(page_size);

            if !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }
        }

        followers
    }

    async fn filter_followers<C>(
        &self,
        followers: &[FollowerRecord],
        reporter: &mut StatusReporter<C>,
        correlation_id: &str,
    ) -> Vec<ResultRow>
    where
        C: StatusChannel,
    {
        let total = followers.len();
        let mut throttle =
            ProgressThrottle::new(self.settings.progress_every, self.settings.progress_interval);
        let mut rows = Vec::new();

        for (index, follower) in followers.iter().enumerate() {
            let filters = self.filters.snapshot();

            if follower.follower_count > filters.max_followers {
                debug!(
                    event_name = "run.follower.skipped",
                    correlation_id,
                    follower = %follower.handle,
                    reason = "too_many_followers",
                    follower_count = follower.follower_count,
                    "follower skipped"
                );
                continue;
            }

            if throttle.should_report(index) {
                let stage = RunStage::Progress { current: index + 1, total };
                reporter.report(&stage.to_string()).await;
            }

            let posts = match self.api.list_posts(&follower.post_lookup_id()).await {
                FetchOutcome::Data(posts) => posts,
                outcome => {
                    debug!(
                        event_name = "run.follower.skipped",
                        correlation_id,
                        follower = %follower.handle,
                        reason = "no_posts",
                        outcome = outcome.kind(),
                        "follower skipped"
                    );
                    continue;
                }
            };

            let Some(stats) = ViewStats::compute(&posts, filters.min_views) else {
                continue;
            };

            if stats.popular_posts < filters.min_popular_posts {
                debug!(
                    event_name = "run.follower.skipped",
                    correlation_id,
                    follower = %follower.handle,
                    reason = "not_enough_popular_posts",
                    popular_posts = stats.popular_posts,
                    "follower skipped"
                );
                continue;
            }

            info!(
                event_name = "run.follower.matched",
                correlation_id,
                follower = %follower.handle,
                popular_posts = stats.popular_posts,
                max_views = stats.max_views,
                "follower added to results"
            );
            rows.push(ResultRow::from_follower(
                follower,
                stats,
                &self.settings.profile_url_prefix,
            ));
        }

        rows
    }
}
