use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric thresholds applied to every follower during an analysis run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Followers with strictly more followers than this are skipped.
    pub max_followers: u64,
    /// Views a post needs (inclusive) to count as popular.
    pub min_views: u64,
    /// Popular posts a follower needs to qualify.
    pub min_popular_posts: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { max_followers: 3_000, min_views: 7_000, min_popular_posts: 2 }
    }
}

impl FilterConfig {
    pub fn get(&self, param: FilterParam) -> u64 {
        match param {
            FilterParam::Followers => self.max_followers,
            FilterParam::Views => self.min_views,
            FilterParam::Videos => self.min_popular_posts,
        }
    }

    pub fn with(mut self, param: FilterParam, value: u64) -> Self {
        match param {
            FilterParam::Followers => self.max_followers = value,
            FilterParam::Views => self.min_views = value,
            FilterParam::Videos => self.min_popular_posts = value,
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterParam {
    Followers,
    Views,
    Videos,
}

impl FilterParam {
    pub const ALL: [FilterParam; 3] = [Self::Followers, Self::Views, Self::Videos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::Views => "views",
            Self::Videos => "videos",
        }
    }

    pub fn valid_names() -> String {
        Self::ALL.iter().map(FilterParam::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for FilterParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterParam {
    type Err = FilterUpdateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "followers" => Ok(Self::Followers),
            "views" => Ok(Self::Views),
            "videos" => Ok(Self::Videos),
            other => Err(FilterUpdateError::UnknownParameter(other.to_owned())),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FilterUpdateError {
    #[error("expected exactly a parameter name and a value")]
    Usage,
    #[error("unknown filter parameter `{0}`")]
    UnknownParameter(String),
    #[error("filter value `{0}` is not a whole number")]
    InvalidValue(String),
    #[error("filter value `{0}` is negative")]
    NegativeValue(String),
}

/// A validated `/set` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterUpdate {
    pub param: FilterParam,
    pub value: u64,
}

impl FilterUpdate {
    /// Parses the argument string of `/set`, e.g. `"views 7000"`.
    pub fn parse(args: &str) -> Result<Self, FilterUpdateError> {
        let parts: Vec<&str> = args.split_whitespace().collect();
        let [name, raw_value] = parts.as_slice() else {
            return Err(FilterUpdateError::Usage);
        };

        let value = parse_filter_value(raw_value)?;
        let param = name.parse::<FilterParam>()?;
        Ok(Self { param, value })
    }
}

pub fn parse_filter_value(raw: &str) -> Result<u64, FilterUpdateError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = trimmed.parse::<u64>() {
        return Ok(parsed);
    }

    match trimmed.parse::<i128>() {
        Ok(negative) if negative < 0 => Err(FilterUpdateError::NegativeValue(trimmed.to_owned())),
        _ => Err(FilterUpdateError::InvalidValue(trimmed.to_owned())),
    }
}

/// Process-wide owner of the live [`FilterConfig`].
///
/// Clones share the same configuration. Runs read a fresh snapshot for each
/// follower, so an update made mid-run applies to followers not yet examined.
#[derive(Clone, Debug, Default)]
pub struct FilterStore {
    inner: Arc<RwLock<FilterConfig>>,
}

impl FilterStore {
    pub fn new(initial: FilterConfig) -> Self {
        Self { inner: Arc::new(RwLock::new(initial)) }
    }

    pub fn snapshot(&self) -> FilterConfig {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn replace(&self, config: FilterConfig) -> FilterConfig {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, config)
    }

    /// Replaces one threshold and returns the resulting configuration.
    pub fn set(&self, param: FilterParam, value: u64) -> FilterConfig {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = guard.with(param, value);
        *guard
    }
}
