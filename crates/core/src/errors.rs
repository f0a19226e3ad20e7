use thiserror::Error;

/// Vendor plan page shown when the data API quota is exhausted.
pub const VENDOR_PLAN_URL: &str = "https://rapidapi.com/Lundehund/api/tiktok-api23";

/// Conditions that end an analysis run early.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("target account could not be resolved")]
    NotFound,
    #[error("vendor quota exhausted: {0}")]
    RateLimited(String),
    #[error("no followers were collected")]
    NoFollowers,
    #[error("no follower passed the filters")]
    NoMatches,
    #[error("report build failed: {0}")]
    ReportBuild(String),
    #[error("report delivery failed: {0}")]
    Delivery(String),
}

impl AnalysisError {
    /// Text shown to the chat user when the run stops.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound => "🚫 Could not fetch the account. Check the username or whether \
                               the account is private or deleted."
                .to_owned(),
            Self::RateLimited(_) => {
                format!("🚫 The data API request limit is exhausted. Upgrade the plan at {VENDOR_PLAN_URL}")
            }
            Self::NoFollowers => {
                "⚠️ Could not fetch any followers (the account may be private).".to_owned()
            }
            Self::NoMatches => "❗ No follower passed the filters.".to_owned(),
            Self::ReportBuild(_) | Self::Delivery(_) => {
                "❌ Something went wrong. Please try again later.".to_owned()
            }
        }
    }

    /// Stable label for structured logs.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::RateLimited(_) => "rate_limited",
            Self::NoFollowers => "no_followers",
            Self::NoMatches => "no_matches",
            Self::ReportBuild(_) => "report_build",
            Self::Delivery(_) => "delivery",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{AnalysisError, VENDOR_PLAN_URL};

    #[test]
    fn rate_limit_message_carries_remediation_link() {
        let message = AnalysisError::RateLimited("You have exceeded the quota".to_owned())
            .user_message();
        assert!(message.contains(VENDOR_PLAN_URL));
    }

    #[test]
    fn not_found_and_rate_limit_are_distinguished() {
        assert_ne!(
            AnalysisError::NotFound.user_message(),
            AnalysisError::RateLimited(String::new()).user_message()
        );
    }

    #[test]
    fn fatal_failures_share_generic_text() {
        assert_eq!(
            AnalysisError::ReportBuild("zip".to_owned()).user_message(),
            AnalysisError::Delivery("timeout".to_owned()).user_message()
        );
        assert_eq!(AnalysisError::NoMatches.error_class(), "no_matches");
    }
}
