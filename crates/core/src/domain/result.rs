use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::follower::{FollowerRecord, ViewStats};

pub const MISSING_VALUE: &str = "—";

/// ASCII word characters only: non-Latin text next to an `@` is not an address.
const EMAIL_PATTERN: &str = r"[A-Za-z0-9_.-]+@[A-Za-z0-9_.-]+\.[a-zA-Z]{2,}";

/// One qualifying follower, in spreadsheet column order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub display_name: String,
    pub handle: String,
    pub email: String,
    pub follower_count: u64,
    pub biography: String,
    pub profile_url: String,
    pub total_posts: u64,
    pub popular_posts: u64,
    pub max_views: u64,
    pub mean_views: u64,
}

impl ResultRow {
    pub fn from_follower(
        follower: &FollowerRecord,
        stats: ViewStats,
        profile_url_prefix: &str,
    ) -> Self {
        let display_name = if follower.display_name.trim().is_empty() {
            follower.handle.clone()
        } else {
            follower.display_name.clone()
        };
        let biography = if follower.biography.trim().is_empty() {
            MISSING_VALUE.to_owned()
        } else {
            follower.biography.clone()
        };

        Self {
            display_name,
            handle: follower.handle.clone(),
            email: extract_emails(&follower.biography),
            follower_count: follower.follower_count,
            biography,
            profile_url: format!("{profile_url_prefix}{}", follower.handle),
            total_posts: stats.total_posts,
            popular_posts: stats.popular_posts,
            max_views: stats.max_views,
            mean_views: stats.mean_views,
        }
    }
}

/// Every address-looking token in `bio`, joined with `", "`, or the
/// placeholder when there is none.
pub fn extract_emails(bio: &str) -> String {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(pattern) = EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()) else {
        return MISSING_VALUE.to_owned();
    };

    let matches: Vec<&str> = pattern.find_iter(bio).map(|found| found.as_str()).collect();
    if matches.is_empty() {
        MISSING_VALUE.to_owned()
    } else {
        matches.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_emails, ResultRow, MISSING_VALUE};
    use crate::domain::{
        account::AccountId,
        follower::{FollowerRecord, ViewStats},
    };

    #[test]
    fn extracts_every_address_in_order() {
        assert_eq!(extract_emails("contact: a@b.com or c@d.org"), "a@b.com, c@d.org");
    }

    #[test]
    fn non_ascii_local_part_is_not_an_address() {
        assert_eq!(extract_emails("пишите: иван@mail.ru"), MISSING_VALUE);
        assert_eq!(extract_emails("ivan_99@mail.ru или иван@mail.ru"), "ivan_99@mail.ru");
    }

    #[test]
    fn missing_address_yields_placeholder() {
        assert_eq!(extract_emails("dance videos every friday"), MISSING_VALUE);
        assert_eq!(extract_emails(""), MISSING_VALUE);
    }

    #[test]
    fn row_falls_back_to_handle_and_placeholder_bio() {
        let follower = FollowerRecord {
            handle: "quiet.one".to_owned(),
            account_id: Some(AccountId("sec-1".to_owned())),
            display_name: "  ".to_owned(),
            follower_count: 42,
            biography: String::new(),
        };
        let stats =
            ViewStats { total_posts: 4, popular_posts: 2, max_views: 12_000, mean_views: 6_000 };

        let row = ResultRow::from_follower(&follower, stats, "https://www.tiktok.com/@");

        assert_eq!(row.display_name, "quiet.one");
        assert_eq!(row.biography, MISSING_VALUE);
        assert_eq!(row.email, MISSING_VALUE);
        assert_eq!(row.profile_url, "https://www.tiktok.com/@quiet.one");
        assert_eq!(row.popular_posts, 2);
    }
}
