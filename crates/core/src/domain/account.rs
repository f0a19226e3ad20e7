use std::fmt;

use serde::{Deserialize, Serialize};

/// Public username on the target platform, normalized for lookups.
///
/// Normalization strips every `@` and whitespace character and lowercases the
/// rest, so `" @Some.User "` and `"some.user"` name the same account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetHandle(String);

impl TargetHandle {
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|ch| *ch != '@' && !ch.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque platform identifier (`secUid`) required by follower and post queries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::TargetHandle;

    #[test]
    fn parse_strips_at_signs_and_whitespace_and_lowercases() {
        let handle = TargetHandle::parse(" @Some.User\t").expect("handle");
        assert_eq!(handle.as_str(), "some.user");
    }

    #[test]
    fn parse_rejects_blank_input() {
        assert!(TargetHandle::parse("").is_none());
        assert!(TargetHandle::parse(" @ ").is_none());
    }
}
