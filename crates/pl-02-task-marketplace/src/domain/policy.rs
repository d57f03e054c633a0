//! Deployment policy.
//!
//! [`MarketplacePolicy::drone`] is the inspection deployment: the owner posts
//! and only authorized drones bid. [`MarketplacePolicy::open`] lets any caller
//! post and bid. The barcode registry runs no marketplace of its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who may create tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingPolicy {
    /// Only the system owner posts tasks.
    #[default]
    OwnerOnly,
    /// Any caller posts tasks and may assign the ones it posted.
    AnyCaller,
}

impl fmt::Display for PostingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnerOnly => write!(f, "owner"),
            Self::AnyCaller => write!(f, "any"),
        }
    }
}

impl FromStr for PostingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" | "owner_only" => Ok(Self::OwnerOnly),
            "any" | "any_caller" => Ok(Self::AnyCaller),
            other => Err(format!("unknown posting policy '{other}'")),
        }
    }
}

/// Marketplace configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplacePolicy {
    /// Reject bids from callers that are not currently authorized actors.
    pub require_authorized_bidders: bool,
    /// Who may post tasks.
    pub posting: PostingPolicy,
}

impl Default for MarketplacePolicy {
    fn default() -> Self {
        Self::drone()
    }
}

impl MarketplacePolicy {
    /// Owner posts; only authorized drones bid.
    #[must_use]
    pub const fn drone() -> Self {
        Self {
            require_authorized_bidders: true,
            posting: PostingPolicy::OwnerOnly,
        }
    }

    /// Anyone posts and bids.
    #[must_use]
    pub const fn open() -> Self {
        Self {
            require_authorized_bidders: false,
            posting: PostingPolicy::AnyCaller,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_policy_parse() {
        assert_eq!("owner".parse::<PostingPolicy>(), Ok(PostingPolicy::OwnerOnly));
        assert_eq!(" ANY ".parse::<PostingPolicy>(), Ok(PostingPolicy::AnyCaller));
        assert!("everyone".parse::<PostingPolicy>().is_err());
    }

    #[test]
    fn test_default_is_drone_deployment() {
        let policy = MarketplacePolicy::default();
        assert!(policy.require_authorized_bidders);
        assert_eq!(policy.posting, PostingPolicy::OwnerOnly);
    }

    #[test]
    fn test_open_policy_admits_every_caller() {
        let policy = MarketplacePolicy::open();
        assert!(!policy.require_authorized_bidders);
        assert_eq!(policy.posting, PostingPolicy::AnyCaller);
    }
}
