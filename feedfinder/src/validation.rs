//! Feed validation: turn untrusted candidate URLs into confirmed, active feeds.
//!
//! Every candidate is checked independently and concurrently. A candidate that
//! fails any check is logged and dropped; it never fails the batch.

use chrono::{DateTime, Duration, Utc};
use common::FeedSummary;
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::favicon::{link_host, IconService};
use crate::fetcher::{FeedFetcher, FetchError, ParsedFeed};

pub const DEFAULT_MIN_ITEMS: usize = 2;
pub const DEFAULT_MAX_AGE_DAYS: i64 = 14;

/// Why a candidate was dropped.
#[derive(Debug, Error)]
pub enum DiscardReason {
    #[error("could not fetch feed: {0}")]
    Fetch(#[from] FetchError),
    #[error("feed has {found} items, at least {required} required")]
    TooFewItems { found: usize, required: usize },
    #[error("latest item has no publication date")]
    MissingDate,
    #[error("latest item published {published}, older than cutoff {cutoff}")]
    Stale {
        published: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    },
    #[error("feed declares no site link")]
    MissingLink,
    #[error("feed link is not an absolute URL with a host: {0}")]
    InvalidLink(String),
}

/// Result of checking one candidate.
#[derive(Debug)]
pub enum Outcome {
    Accepted(FeedSummary),
    Discarded {
        candidate: String,
        reason: DiscardReason,
    },
}

/// Activity and freshness thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub min_items: usize,
    pub max_age: Duration,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_items: DEFAULT_MIN_ITEMS,
            max_age: Duration::days(DEFAULT_MAX_AGE_DAYS),
        }
    }
}

pub struct FeedValidator {
    fetcher: Arc<dyn FeedFetcher>,
    icons: IconService,
    rules: ValidationRules,
}

impl FeedValidator {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, icons: IconService, rules: ValidationRules) -> Self {
        Self {
            fetcher,
            icons,
            rules,
        }
    }

    /// Validate all candidates against the current time.
    pub async fn validate(&self, candidates: &[String]) -> Vec<FeedSummary> {
        self.validate_at(candidates, Utc::now()).await
    }

    /// Validate all candidates concurrently and return the survivors.
    ///
    /// Returns only after every candidate has finished. Order of the result is
    /// not meaningful. Duplicated candidates are checked (and may be returned)
    /// once per occurrence.
    pub async fn validate_at(&self, candidates: &[String], now: DateTime<Utc>) -> Vec<FeedSummary> {
        let outcomes = join_all(
            candidates
                .iter()
                .map(|candidate| self.check_candidate(candidate, now)),
        )
        .await;

        outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Outcome::Accepted(summary) => Some(summary),
                Outcome::Discarded { candidate, reason } => {
                    warn!(url = %candidate, %reason, "could not parse feed from candidate");
                    None
                }
            })
            .collect()
    }

    /// Fetch and evaluate a single candidate.
    pub async fn check_candidate(&self, candidate: &str, now: DateTime<Utc>) -> Outcome {
        let result = match self.fetcher.fetch(candidate).await {
            Ok(feed) => self.evaluate(candidate, &feed, now),
            Err(e) => Err(DiscardReason::from(e)),
        };

        match result {
            Ok(summary) => {
                debug!(url = candidate, title = %summary.title, "feed accepted");
                Outcome::Accepted(summary)
            }
            Err(reason) => Outcome::Discarded {
                candidate: candidate.to_string(),
                reason,
            },
        }
    }

    /// Apply the activity, freshness and link checks to an already parsed feed.
    pub fn evaluate(
        &self,
        candidate: &str,
        feed: &ParsedFeed,
        now: DateTime<Utc>,
    ) -> Result<FeedSummary, DiscardReason> {
        if feed.items.len() < self.rules.min_items {
            return Err(DiscardReason::TooFewItems {
                found: feed.items.len(),
                required: self.rules.min_items,
            });
        }

        // Feeds list newest first; the first item stands in for the latest.
        let published = feed
            .items
            .first()
            .and_then(|item| item.published)
            .ok_or(DiscardReason::MissingDate)?;

        // A window reaching past the earliest representable instant accepts any date.
        let cutoff = now
            .checked_sub_signed(self.rules.max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        if published < cutoff {
            return Err(DiscardReason::Stale { published, cutoff });
        }

        let link = feed.link.as_deref().ok_or(DiscardReason::MissingLink)?;
        let host = link_host(link).ok_or_else(|| DiscardReason::InvalidLink(link.to_string()))?;

        let title = feed.title.clone().unwrap_or_else(|| host.clone());

        Ok(FeedSummary {
            title,
            rss_url: candidate.to_string(),
            icon: self.icons.icon_url(&host),
        })
    }
}
