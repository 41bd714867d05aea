use anyhow::{Context, Result};
use chrono::Duration;
use common::{Config, FeedSummary};
use std::sync::Arc;
use tracing::info;

use crate::candidates;
use crate::favicon::{IconService, DEFAULT_ICON_SIZE};
use crate::fetcher::{FeedFetcher, HttpFeedFetcher, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::llm::remote::RemoteLlmProvider;
use crate::llm::{LlmProvider, TokenPricing};
use crate::validation::{FeedValidator, ValidationRules, DEFAULT_MAX_AGE_DAYS, DEFAULT_MIN_ITEMS};

/// Freshness window from the configured day count. Negative or
/// unrepresentable values are a configuration error.
pub fn max_age_from_days(days: i64) -> Result<Duration> {
    if days < 0 {
        anyhow::bail!("validation.max_age_days must not be negative, got {}", days);
    }
    Duration::try_days(days)
        .with_context(|| format!("validation.max_age_days is out of range: {}", days))
}

/// The per-request pipeline: generate candidates, then validate them.
///
/// Built once at startup and shared read-only between requests.
pub struct FeedFinder {
    llm: Arc<dyn LlmProvider>,
    validator: FeedValidator,
    pricing: TokenPricing,
}

impl FeedFinder {
    pub fn new(llm: Arc<dyn LlmProvider>, validator: FeedValidator, pricing: TokenPricing) -> Self {
        Self {
            llm,
            validator,
            pricing,
        }
    }

    /// Wire the production collaborators from configuration.
    /// Fails if the API key is missing or the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm_cfg = &config.llm;
        let api_key = config.api_key()?;
        let api_url = llm_cfg
            .api_url
            .clone()
            .unwrap_or_else(|| common::DEFAULT_LLM_URL.to_string());
        let model = llm_cfg
            .model
            .clone()
            .unwrap_or_else(|| common::DEFAULT_MODEL.to_string());

        let provider = RemoteLlmProvider::new(&api_url, api_key, &model).with_defaults(
            llm_cfg.timeout_seconds.unwrap_or(30),
            llm_cfg.max_tokens,
            llm_cfg.temperature.unwrap_or(0.2),
        );
        info!("LLM provider initialized: remote ({}) at {}", provider.model(), api_url);

        let defaults = TokenPricing::default();
        let pricing = TokenPricing {
            input_per_million: llm_cfg
                .input_cost_per_million
                .unwrap_or(defaults.input_per_million),
            output_per_million: llm_cfg
                .output_cost_per_million
                .unwrap_or(defaults.output_per_million),
        };

        let val_cfg = &config.validation;
        let fetcher = HttpFeedFetcher::new(
            val_cfg.fetch_timeout_seconds.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            val_cfg.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
        )
        .context("failed to initialize feed fetcher")?;

        let icons = IconService::new(
            config
                .icons
                .base_url
                .clone()
                .unwrap_or_else(|| common::DEFAULT_FAVICON_URL.to_string()),
            config.icons.size.unwrap_or(DEFAULT_ICON_SIZE),
        );

        let rules = ValidationRules {
            min_items: val_cfg.min_items.unwrap_or(DEFAULT_MIN_ITEMS),
            max_age: max_age_from_days(val_cfg.max_age_days.unwrap_or(DEFAULT_MAX_AGE_DAYS))?,
        };

        let fetcher: Arc<dyn FeedFetcher> = Arc::new(fetcher);
        Ok(Self::new(
            Arc::new(provider),
            FeedValidator::new(fetcher, icons, rules),
            pricing,
        ))
    }

    /// Run the whole pipeline for one query.
    ///
    /// Only candidate generation can fail; validation failures just shrink the result.
    pub async fn find_feeds(&self, query: &str) -> Result<Vec<FeedSummary>> {
        let urls = candidates::find_candidates(self.llm.as_ref(), query, &self.pricing).await?;
        let feeds = self.validator.validate(&urls).await;
        info!(
            query,
            candidates = urls.len(),
            validated = feeds.len(),
            "feed search finished"
        );
        Ok(feeds)
    }
}
