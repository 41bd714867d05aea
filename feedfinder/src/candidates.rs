//! Candidate generation: ask the text-generation service for feed URLs and
//! pull every URL-shaped substring out of its answer.

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

use crate::llm::{LlmProvider, LlmRequest, TokenPricing};

/// `http(s)://` up to the first whitespace, closing paren or double quote.
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s)"]+"#).expect("Invalid URL regex"));

/// Build the prompt sent to the model for a user query.
pub fn build_prompt(query: &str) -> String {
    format!(
        r#"You are an expert in locating real, valid RSS or Atom feeds.
Given the topic or website "{}", return only actual working feed URLs (XML format).
Do not include pages that list RSS links or redirect to HTML. Use well-known feeds when needed, like
WSJ: https://feeds.a.dj.com/rss/RSSWorldNews.xml
Return only direct feed links (one per line). No markdown, no commentary."#,
        query
    )
}

/// Extract every absolute http(s) URL from free text, in order of appearance.
/// Duplicates are kept.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Ask the provider for feed URLs matching `query`.
///
/// Sampling temperature is left to the provider's configured default.
/// Token usage and an estimated cost are logged when the provider reports them.
/// Any provider error is returned as-is; there is no retry.
pub async fn find_candidates<P: LlmProvider + ?Sized>(
    provider: &P,
    query: &str,
    pricing: &TokenPricing,
) -> Result<Vec<String>> {
    let request = LlmRequest {
        prompt: build_prompt(query),
        max_tokens: None,
        temperature: None,
        timeout_seconds: None,
    };

    let response = provider
        .generate(request)
        .await
        .context("feed candidate generation failed")?;

    if let Some(usage) = &response.usage {
        info!(
            model = %response.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            estimated_cost = %format!("${:.8}", usage.estimated_cost(pricing)),
            "LLM usage"
        );
    }

    let urls = extract_urls(response.content.trim());
    info!(query, candidates = urls.len(), "candidate feed URLs generated");
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmResponse, UsageMetadata};
    use std::sync::Mutex;

    struct CannedProvider {
        content: String,
        prompts: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmProvider for CannedProvider {
        async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
            self.prompts.lock().unwrap().push(request);
            Ok(LlmResponse {
                content: self.content.clone(),
                usage: Some(UsageMetadata {
                    prompt_tokens: 120,
                    completion_tokens: 40,
                    total_tokens: 160,
                }),
                model: "gpt-4o-mini".to_string(),
            })
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl LlmProvider for FailingProvider {
        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse> {
            anyhow::bail!("LLM API error 500 Internal Server Error: boom")
        }
    }

    #[test]
    fn test_extract_urls_one_per_line() {
        let text = "https://a.example/feed.xml\nhttp://b.example/rss\n";
        assert_eq!(
            extract_urls(text),
            vec!["https://a.example/feed.xml", "http://b.example/rss"]
        );
    }

    #[test]
    fn test_extract_urls_stops_at_paren_quote_and_whitespace() {
        let text = r#"- [WSJ](https://feeds.a.dj.com/rss/RSSWorldNews.xml) and "https://x.example/atom" https://y.example/a b"#;
        assert_eq!(
            extract_urls(text),
            vec![
                "https://feeds.a.dj.com/rss/RSSWorldNews.xml",
                "https://x.example/atom",
                "https://y.example/a",
            ]
        );
    }

    #[test]
    fn test_extract_urls_keeps_duplicates_and_ignores_other_schemes() {
        let text = "ftp://nope.example/feed https://dup.example/f https://dup.example/f";
        assert_eq!(
            extract_urls(text),
            vec!["https://dup.example/f", "https://dup.example/f"]
        );
    }

    #[test]
    fn test_extract_urls_empty_text() {
        assert!(extract_urls("I could not find any feeds.").is_empty());
    }

    #[test]
    fn test_prompt_embeds_query() {
        let prompt = build_prompt("rust blogs");
        assert!(prompt.contains("\"rust blogs\""));
        assert!(prompt.contains("one per line"));
    }

    #[tokio::test]
    async fn test_find_candidates_defers_temperature_to_provider() {
        let provider = CannedProvider {
            content: "  https://blog.rust-lang.org/feed.xml\nhttps://this-week-in-rust.org/rss.xml  "
                .to_string(),
            prompts: Mutex::new(Vec::new()),
        };

        let urls = find_candidates(&provider, "rust", &TokenPricing::default())
            .await
            .expect("candidates");

        assert_eq!(
            urls,
            vec![
                "https://blog.rust-lang.org/feed.xml",
                "https://this-week-in-rust.org/rss.xml"
            ]
        );
        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].temperature, None);
        assert!(prompts[0].prompt.contains("\"rust\""));
    }

    #[tokio::test]
    async fn test_find_candidates_propagates_provider_error() {
        let result = find_candidates(&FailingProvider, "rust", &TokenPricing::default()).await;
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("500"));
    }
}
