use anyhow::Context;
use chrono::{DateTime, Utc};
use feed_rs::model::{Feed, Link};
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_USER_AGENT: &str = "feedfinder/0.1.0";

/// Ways a single feed fetch can fail.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connection, TLS or timeout failure
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx response
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Body is not RSS or Atom
    #[error("parse error: {0}")]
    Parse(String),
}

/// One entry of a fetched feed. Only what validation looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub published: Option<DateTime<Utc>>,
}

/// A fetched and parsed feed, items in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    /// The site link the feed declares for itself
    pub link: Option<String>,
    pub items: Vec<FeedItem>,
}

impl From<Feed> for ParsedFeed {
    fn from(feed: Feed) -> Self {
        let title = feed
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty());
        let link = site_link(&feed.links).map(|l| l.href.clone());

        // Published wins over updated, as Atom readers expect.
        let items = feed
            .entries
            .into_iter()
            .map(|e| FeedItem {
                published: e.published.or(e.updated),
            })
            .collect();

        ParsedFeed { title, link, items }
    }
}

/// The first link that points at the site rather than the feed itself.
fn site_link(links: &[Link]) -> Option<&Link> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
}

/// Parse raw RSS/Atom bytes.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, FetchError> {
    parser::parse(bytes)
        .map(ParsedFeed::from)
        .map_err(|e| FetchError::Parse(e.to_string()))
}

/// Source of parsed feeds. The HTTP implementation is used in production;
/// tests substitute in-memory ones.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, FetchError>;
}

/// Fetches feeds over HTTP with a shared client. No retries: a failed fetch
/// is final for the request that asked for it.
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout_secs: u64, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        parse_feed(bytes.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>  Example News </title>
    <link>https://www.example.com/</link>
    <description>News</description>
    <item>
      <title>Second</title>
      <pubDate>Tue, 13 Oct 2026 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>First</title>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <link rel="self" href="https://blog.example.org/atom.xml"/>
  <link href="https://blog.example.org/"/>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2026-10-12T18:30:02Z</updated>
  <entry>
    <title>Entry</title>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <published>2026-10-10T09:00:00Z</published>
    <updated>2026-10-12T18:30:02Z</updated>
  </entry>
  <entry>
    <title>Only updated</title>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6b</id>
    <updated>2026-10-01T00:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let feed = parse_feed(RSS.as_bytes()).expect("parse rss");
        assert_eq!(feed.title.as_deref(), Some("Example News"));
        assert_eq!(feed.link.as_deref(), Some("https://www.example.com/"));
        assert_eq!(feed.items.len(), 2);
        assert_eq!(
            feed.items[0].published,
            Some(Utc.with_ymd_and_hms(2026, 10, 13, 8, 0, 0).unwrap())
        );
        assert_eq!(feed.items[1].published, None);
    }

    #[test]
    fn test_parse_atom_prefers_site_link_and_published_date() {
        let feed = parse_feed(ATOM.as_bytes()).expect("parse atom");
        assert_eq!(feed.title.as_deref(), Some("Example Atom"));
        assert_eq!(feed.link.as_deref(), Some("https://blog.example.org/"));
        assert_eq!(
            feed.items[0].published,
            Some(Utc.with_ymd_and_hms(2026, 10, 10, 9, 0, 0).unwrap())
        );
        assert_eq!(
            feed.items[1].published,
            Some(Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_html_is_an_error() {
        let result = parse_feed(b"<html><body>Not a feed</body></html>");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_http_fetch_status_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing.xml")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFeedFetcher::new(5, DEFAULT_USER_AGENT).expect("client");
        let result = fetcher.fetch(&format!("{}/missing.xml", server.url())).await;

        assert!(matches!(result, Err(FetchError::HttpStatus(404))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_fetch_parses_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/feed.xml")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body(RSS)
            .create_async()
            .await;

        let fetcher = HttpFeedFetcher::new(5, DEFAULT_USER_AGENT).expect("client");
        let feed = fetcher
            .fetch(&format!("{}/feed.xml", server.url()))
            .await
            .expect("fetch");

        assert_eq!(feed.items.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_fetch_unreachable_host() {
        let fetcher = HttpFeedFetcher::new(2, DEFAULT_USER_AGENT).expect("client");
        let result = fetcher.fetch("http://127.0.0.1:1/feed.xml").await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_http_fetch_malformed_url() {
        let fetcher = HttpFeedFetcher::new(2, DEFAULT_USER_AGENT).expect("client");
        let result = fetcher.fetch("https://exa mple.com/feed").await;
        assert!(result.is_err());
    }
}
