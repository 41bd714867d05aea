use url::Url;

pub const DEFAULT_ICON_SIZE: u32 = 128;

/// Builds favicon URLs for a public lookup service. Nothing is fetched; the
/// URL is handed to clients as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconService {
    base_url: String,
    size: u32,
}

impl Default for IconService {
    fn default() -> Self {
        Self::new(common::DEFAULT_FAVICON_URL, DEFAULT_ICON_SIZE)
    }
}

impl IconService {
    pub fn new(base_url: impl Into<String>, size: u32) -> Self {
        Self {
            base_url: base_url.into(),
            size,
        }
    }

    pub fn icon_url(&self, host: &str) -> String {
        format!("{}?domain={}&sz={}", self.base_url, host, self.size)
    }
}

/// Hostname of an absolute URL, if it parses and has one.
pub fn link_host(link: &str) -> Option<String> {
    Url::parse(link.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_icon_url() {
        let icons = IconService::default();
        assert_eq!(
            icons.icon_url("www.wsj.com"),
            "https://www.google.com/s2/favicons?domain=www.wsj.com&sz=128"
        );
    }

    #[test]
    fn test_custom_service() {
        let icons = IconService::new("https://icons.example/lookup", 64);
        assert_eq!(
            icons.icon_url("example.com"),
            "https://icons.example/lookup?domain=example.com&sz=64"
        );
    }

    #[test]
    fn test_link_host() {
        assert_eq!(
            link_host("https://www.example.com/news/"),
            Some("www.example.com".to_string())
        );
        assert_eq!(
            link_host("http://localhost:8080/"),
            Some("localhost".to_string())
        );
        assert_eq!(link_host("/relative/path"), None);
        assert_eq!(link_host("not a url"), None);
        assert_eq!(link_host("mailto:someone@example.com"), None);
    }
}
