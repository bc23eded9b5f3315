//! URL canonicalization for duplicate detection.
//!
//! Normalized URLs are compared, never displayed or stored: the store keeps
//! the raw URLs and derives normalized forms when building its dedup index.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Query parameters that only carry tracking state and never identity.
const TRACKING_PARAMS: [&str; 6] = ["t", "s", "utm_source", "utm_medium", "utm_campaign", "ref"];

/// Social posts are keyed by author + status id; the same post circulates
/// under both host aliases and arbitrary query strings.
fn social_post_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://(x\.com|twitter\.com)/([^/]+)/status/(\d+)").unwrap()
    })
}

/// Map a raw link to its canonical form for duplicate comparison.
///
/// Fail-open: anything that does not parse as an http(s) URL comes back
/// unchanged. Idempotent: `normalize(normalize(u)) == normalize(u)`.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return raw.to_string();
    }

    if let Some(caps) = social_post_re().captures(trimmed) {
        return format!("https://x.com/{}/{}", &caps[2], &caps[3]);
    }

    let parsed = match Url::parse(trimmed) {
        Ok(parsed) => parsed,
        Err(_) => return raw.to_string(),
    };
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return raw.to_string();
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        format!("{}{}", parsed.origin().ascii_serialization(), parsed.path())
    } else {
        let mut rebuilt = parsed;
        rebuilt
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(key, value)| (key.as_str(), value.as_str())));
        rebuilt.to_string()
    }
}

/// Normalize a list of URLs, dropping entries that come back empty.
pub fn normalize_all(urls: &[String]) -> Vec<String> {
    urls.iter()
        .map(|url| normalize(url))
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_social_post_collapse() {
        let canonical = "https://x.com/someuser/123456";
        assert_eq!(normalize("https://x.com/someuser/status/123456?s=20"), canonical);
        assert_eq!(
            normalize("https://twitter.com/someuser/status/123456?t=abc&utm_source=mail"),
            canonical
        );
        assert_eq!(normalize("HTTP://TWITTER.COM/someuser/status/123456"), canonical);
    }

    #[test]
    fn test_tracking_params_stripped() {
        assert_eq!(
            normalize("https://github.com/a/b?utm_source=x&ref=y"),
            "https://github.com/a/b"
        );
        assert_eq!(
            normalize("https://example.com/page?utm_medium=mail&utm_campaign=w12&t=1&s=2"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_meaningful_params_survive() {
        let normalized = normalize("https://example.com/watch?v=abc123&utm_source=mail");
        assert!(normalized.contains("v=abc123"));
        assert!(!normalized.contains("utm_source"));
    }

    #[test]
    fn test_unparseable_input_unchanged() {
        assert_eq!(normalize("not a url"), "not a url");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("mailto:someone@example.com"), "mailto:someone@example.com");
    }

    #[test]
    fn test_idempotence() {
        let inputs = [
            "https://x.com/user/status/42?s=20",
            "https://twitter.com/user/status/42",
            "https://github.com/a/b?utm_source=x&ref=y",
            "https://example.com/watch?v=abc&t=9",
            "https://example.com/plain/path",
            "not a url",
            "",
            "mailto:x@y.z",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_normalize_all_drops_empty() {
        let urls = vec![
            "https://github.com/a/b?ref=y".to_string(),
            "   ".to_string(),
            "https://x.com/u/status/7?s=1".to_string(),
        ];
        let normalized = normalize_all(&urls);
        assert_eq!(
            normalized,
            vec![
                "https://github.com/a/b".to_string(),
                "https://x.com/u/7".to_string(),
            ]
        );
    }
}
