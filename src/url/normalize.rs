use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameters that only carry tracking data and never change the page
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL so that equivalent links share one visited-set key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Lowercase the host (the `url` crate already drops default ports and
///    resolves dot segments while parsing)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters and sort the remaining ones
/// 6. Remove an empty query string
///
/// # Examples
///
/// ```
/// use shelfscan::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Shop.COM:443/p/1?b=2&a=1#reviews").unwrap();
/// assert_eq!(url.as_str(), "https://www.shop.com/p/1?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Normalizes an already parsed URL
pub fn normalize_parsed(mut url: Url) -> UrlResult<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Resolves a link as written in a page against the page's URL
///
/// Links that can never be fetched are rejected:
/// - empty hrefs and fragment-only links (same page anchors)
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - anything that resolves to a non-HTTP(S) URL
///
/// The resolved URL is normalized with [`normalize_parsed`].
///
/// # Examples
///
/// ```
/// use shelfscan::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example.com/c/snacks?page=1").unwrap();
/// let url = resolve_link("../p/chips-125g", &base).unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/p/chips-125g");
/// ```
pub fn resolve_link(href: &str, base: &Url) -> UrlResult<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Err(UrlError::Unfollowable(href.to_string()));
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return Err(UrlError::Unfollowable(href.to_string()));
    }

    let joined = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    normalize_parsed(joined)
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://shop.example.com/c/snacks").unwrap()
    }

    #[test]
    fn test_lowercase_host() {
        let result = normalize_url("https://SHOP.Example.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://shop.example.com/Page");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_default_port_dropped() {
        let result = normalize_url("http://example.com:80/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_keeps_http_scheme() {
        let result = normalize_url("http://127.0.0.1:8080/list").unwrap();
        assert_eq!(result.as_str(), "http://127.0.0.1:8080/list");
    }

    #[test]
    fn test_sort_query_params() {
        let result = normalize_url("https://example.com/page?b=2&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?a=1&b=2");
    }

    #[test]
    fn test_remove_tracking_params() {
        let result =
            normalize_url("https://example.com/p?utm_source=mail&fbclid=x&page=2").unwrap();
        assert_eq!(result.as_str(), "https://example.com/p?page=2");

        let result = normalize_url("https://example.com/p?utm_campaign=x").unwrap();
        assert_eq!(result.as_str(), "https://example.com/p");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(normalize_url("not a url"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_resolve_relative_link() {
        let url = resolve_link("/p/chips", &base()).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/p/chips");

        let url = resolve_link("chips", &base()).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/c/chips");
    }

    #[test]
    fn test_resolve_absolute_link() {
        let url = resolve_link("https://other.example.org/x#top", &base()).unwrap();
        assert_eq!(url.as_str(), "https://other.example.org/x");
    }

    #[test]
    fn test_resolve_query_only_link() {
        let url = resolve_link("?page=3", &base()).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/c/snacks?page=3");
    }

    #[test]
    fn test_resolve_rejects_unfollowable() {
        for href in [
            "",
            "   ",
            "#reviews",
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:help@example.com",
            "tel:+27110000000",
            "data:text/html,hi",
        ] {
            assert!(
                matches!(resolve_link(href, &base()), Err(UrlError::Unfollowable(_))),
                "expected {:?} to be rejected",
                href
            );
        }
    }
}
