use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use shelfscan::url::extract_domain;
///
/// let url = Url::parse("https://WWW.PNP.CO.ZA/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.pnp.co.za".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a host belongs to an allowed domain
///
/// An allowed domain matches itself and every subdomain, so `pnp.co.za`
/// admits `pnp.co.za` and `www.pnp.co.za` but not `notpnp.co.za`.
///
/// # Examples
///
/// ```
/// use shelfscan::url::matches_allowed_domain;
///
/// assert!(matches_allowed_domain("pnp.co.za", "pnp.co.za"));
/// assert!(matches_allowed_domain("pnp.co.za", "www.pnp.co.za"));
/// assert!(!matches_allowed_domain("pnp.co.za", "notpnp.co.za"));
/// ```
pub fn matches_allowed_domain(allowed: &str, host: &str) -> bool {
    let allowed = allowed.trim_start_matches("*.");
    host == allowed
        || (host.len() > allowed.len()
            && host.ends_with(allowed)
            && host.as_bytes()[host.len() - allowed.len() - 1] == b'.')
}

/// Checks whether a URL is on-site for the given allowed-domain list
///
/// An empty list places no restriction on the crawl.
pub fn is_on_site(url: &Url, allowed_domains: &[String]) -> bool {
    if allowed_domains.is_empty() {
        return true;
    }

    match extract_domain(url) {
        Some(host) => allowed_domains
            .iter()
            .any(|allowed| matches_allowed_domain(&allowed.to_lowercase(), &host)),
        None => false,
    }
}
