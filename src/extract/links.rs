use crate::extract::{Page, SiteRules};

/// Links found on a listing page, as written in the document
///
/// Links are not resolved here; the coordinator resolves them against the
/// page URL before they reach the frontier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingLinks {
    /// Product page links in document order
    pub product_links: Vec<String>,

    /// The pagination link, if any
    pub next_page: Option<String>,
}

impl ListingLinks {
    pub fn is_empty(&self) -> bool {
        self.product_links.is_empty() && self.next_page.is_none()
    }
}

/// Extracts product links and the next-page link from a listing page
///
/// A page without products or without pagination is a normal outcome and
/// yields empty results, never an error.
///
/// # Example
///
/// ```
/// use shelfscan::config::SelectorConfig;
/// use shelfscan::extract::{extract_links, Page, SiteRules};
/// use url::Url;
///
/// let rules = SiteRules::compile(&SelectorConfig {
///     product_link: vec!["a.product-link::attr(href)".to_string()],
///     next_page: vec!["a.next-page::attr(href)".to_string()],
///     name: vec!["h1".to_string()],
///     price: vec![],
///     image: vec![],
/// })
/// .unwrap();
///
/// let html = r#"<a class="product-link" href="/p/1">Tea</a>
///               <a class="next-page" href="?page=2">Next</a>"#;
/// let page = Page::parse(Url::parse("https://shop.example.com/c/tea").unwrap(), html).unwrap();
///
/// let links = extract_links(&page, &rules);
/// assert_eq!(links.product_links, vec!["/p/1"]);
/// assert_eq!(links.next_page.as_deref(), Some("?page=2"));
/// ```
pub fn extract_links(page: &Page, rules: &SiteRules) -> ListingLinks {
    let document = page.document();

    ListingLinks {
        product_links: rules.product_link.all_values(document),
        next_page: rules.next_page.first_value(document),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use url::Url;

    fn rules() -> SiteRules {
        SiteRules::compile(&SelectorConfig {
            product_link: vec![
                "a.product-link::attr(href)".to_string(),
                ".product-grid a::attr(href)".to_string(),
            ],
            next_page: vec![
                "a.next-page::attr(href)".to_string(),
                "link[rel=next]::attr(href)".to_string(),
            ],
            name: vec!["h1".to_string()],
            price: vec![],
            image: vec![],
        })
        .unwrap()
    }

    fn page(html: &str) -> Page {
        Page::parse(Url::parse("https://shop.example.com/c/snacks").unwrap(), html).unwrap()
    }

    #[test]
    fn test_empty_listing_page() {
        let links = extract_links(&page("<html><body><p>No results</p></body></html>"), &rules());
        assert_eq!(links, ListingLinks::default());
        assert!(links.is_empty());
    }

    #[test]
    fn test_product_links_in_document_order() {
        let html = r#"
            <a class="product-link" href="/p/b">B</a>
            <a class="product-link" href="/p/a">A</a>
            <a class="product-link" href="   ">blank</a>
            <a class="product-link">no href</a>
        "#;
        let links = extract_links(&page(html), &rules());
        assert_eq!(links.product_links, vec!["/p/b", "/p/a"]);
        assert_eq!(links.next_page, None);
    }

    #[test]
    fn test_product_links_fall_back() {
        let html = r#"<div class="product-grid"><a href="/p/1">1</a><a href="/p/2">2</a></div>"#;
        let links = extract_links(&page(html), &rules());
        assert_eq!(links.product_links, vec!["/p/1", "/p/2"]);
    }

    #[test]
    fn test_first_next_page_link_wins() {
        let html = r#"
            <a class="next-page" href="?page=2">Next</a>
            <a class="next-page" href="?page=3">Next</a>
        "#;
        let links = extract_links(&page(html), &rules());
        assert_eq!(links.next_page.as_deref(), Some("?page=2"));
    }

    #[test]
    fn test_next_page_fallback_rule() {
        let html = r#"<html><head><link rel="next" href="/c/snacks?page=2"></head><body></body></html>"#;
        let links = extract_links(&page(html), &rules());
        assert_eq!(links.next_page.as_deref(), Some("/c/snacks?page=2"));
    }
}
