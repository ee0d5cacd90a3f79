use crate::extract::{Page, SiteRules};
use url::Url;

/// Product fields exactly as scraped
///
/// Nothing here is interpreted: `price_text` is the trimmed text of the
/// price element and `image_ref` may still be relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProductRecord {
    pub name: Option<String>,
    pub price_text: Option<String>,
    pub image_ref: Option<String>,
    pub source_url: String,
}

/// Runs every field's rule chain against a product page
///
/// Unlike [`extract_product`] this always returns a record, so callers can
/// see which fields were missing.
pub fn extract_fields(page: &Page, rules: &SiteRules, source_url: &Url) -> RawProductRecord {
    let document = page.document();

    RawProductRecord {
        name: rules.name.first_value(document),
        price_text: rules.price.first_value(document),
        image_ref: rules.image.first_value(document),
        source_url: source_url.to_string(),
    }
}

/// Extracts a product record from a product page
///
/// Returns `None` when no name rule matched: a product without a name is
/// not a product, and the caller reports the page as having no record.
pub fn extract_product(page: &Page, rules: &SiteRules, source_url: &Url) -> Option<RawProductRecord> {
    let record = extract_fields(page, rules, source_url);
    record.name.is_some().then_some(record)
}
