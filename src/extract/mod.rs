//! Extraction module
//!
//! Pure functions over a parsed [`Page`]:
//! - [`extract_links`] for listing pages (product links and pagination)
//! - [`extract_product`] for product pages (name, price text, image reference)
//!
//! Both are driven by the ordered rule chains in [`SiteRules`].

mod links;
mod page;
mod product;
mod rules;

pub use links::{extract_links, ListingLinks};
pub use page::{ExtractionError, Page};
pub use product::{extract_fields, extract_product, RawProductRecord};
pub use rules::{ExtractionRule, RuleChain, RuleTarget, SiteRules};
