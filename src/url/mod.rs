//! URL handling module for Shelfscan
//!
//! This module provides URL normalization for the visited-set, link
//! resolution against the page a link was found on, and allowed-domain
//! matching for keeping the crawl on the retailer's site.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_on_site, matches_allowed_domain};
pub use normalize::{normalize_parsed, normalize_url, resolve_link};
