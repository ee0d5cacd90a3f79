//! Normalization module
//!
//! Interprets raw scraped strings: price text becomes a number and relative
//! image references become absolute URLs.

mod price;
mod record;

pub use price::{PriceError, PriceNormalizer, PriceStatus};
pub use record::NormalizedProductRecord;
