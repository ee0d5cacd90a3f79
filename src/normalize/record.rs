use crate::extract::RawProductRecord;
use crate::normalize::{PriceError, PriceNormalizer, PriceStatus};
use serde::{Deserialize, Serialize};
use url::Url;

/// A product record with interpreted fields, as written to the sink
///
/// `price` is `None` when the page had no price or the text was not a
/// number; there is no sentinel value for "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProductRecord {
    pub name: String,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub source_url: String,
}

impl PriceNormalizer {
    /// Interprets a raw record
    ///
    /// Returns `None` for a record without a name; such a record never
    /// reaches the sink. The image reference is resolved against the
    /// record's source URL.
    pub fn normalize_record(
        &self,
        raw: RawProductRecord,
    ) -> Option<(NormalizedProductRecord, PriceStatus)> {
        let name = raw.name?;

        let (price, status) = match raw.price_text.as_deref().map(|text| self.parse_price(text)) {
            None | Some(Err(PriceError::Empty)) => (None, PriceStatus::Missing),
            Some(Ok(value)) => (Some(value), PriceStatus::Parsed),
            Some(Err(e)) => {
                tracing::warn!(url = %raw.source_url, product = %name, "{}", e);
                (None, PriceStatus::Unparseable)
            }
        };

        let image_url = raw
            .image_ref
            .as_deref()
            .and_then(|image_ref| resolve_image(image_ref, &raw.source_url));

        Some((
            NormalizedProductRecord {
                name,
                price,
                image_url,
                source_url: raw.source_url,
            },
            status,
        ))
    }
}

fn resolve_image(image_ref: &str, source_url: &str) -> Option<String> {
    match Url::parse(source_url).and_then(|base| base.join(image_ref)) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::debug!(
                url = %source_url,
                image = %image_ref,
                "Could not resolve image reference: {}",
                e
            );
            None
        }
    }
}
