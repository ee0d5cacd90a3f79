//! Per-page outcome of one frontier entry
//!
//! A page task never returns an error to the coordinator; everything that can
//! happen to a single page is one of these variants.

use crate::crawler::FetchError;
use crate::extract::ListingLinks;
use crate::normalize::{NormalizedProductRecord, PriceStatus};
use crate::state::{PageKind, PageState};
use url::Url;

/// Why a product page produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoRecordReason {
    /// None of the name rules matched
    MissingName,
}

impl std::fmt::Display for NoRecordReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => f.write_str("no product name found"),
        }
    }
}

/// Result of processing one page
#[derive(Debug)]
pub enum PageOutcome {
    /// Links found on a listing page, still as written in the document
    Listing {
        /// URL the links resolve against (after redirects)
        base_url: Url,
        links: ListingLinks,
    },

    /// A product record ready for the sink
    Record {
        record: NormalizedProductRecord,
        price: PriceStatus,
    },

    /// A product page with no extractable product
    NoRecord { reason: NoRecordReason },

    /// The page was fetched but could not be processed
    Error { detail: String },

    /// The fetch layer gave up on the page
    FetchFailed { error: FetchError },
}

impl PageOutcome {
    /// The terminal state this outcome moves its entry to
    pub fn state(&self, kind: PageKind) -> PageState {
        match self {
            Self::Listing { .. } | Self::Record { .. } | Self::NoRecord { .. } => {
                PageState::processed(kind)
            }
            Self::Error { .. } | Self::FetchFailed { .. } => PageState::Failed,
        }
    }
}
