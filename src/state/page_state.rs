/// Page kind and state definitions for tracking crawl progress
///
/// Every frontier entry carries a [`PageKind`] fixed at discovery time and
/// moves through the [`PageState`] machine exactly once.
use std::fmt;

/// What the crawler expects to find on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// A page that links to products and/or the next listing page
    Listing,

    /// A page holding a single product
    Product,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Product => "product",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the current state of a frontier entry
///
/// `Pending -> Fetching -> {ListingProcessed, ProductProcessed, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Entry is queued in the frontier
    Pending,

    /// Entry has been dequeued and its page is being fetched
    Fetching,

    // ===== Terminal States =====
    /// Listing page was fetched and its links were extracted
    ListingProcessed,

    /// Product page was fetched and run through the product extractor
    ProductProcessed,

    /// Fetch failed, or the page could not be processed at all
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Fetching)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::ListingProcessed | Self::ProductProcessed)
    }

    /// The terminal state reached when a page of `kind` is processed
    pub fn processed(kind: PageKind) -> Self {
        match kind {
            PageKind::Listing => Self::ListingProcessed,
            PageKind::Product => Self::ProductProcessed,
        }
    }

    /// Checks whether the machine may move from `self` to `next`
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (
                    Self::Fetching,
                    Self::ListingProcessed | Self::ProductProcessed | Self::Failed
                )
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::ListingProcessed => "listing_processed",
            Self::ProductProcessed => "product_processed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
