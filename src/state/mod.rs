//! State tracking module
//!
//! This module defines the page kinds, the per-entry state machine and the
//! per-page outcome type the crawler works with.

pub mod outcome;
pub mod page_state;

pub use outcome::{NoRecordReason, PageOutcome};
pub use page_state::{PageKind, PageState};
