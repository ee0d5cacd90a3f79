//! Crawl frontier
//!
//! Pending pages live in a priority queue and every URL ever accepted lives in
//! the visited set. The coordinator is the only owner, so no locking is needed:
//! page tasks report their discoveries back and the coordinator enqueues them.

use crate::state::PageKind;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use url::Url;

/// A page waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub page_kind: PageKind,
    /// Link hops from a seed (seeds are depth 0)
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: Url, page_kind: PageKind, depth: u32) -> Self {
        Self {
            url,
            page_kind,
            depth,
        }
    }

    /// Lower values are fetched first
    fn priority(&self) -> u8 {
        match self.page_kind {
            PageKind::Product => 0,
            PageKind::Listing => 1,
        }
    }
}

/// Heap slot; `seq` keeps insertion order among equal priorities
#[derive(Debug)]
struct Queued {
    entry: FrontierEntry,
    seq: u64,
}

// BinaryHeap is a max-heap, so both keys are compared in reverse
impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .entry
            .priority()
            .cmp(&self.entry.priority())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Queued {}

/// Pending pages plus the set of URLs already accepted
///
/// A URL is enqueued at most once per run, whatever its page kind. Products
/// are handed out before listings so records reach the sink early.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: BinaryHeap<Queued>,
    visited: HashSet<String>,
    next_seq: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier holding the seeds as depth-0 listing pages
    pub fn with_seeds(seeds: impl IntoIterator<Item = Url>) -> Self {
        let mut frontier = Self::new();
        for url in seeds {
            frontier.enqueue(FrontierEntry::new(url, PageKind::Listing, 0));
        }
        frontier
    }

    /// Adds a page unless its URL was seen before
    ///
    /// Returns `false` for duplicates.
    pub fn enqueue(&mut self, entry: FrontierEntry) -> bool {
        if !self.visited.insert(entry.url.as_str().to_string()) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Queued { entry, seq });
        true
    }

    /// Takes the next page to fetch
    pub fn next(&mut self) -> Option<FrontierEntry> {
        self.queue.pop().map(|queued| queued.entry)
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Records a URL as seen without queueing it
    ///
    /// Used for redirect targets. Returns `false` if the URL was already seen.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.as_str().to_string())
    }

    /// Number of pages still waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct URLs accepted so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
