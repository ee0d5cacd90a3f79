//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the frontier, the sink and the statistics. It keeps up
//! to `workers` page tasks running on a [`JoinSet`]; each task fetches one page
//! and turns it into a [`PageOutcome`], and the coordinator alone applies that
//! outcome: links go back into the frontier, records go to the sink.
//!
//! The run ends when the frontier is empty and no task is in flight, or when
//! the cancellation token fires and the in-flight tasks have drained.

use crate::config::Config;
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::extract::{extract_links, extract_product, ExtractionError, Page, SiteRules};
use crate::normalize::{PriceNormalizer, PriceStatus};
use crate::output::{CrawlStatistics, RecordSink};
use crate::state::{NoRecordReason, PageKind, PageOutcome, PageState};
use crate::url::{is_on_site, normalize_url, resolve_link};
use crate::Result;
use chrono::Utc;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{self, AbortHandle, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Pages between two progress lines
const PROGRESS_INTERVAL: u64 = 25;

/// Main crawler coordinator structure
pub struct Coordinator<F, S> {
    fetcher: Arc<F>,
    sink: S,
    rules: Arc<SiteRules>,
    normalizer: Arc<PriceNormalizer>,
    frontier: Frontier,
    allowed_domains: Vec<String>,
    max_depth: Option<u32>,
    workers: usize,
    cancel: CancellationToken,
    stats: CrawlStatistics,
}

impl<F, S> Coordinator<F, S>
where
    F: Fetcher + 'static,
    S: RecordSink,
{
    /// Creates a coordinator with the seeds already in the frontier
    ///
    /// Fails if a seed is not a valid http(s) URL or a selector rule does not
    /// compile.
    pub fn new(config: &Config, fetcher: F, sink: S) -> Result<Self> {
        Self::build(config, fetcher, || Ok(sink))
    }

    /// Like [`new`](Self::new), but opens the sink only after the seeds and
    /// rules have been checked
    ///
    /// A configuration error then never touches the output file.
    pub fn build<O>(config: &Config, fetcher: F, open_sink: O) -> Result<Self>
    where
        O: FnOnce() -> Result<S>,
    {
        let rules = SiteRules::compile(&config.selectors)?;

        let seeds = config
            .seeds
            .iter()
            .map(|seed| normalize_url(seed))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            fetcher: Arc::new(fetcher),
            sink: open_sink()?,
            rules: Arc::new(rules),
            normalizer: Arc::new(PriceNormalizer::new(&config.price.currency_symbols)),
            frontier: Frontier::with_seeds(seeds),
            allowed_domains: config.crawler.allowed_domains.clone(),
            max_depth: config.crawler.max_depth,
            workers: config.crawler.workers.max(1) as usize,
            cancel: CancellationToken::new(),
            stats: CrawlStatistics::default(),
        })
    }

    /// Replaces the cancellation token, e.g. with a child of a shutdown token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Runs the crawl until the frontier is exhausted or the token is cancelled
    ///
    /// Per-page failures are counted in the returned statistics. Only a sink
    /// failure aborts the run.
    pub async fn run(&mut self) -> Result<CrawlStatistics> {
        let start_time = Instant::now();
        self.stats = CrawlStatistics {
            started_at: Some(Utc::now()),
            ..CrawlStatistics::default()
        };

        tracing::info!(
            seeds = self.frontier.len(),
            workers = self.workers,
            "Starting crawl"
        );

        let mut tasks: JoinSet<(FrontierEntry, PageOutcome)> = JoinSet::new();
        // Entries of running tasks, for reporting a task that panicked
        let mut in_flight: HashMap<task::Id, FrontierEntry> = HashMap::new();

        loop {
            while tasks.len() < self.workers && !self.cancel.is_cancelled() {
                let Some(entry) = self.frontier.next() else {
                    break;
                };
                let handle = self.spawn_page(&mut tasks, entry.clone());
                in_flight.insert(handle.id(), entry);
            }

            let Some(joined) = tasks.join_next_with_id().await else {
                break;
            };

            match joined {
                Ok((id, (entry, outcome))) => {
                    in_flight.remove(&id);
                    self.handle_outcome(entry, outcome)?;
                }
                Err(e) => {
                    let entry = in_flight.remove(&e.id());
                    self.handle_task_failure(entry.as_ref(), &e);
                }
            }

            if self.cancel.is_cancelled() && !self.stats.cancelled {
                self.stats.cancelled = true;
                tracing::info!(
                    in_flight = tasks.len(),
                    pending = self.frontier.len(),
                    "Cancellation requested, draining in-flight pages"
                );
            }

            let processed = self.stats.pages_processed();
            if processed % PROGRESS_INTERVAL == 0 {
                let rate = processed as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} pages processed, {} records, {} in frontier, {:.2} pages/sec",
                    processed,
                    self.stats.records_emitted,
                    self.frontier.len(),
                    rate
                );
            }
        }

        if self.cancel.is_cancelled() {
            self.stats.cancelled = true;
        } else {
            tracing::info!("Frontier is empty, crawl complete");
        }

        self.sink.finish()?;

        self.stats.duration = start_time.elapsed();
        self.stats.log_summary();

        Ok(self.stats.clone())
    }

    fn spawn_page(
        &self,
        tasks: &mut JoinSet<(FrontierEntry, PageOutcome)>,
        entry: FrontierEntry,
    ) -> AbortHandle {
        tracing::debug!(
            url = %entry.url,
            page_kind = %entry.page_kind,
            depth = entry.depth,
            "Dispatching page"
        );

        let fetcher = Arc::clone(&self.fetcher);
        let rules = Arc::clone(&self.rules);
        let normalizer = Arc::clone(&self.normalizer);

        tasks.spawn(async move {
            let outcome = process_entry(&*fetcher, rules, normalizer, &entry).await;
            (entry, outcome)
        })
    }

    /// Counts a page whose task panicked or was aborted
    fn handle_task_failure(&mut self, entry: Option<&FrontierEntry>, error: &JoinError) {
        self.stats.pages_failed += 1;
        self.stats.record_state(PageState::Failed);

        match entry {
            Some(entry) => tracing::error!(
                url = %entry.url,
                page_kind = %entry.page_kind,
                depth = entry.depth,
                "Page task failed: {}",
                error
            ),
            None => tracing::error!("Page task failed: {}", error),
        }
    }

    /// Applies one page's outcome to the frontier, sink and statistics
    fn handle_outcome(&mut self, entry: FrontierEntry, outcome: PageOutcome) -> Result<()> {
        let state = outcome.state(entry.page_kind);
        debug_assert!(PageState::Fetching.can_transition_to(state));
        self.stats.record_state(state);

        match outcome {
            PageOutcome::Listing { base_url, links } => {
                self.stats.pages_fetched += 1;
                self.stats.listing_pages += 1;
                tracing::debug!(
                    url = %entry.url,
                    products = links.product_links.len(),
                    has_next = links.next_page.is_some(),
                    "Listing page processed"
                );

                if !self.claim_final_url(&entry, base_url.as_str()) {
                    return Ok(());
                }

                let depth = entry.depth + 1;
                for href in &links.product_links {
                    self.enqueue_link(href, &base_url, PageKind::Product, depth);
                }
                if let Some(href) = &links.next_page {
                    self.enqueue_link(href, &base_url, PageKind::Listing, depth);
                }
            }

            PageOutcome::Record { record, price } => {
                self.stats.pages_fetched += 1;
                self.stats.product_pages += 1;
                if !self.claim_final_url(&entry, &record.source_url) {
                    return Ok(());
                }
                if price == PriceStatus::Unparseable {
                    self.stats.prices_unnormalized += 1;
                }

                tracing::debug!(
                    url = %record.source_url,
                    name = %record.name,
                    price = ?record.price,
                    "Product record extracted"
                );
                self.sink.emit(record)?;
                self.stats.records_emitted += 1;
            }

            PageOutcome::NoRecord { reason } => {
                self.stats.pages_fetched += 1;
                self.stats.product_pages += 1;
                match reason {
                    NoRecordReason::MissingName => self.stats.pages_without_name += 1,
                }
                tracing::warn!(
                    url = %entry.url,
                    page_kind = %entry.page_kind,
                    "Product page skipped: {}",
                    reason
                );
            }

            PageOutcome::Error { detail } => {
                self.stats.pages_fetched += 1;
                self.stats.extraction_errors += 1;
                tracing::warn!(
                    url = %entry.url,
                    page_kind = %entry.page_kind,
                    "Page could not be processed: {}",
                    detail
                );
            }

            PageOutcome::FetchFailed { error } => {
                self.stats.pages_failed += 1;
                tracing::warn!(
                    url = %entry.url,
                    page_kind = %entry.page_kind,
                    error = %error,
                    "Fetch failed"
                );
            }
        }

        Ok(())
    }

    /// Marks the post-redirect URL of a fetched page as visited
    ///
    /// Returns `false` if the page redirected to a URL this run has already
    /// seen; its links and record are then dropped.
    fn claim_final_url(&mut self, entry: &FrontierEntry, final_url: &str) -> bool {
        let Ok(final_url) = normalize_url(final_url) else {
            return true;
        };
        if final_url == entry.url || self.frontier.mark_visited(&final_url) {
            return true;
        }

        self.stats.redirect_duplicates += 1;
        tracing::debug!(
            url = %entry.url,
            final_url = %final_url,
            "Redirected to a page already visited"
        );
        false
    }

    /// Resolves a discovered link and adds it to the frontier if it passes the filters
    fn enqueue_link(&mut self, href: &str, base_url: &Url, page_kind: PageKind, depth: u32) {
        let url = match resolve_link(href, base_url) {
            Ok(url) => url,
            Err(e) => {
                self.stats.unfollowable_links += 1;
                tracing::debug!(base = %base_url, href = %href, "Skipping link: {}", e);
                return;
            }
        };

        if !is_on_site(&url, &self.allowed_domains) {
            self.stats.offsite_links += 1;
            tracing::debug!(url = %url, "Skipping off-site link");
            return;
        }

        // Only pagination is bounded; products on an allowed listing are always fetched
        if page_kind == PageKind::Listing && self.max_depth.is_some_and(|max| depth > max) {
            self.stats.depth_limited_links += 1;
            tracing::debug!(url = %url, depth, "Skipping link beyond max depth");
            return;
        }

        if self
            .frontier
            .enqueue(FrontierEntry::new(url.clone(), page_kind, depth))
        {
            self.stats.links_enqueued += 1;
            tracing::trace!(url = %url, page_kind = %page_kind, depth, "Enqueued");
        } else {
            self.stats.duplicate_links += 1;
            tracing::trace!(url = %url, "Already seen");
        }
    }
}

/// Fetches one entry and turns the response into an outcome
///
/// Parsing and selector evaluation run on the blocking pool so a large page
/// does not hold up other tasks' fetches.
async fn process_entry<F: Fetcher + ?Sized>(
    fetcher: &F,
    rules: Arc<SiteRules>,
    normalizer: Arc<PriceNormalizer>,
    entry: &FrontierEntry,
) -> PageOutcome {
    let fetched = match fetcher.fetch(&entry.url).await {
        Ok(fetched) => fetched,
        Err(error) => return PageOutcome::FetchFailed { error },
    };

    let page_kind = entry.page_kind;
    let parsed =
        task::spawn_blocking(move || dispatch_page(&rules, &normalizer, page_kind, fetched)).await;

    match parsed {
        Ok(outcome) => outcome,
        Err(e) => PageOutcome::Error {
            detail: format!("page processing did not finish: {}", e),
        },
    }
}

/// Parses a fetched page and runs the extractor for its kind
///
/// Runs synchronously: the parsed document never crosses an `.await`. A panic
/// inside the HTML parser or selector engine is contained here.
fn dispatch_page(
    rules: &SiteRules,
    normalizer: &PriceNormalizer,
    page_kind: PageKind,
    fetched: FetchedPage,
) -> PageOutcome {
    let url = fetched.final_url.to_string();

    let result = panic::catch_unwind(AssertUnwindSafe(
        || -> std::result::Result<PageOutcome, ExtractionError> {
            let page = Page::parse(fetched.final_url, &fetched.body)?;

            let outcome = match page_kind {
                PageKind::Listing => PageOutcome::Listing {
                    base_url: page.url().clone(),
                    links: extract_links(&page, rules),
                },
                PageKind::Product => match extract_product(&page, rules, page.url())
                    .and_then(|raw| normalizer.normalize_record(raw))
                {
                    Some((record, price)) => PageOutcome::Record { record, price },
                    None => PageOutcome::NoRecord {
                        reason: NoRecordReason::MissingName,
                    },
                },
            };

            Ok(outcome)
        },
    ));

    match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => PageOutcome::Error {
            detail: e.to_string(),
        },
        Err(payload) => {
            let error = ExtractionError::Panicked {
                url: url.clone(),
                message: panic_message(payload.as_ref()),
            };
            tracing::error!(url = %url, page_kind = %page_kind, "{}", error);
            PageOutcome::Error {
                detail: error.to_string(),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
