//! Output module for product records and crawl reports
//!
//! This module handles:
//! - Writing normalized product records (JSON array, JSON Lines, memory)
//! - Recording and printing crawl statistics

mod json;
mod memory;
pub mod stats;
mod traits;

pub use json::{JsonArraySink, JsonLinesSink};
pub use memory::MemorySink;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;

/// Opens the sink described by the output configuration
///
/// # Example
///
/// ```no_run
/// use shelfscan::config::{OutputConfig, OutputFormat};
/// use shelfscan::output::open_sink;
///
/// let config = OutputConfig {
///     path: "products.json".to_string(),
///     format: OutputFormat::Json,
///     overwrite: true,
/// };
/// let sink = open_sink(&config).unwrap();
/// ```
pub fn open_sink(config: &OutputConfig) -> OutputResult<Box<dyn RecordSink>> {
    let path = Path::new(&config.path);

    let sink: Box<dyn RecordSink> = match config.format {
        OutputFormat::Json => Box::new(JsonArraySink::create(path, config.overwrite)?),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::create(path, config.overwrite)?),
    };

    tracing::info!(
        path = %config.path,
        format = ?config.format,
        overwrite = config.overwrite,
        "Output sink ready"
    );

    Ok(sink)
}
