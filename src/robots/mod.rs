//! Robots.txt handling module
//!
//! Used by the HTTP fetcher when `obey-robots` is enabled: disallowed URLs
//! are never requested and `Crawl-delay` widens the request spacing.

mod cache;
mod parser;

pub use cache::{fetch_robots, RobotsCache};
pub use parser::ParsedRobots;
