use serde::Deserialize;

/// Main configuration structure for Shelfscan
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listing pages the crawl starts from
    pub seeds: Vec<String>,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub price: PriceConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched and processed at the same time
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Domains the crawl may visit (subdomains included); empty means any
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,

    /// Maximum pagination depth from a seed page; unlimited when absent
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum time between the start of two requests (milliseconds)
    #[serde(rename = "request-delay-ms", default)]
    pub request_delay_ms: u64,

    /// Retries for server errors and timeouts
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retries (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Whether robots.txt is consulted before each request
    #[serde(rename = "obey-robots", default = "default_obey_robots")]
    pub obey_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            allowed_domains: Vec::new(),
            max_depth: None,
            request_timeout_secs: default_request_timeout_secs(),
            request_delay_ms: 0,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            obey_robots: default_obey_robots(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Serialization format of the product file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON array holding every record
    Json,
    /// One JSON object per line
    Jsonl,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the product file
    #[serde(default = "default_output_path")]
    pub path: String,

    #[serde(default = "default_output_format")]
    pub format: OutputFormat,

    /// Replace the file instead of adding to it
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: default_output_format(),
            overwrite: default_overwrite(),
        }
    }
}

/// Ordered selector rules per field, primary rule first
///
/// Each rule is `<css>`, `<css>::text` or `<css>::attr(<name>)`.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    #[serde(rename = "product-link")]
    pub product_link: Vec<String>,

    #[serde(rename = "next-page", default)]
    pub next_page: Vec<String>,

    pub name: Vec<String>,

    #[serde(default)]
    pub price: Vec<String>,

    #[serde(default)]
    pub image: Vec<String>,
}

/// Price normalization configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PriceConfig {
    /// Currency markers stripped from price text
    #[serde(rename = "currency-symbols", default = "default_currency_symbols")]
    pub currency_symbols: Vec<String>,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            currency_symbols: default_currency_symbols(),
        }
    }
}

fn default_workers() -> u32 {
    4
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_obey_robots() -> bool {
    true
}

fn default_output_path() -> String {
    "products.json".to_string()
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Json
}

fn default_overwrite() -> bool {
    true
}

fn default_currency_symbols() -> Vec<String> {
    vec!["R".to_string(), "ZAR".to_string()]
}
