//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end through the real HTTP fetcher and file sinks.

use shelfscan::config::{parse_config, Config};
use shelfscan::crawler::{crawl, Coordinator, FetchError, Fetcher, HttpFetcher};
use shelfscan::output::MemorySink;
use shelfscan::NormalizedProductRecord;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `seed` and writing to `output`
fn create_test_config(seed: &str, output: &Path, format: &str, overwrite: bool) -> Config {
    let toml = format!(
        r#"
seeds = ["{seed}"]

[crawler]
workers = 4
request-timeout-secs = 5
max-retries = 2
retry-delay-ms = 10
obey-robots = true

[user-agent]
crawler-name = "shelfscan-test"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
path = '{output}'
format = "{format}"
overwrite = {overwrite}

[selectors]
product-link = ["a.product-link::attr(href)"]
next-page = ["a.next-page::attr(href)"]
name = ["h1.product-name::text", "h1::text"]
price = ["span.product-price::text", ".price::text"]
image = ["img.product-image::attr(src)", "img::attr(src)"]

[price]
currency-symbols = ["R", "ZAR"]
"#,
        seed = seed,
        output = output.display(),
        format = format,
        overwrite = overwrite,
    );

    parse_config(&toml).expect("test config should be valid")
}

fn listing(products: &[&str], next: Option<&str>) -> String {
    let mut body = String::from("<html><head><title>Groceries</title></head><body><ul>");
    for href in products {
        body.push_str(&format!(
            r#"<li><a class="product-link" href="{}">item</a></li>"#,
            href
        ));
    }
    body.push_str("</ul>");
    if let Some(href) = next {
        body.push_str(&format!(r#"<a class="next-page" href="{}">Next</a>"#, href));
    }
    body.push_str("</body></html>");
    body
}

fn product(name: &str, price: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="product-name">{}</h1>
            <span class="product-price">{}</span>
            <img class="product-image" src="/images/{}.jpg">
        </body></html>"#,
        name,
        price,
        name.to_lowercase().replace(' ', "-")
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

fn read_json_records(path: &Path) -> Vec<NormalizedProductRecord> {
    let content = std::fs::read_to_string(path).expect("output file should exist");
    serde_json::from_str(&content).expect("output should be a JSON array")
}

#[tokio::test]
async fn test_full_crawl_to_json_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("products.json");

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /p/restricted"),
        )
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/",
        listing(&["/p/1", "/p/2", "/p/restricted"], Some("/page/2")),
    )
    .await;
    mount_page(
        &mock_server,
        "/page/2",
        listing(&["/p/3", "/p/1"], Some("/")),
    )
    .await;
    mount_page(&mock_server, "/p/1", product("Rooibos Tea", "R 42,99")).await;
    mount_page(&mock_server, "/p/2", product("Maize Meal", "R1 234,56")).await;
    mount_page(&mock_server, "/p/3", product("Fresh Milk", "Call for price")).await;

    // Disallowed by robots.txt, so never requested
    Mock::given(method("GET"))
        .and(path("/p/restricted"))
        .respond_with(html(product("Hidden", "R 1")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", base_url), &output, "json", true);
    let stats = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(stats.records_emitted, 3);
    assert_eq!(stats.listing_pages, 2);
    assert_eq!(stats.product_pages, 3);
    assert_eq!(stats.pages_failed, 1);
    assert_eq!(stats.prices_unnormalized, 1);
    assert!(!stats.cancelled);

    let mut records = read_json_records(&output);
    records.sort_by(|a, b| a.source_url.cmp(&b.source_url));
    assert_eq!(records.len(), 3);

    assert_eq!(records[0].name, "Rooibos Tea");
    assert_eq!(records[0].price, Some(42.99));
    assert_eq!(records[0].source_url, format!("{}/p/1", base_url));
    assert_eq!(
        records[0].image_url.as_deref(),
        Some(format!("{}/images/rooibos-tea.jpg", base_url).as_str())
    );

    assert_eq!(records[1].name, "Maize Meal");
    assert_eq!(records[1].price, Some(1234.56));

    assert_eq!(records[2].name, "Fresh Milk");
    assert_eq!(records[2].price, None);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/", listing(&["/p/flaky"], None)).await;

    Mock::given(method("GET"))
        .and(path("/p/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/p/flaky", product("Rusks", "R 59.99")).await;

    let config = create_test_config(
        &format!("{}/", base_url),
        &temp_dir.path().join("products.json"),
        "json",
        true,
    );
    let fetcher = HttpFetcher::new(&config).unwrap();
    let mut coordinator = Coordinator::new(&config, fetcher, MemorySink::new()).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.pages_failed, 0);
    assert_eq!(coordinator.sink().records().len(), 1);
    assert_eq!(coordinator.sink().records()[0].price, Some(59.99));
}

#[tokio::test]
async fn test_failed_pages_do_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        listing(&["/p/gone", "/p/feed", "/p/ok"], None),
    )
    .await;

    // Client errors are not retried
    Mock::given(method("GET"))
        .and(path("/p/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"name":"x"}"#, "application/json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/p/ok", product("Rooibos Tea", "R 42,99")).await;

    let config = create_test_config(
        &format!("{}/", base_url),
        &temp_dir.path().join("products.json"),
        "json",
        true,
    );
    let fetcher = HttpFetcher::new(&config).unwrap();
    let mut coordinator = Coordinator::new(&config, fetcher, MemorySink::new()).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.pages_failed, 2);
    assert_eq!(stats.records_emitted, 1);
    assert_eq!(stats.pages_fetched, 2);
}

#[tokio::test]
async fn test_offsite_links_not_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        listing(
            &["/p/1", "https://partner.example.org/p/2", "mailto:sales@example.com"],
            None,
        ),
    )
    .await;
    mount_page(&mock_server, "/p/1", product("Rooibos Tea", "R 42,99")).await;

    let mut config = create_test_config(
        &format!("{}/", base_url),
        &temp_dir.path().join("products.json"),
        "json",
        true,
    );
    config.crawler.allowed_domains = vec!["127.0.0.1".to_string()];

    let fetcher = HttpFetcher::new(&config).unwrap();
    let mut coordinator = Coordinator::new(&config, fetcher, MemorySink::new()).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.records_emitted, 1);
    assert_eq!(stats.offsite_links, 1);
    assert_eq!(stats.unfollowable_links, 1);
}

#[tokio::test]
async fn test_jsonl_output_appends_across_runs() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("products.jsonl");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing(&["/p/1"], None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(html(product("Rooibos Tea", "R 42,99")))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", base_url), &output, "jsonl", false);
    crawl(&config, CancellationToken::new()).await.unwrap();
    crawl(&config, CancellationToken::new()).await.unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    let records: Vec<NormalizedProductRecord> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.name == "Rooibos Tea"));
}

#[tokio::test]
async fn test_json_output_appends_across_runs() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("products.json");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing(&["/p/1"], None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(html(product("Rooibos Tea", "R 42,99")))
        .mount(&mock_server)
        .await;

    let first = create_test_config(&format!("{}/", base_url), &output, "json", true);
    crawl(&first, CancellationToken::new()).await.unwrap();
    let append = create_test_config(&format!("{}/", base_url), &output, "json", false);
    crawl(&append, CancellationToken::new()).await.unwrap();

    let records = read_json_records(&output);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.name == "Rooibos Tea"));
}

#[tokio::test]
async fn test_failed_run_leaves_existing_array_intact() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("products.json");
    let existing = r#"[{"name":"Rooibos Tea","price":42.99,"image_url":null,"source_url":"https://shop.example.com/p/1"}]"#;
    std::fs::write(&output, existing).unwrap();

    let mut config = create_test_config("https://shop.example.com/", &output, "json", false);
    config.seeds = vec!["ftp://shop.example.com/".to_string()];

    let result = crawl(&config, CancellationToken::new()).await;

    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&output).unwrap(), existing);
    assert_eq!(read_json_records(&output).len(), 1);
    assert!(!temp_dir.path().join("products.json.partial").exists());
}

#[tokio::test]
async fn test_cancelled_crawl_writes_empty_array() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("products.json");

    Mock::given(method("GET"))
        .respond_with(html(listing(&["/p/1"], None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", base_url), &output, "json", true);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let stats = crawl(&config, cancel).await.unwrap();

    assert!(stats.cancelled);
    assert_eq!(stats.pages_processed(), 0);
    assert!(read_json_records(&output).is_empty());
}

#[tokio::test]
async fn test_http_fetcher_reports_final_url_after_redirect() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/old-tea"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/p/1", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/p/1", product("Rooibos Tea", "R 42,99")).await;

    let config = create_test_config(
        &format!("{}/", base_url),
        &temp_dir.path().join("products.json"),
        "json",
        true,
    );
    let fetcher = HttpFetcher::new(&config).unwrap();

    let url = Url::parse(&format!("{}/old-tea", base_url)).unwrap();
    let page = fetcher.fetch(&url).await.unwrap();

    assert_eq!(page.status_code, 200);
    assert_eq!(page.final_url.path(), "/p/1");
    assert!(page.body.contains("Rooibos Tea"));
}

#[tokio::test]
async fn test_http_fetcher_robots_denied() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /checkout"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        &format!("{}/", base_url),
        &temp_dir.path().join("products.json"),
        "json",
        true,
    );
    let fetcher = HttpFetcher::new(&config).unwrap();

    for page in ["/checkout/cart", "/checkout/pay"] {
        let url = Url::parse(&format!("{}{}", base_url, page)).unwrap();
        let result = fetcher.fetch(&url).await;
        assert!(matches!(result, Err(FetchError::RobotsDenied { .. })));
    }
}
