//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a miniature catalog and run the full
//! listing -> product cycle end-to-end.

use encuentro_scraper::config::{
    Config, CrawlerConfig, ExtractionConfig, OutputConfig, RecordFormat, RulesConfig, SiteConfig,
    UserAgentConfig,
};
use encuentro_scraper::crawler::{run_crawl, Coordinator};
use encuentro_scraper::state::PageState;
use encuentro_scraper::storage::{SqliteStorage, Storage};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAYLOAD: &str =
    r#"{"ecommerce":{"currencyCode":"COP","detail":{"products":[{"id":"A100","price":59900}]}}}"#;

/// Creates a configuration whose single seed is `{base}/listing/1`
fn create_test_config(base_url: &str, temp: &TempDir, format: RecordFormat) -> Config {
    Config {
        site: SiteConfig {
            name: "test".to_string(),
            allowed_domains: vec!["127.0.0.1".to_string()],
            start_url_template: format!("{}/listing/{{}}", base_url),
            category_id: 2,
            category_names: vec![],
        },
        rules: RulesConfig::default(),
        extraction: ExtractionConfig::default(),
        crawler: CrawlerConfig {
            max_concurrent_requests: 4,
            download_delay: 0,
            request_timeout: 5,
            max_retries: 1,
            obey_robots_txt: true,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: temp.path().join("crawl.db").display().to_string(),
            records_path: temp.path().join("out").join("records.jsonl").display().to_string(),
            format,
            summary_path: temp.path().join("summary.md").display().to_string(),
        },
    }
}

fn listing_page(product_hrefs: &[&str]) -> String {
    let tiles: String = product_hrefs
        .iter()
        .map(|href| format!(r#"<div class="carousel-item"><a href="{}">Ver</a></div>"#, href))
        .collect();
    format!(
        r#"<html><head><title>Listing</title></head><body>
        <ul><li class="dropdown-item dropdown"><a href="/listing/1">Mujer</a></li></ul>
        {}
        </body></html>"#,
        tiles
    )
}

fn product_page(payload: Option<&str>) -> String {
    let input = payload
        .map(|p| format!(r#"<input type="hidden" id="pdp-gtm-data" value='{}'>"#, p))
        .unwrap_or_default();
    format!(
        r#"<html lang="es"><body class="encuentro">
        <ol><li class="breadcrumb-item">Mujer</li><li class="breadcrumb-item">Blusas</li></ol>
        {}
        <h1 class="product-name">Blusa Alba</h1>
        <button class="color-attribute" data-color-name="Rojo"></button>
        <div class="px-2"><img src="https://cdn.example.com/a.jpg"></div>
        <div class="value content">Blusa en lino</div>
        <select class="select-size">
          <option value="S">S</option>
          <option value="null">M</option>
        </select>
        </body></html>"#,
        input
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn read_records(config: &Config) -> Vec<serde_json::Value> {
    std::fs::read_to_string(&config.output.records_path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_listing_to_product_cycle() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();

    mount_html(&server, "/listing/1", listing_page(&["/p/blusa-alba.html"])).await;
    mount_html(&server, "/p/blusa-alba.html", product_page(Some(PAYLOAD))).await;

    let config = create_test_config(&base, &temp, RecordFormat::Jsonl);
    let mut coordinator = Coordinator::new(config.clone(), false, "hash").unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.products_emitted, 1);
    assert_eq!(report.extraction_failures, 0);

    let storage = coordinator.storage();
    let listing_url = format!("{}/listing/1", base);
    let product_url = format!("{}/p/blusa-alba.html", base);

    let listing = storage.get_page_by_url(&listing_url).unwrap().unwrap();
    assert_eq!(listing.state, PageState::Crawled);

    let product = storage.get_page_by_url(&product_url).unwrap().unwrap();
    assert_eq!(product.state, PageState::Extracted);
    assert_eq!(product.referer.as_deref(), Some(listing_url.as_str()));

    let records = read_records(&config);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record["retailer_sku"], "A100");
    assert_eq!(record["currency"], "COP");
    assert_eq!(record["name"], "Blusa Alba");
    assert_eq!(record["url"], product_url.as_str());
    assert_eq!(record["trail"], serde_json::json!([listing_url]));
    assert_eq!(record["skus"]["Rojo_null"]["out_of_stock"], true);
    assert_eq!(record["skus"]["Rojo_S"]["out_of_stock"], false);
}

#[tokio::test]
async fn test_product_urls_are_fetched_as_linked() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();

    // Both links share a canonical form; only the first is requested
    mount_html(
        &server,
        "/listing/1",
        listing_page(&["/p/a.html?sz=2&q=a%20b", "/p/a.html?q=a+b&sz=2"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/p/a.html"))
        .respond_with(html(product_page(Some(PAYLOAD))))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&base, &temp, RecordFormat::Jsonl);
    let mut coordinator = Coordinator::new(config.clone(), false, "hash").unwrap();
    let report = coordinator.run().await.unwrap();
    assert_eq!(report.products_emitted, 1);

    let linked = format!("{}/p/a.html?sz=2&q=a%20b", base);
    let requests = server.received_requests().await.unwrap();
    let product_request = requests
        .iter()
        .find(|request| request.url.path() == "/p/a.html")
        .unwrap();
    assert_eq!(product_request.url.query(), Some("sz=2&q=a%20b"));

    let records = read_records(&config);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["url"], linked.as_str());

    let page = coordinator
        .storage()
        .get_page_by_url(&linked)
        .unwrap()
        .unwrap();
    assert_eq!(page.state, PageState::Extracted);
    assert_eq!(page.canonical_url, format!("{}/p/a.html?q=a+b&sz=2", base));
}

#[tokio::test]
async fn test_extraction_failure_does_not_stop_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();

    mount_html(
        &server,
        "/listing/1",
        listing_page(&["/p/broken.html", "/p/good.html"]),
    )
    .await;
    mount_html(&server, "/p/broken.html", product_page(None)).await;
    mount_html(&server, "/p/good.html", product_page(Some(PAYLOAD))).await;

    let config = create_test_config(&base, &temp, RecordFormat::Jsonl);
    let mut coordinator = Coordinator::new(config.clone(), false, "hash").unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.products_emitted, 1);
    assert_eq!(report.extraction_failures, 1);

    let broken = coordinator
        .storage()
        .get_page_by_url(&format!("{}/p/broken.html", base))
        .unwrap()
        .unwrap();
    assert_eq!(broken.state, PageState::ExtractionFailed);
    assert!(broken.error_message.is_some());

    assert_eq!(read_records(&config).len(), 1);
}

#[tokio::test]
async fn test_robots_disallow_is_honored() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /p/private"),
        )
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/listing/1",
        listing_page(&["/p/private-item.html", "/p/public-item.html"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/p/private-item.html"))
        .respond_with(html(product_page(Some(PAYLOAD))))
        .expect(0)
        .mount(&server)
        .await;
    mount_html(&server, "/p/public-item.html", product_page(Some(PAYLOAD))).await;

    let config = create_test_config(&base, &temp, RecordFormat::Jsonl);
    let mut coordinator = Coordinator::new(config, false, "hash").unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.robots_denied, 1);
    assert_eq!(report.products_emitted, 1);

    let private = coordinator
        .storage()
        .get_page_by_url(&format!("{}/p/private-item.html", base))
        .unwrap()
        .unwrap();
    assert_eq!(private.state, PageState::RobotsDenied);
}

#[tokio::test]
async fn test_offsite_links_are_dropped() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();

    mount_html(
        &server,
        "/listing/1",
        listing_page(&["https://elsewhere.example.org/p/other.html", "/p/local.html"]),
    )
    .await;
    mount_html(&server, "/p/local.html", product_page(Some(PAYLOAD))).await;

    let config = create_test_config(&base, &temp, RecordFormat::Jsonl);
    let mut coordinator = Coordinator::new(config, false, "hash").unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.offsite_dropped, 1);
    assert_eq!(report.products_emitted, 1);
    assert!(coordinator
        .storage()
        .get_page_by_url("https://elsewhere.example.org/p/other.html")
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_http_failures_are_classified() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();

    mount_html(
        &server,
        "/listing/1",
        listing_page(&["/p/gone.html", "/p/flaky.html"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/p/gone.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    // One attempt plus one retry
    Mock::given(method("GET"))
        .and(path("/p/flaky.html"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let config = create_test_config(&base, &temp, RecordFormat::Jsonl);
    let mut coordinator = Coordinator::new(config, false, "hash").unwrap();
    coordinator.run().await.unwrap();

    let storage = coordinator.storage();
    let gone = storage
        .get_page_by_url(&format!("{}/p/gone.html", base))
        .unwrap()
        .unwrap();
    assert_eq!(gone.state, PageState::DeadLink);
    assert_eq!(gone.status_code, Some(404));

    let flaky = storage
        .get_page_by_url(&format!("{}/p/flaky.html", base))
        .unwrap()
        .unwrap();
    assert_eq!(flaky.state, PageState::Failed);
    assert_eq!(flaky.retry_count, 2);
}

#[tokio::test]
async fn test_run_crawl_writes_json_array_and_summary() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();

    mount_html(&server, "/listing/1", listing_page(&["/p/blusa-alba.html"])).await;
    mount_html(&server, "/p/blusa-alba.html", product_page(Some(PAYLOAD))).await;

    let config = create_test_config(&base, &temp, RecordFormat::Json);
    let report = run_crawl(config.clone(), false, "hash").await.unwrap();
    assert_eq!(report.products_emitted, 1);

    let content = std::fs::read_to_string(&config.output.records_path).unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["retailer_sku"], "A100");

    let summary = std::fs::read_to_string(&config.output.summary_path).unwrap();
    assert!(summary.starts_with("# Encuentro Crawl Summary"));

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert!(!run.status.is_resumable());
    assert_eq!(storage.count_products(run.id).unwrap(), 1);
}
