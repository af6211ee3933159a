//! Scrape tests against a local mock HTTP server.
//!
//! These exercise the full fetch-then-extract path, including the
//! identifying User-Agent header and the timeout and error mapping the
//! enrichment worker relies on.

use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reread_core::{defaults, Error};
use reread_scrape::{MetadataScraper, ScrapeConfig};

const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta property="og:title" content="Understanding Async Rust">
  <meta property="og:description" content="A tour of futures and executors.">
  <meta property="og:image" content="https://example.com/cover.png">
  <meta property="og:site_name" content="Example Engineering">
  <title>fallback title</title>
</head>
<body><p>body</p></body>
</html>"#;

#[tokio::test]
async fn test_scrape_extracts_metadata_from_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE_HTML))
        .expect(1)
        .mount(&mock_server)
        .await;

    let scraper = MetadataScraper::new(&ScrapeConfig::default());
    let metadata = scraper
        .scrape(&format!("{}/article", mock_server.uri()))
        .await
        .expect("scrape should succeed");

    assert_eq!(metadata.title.as_deref(), Some("Understanding Async Rust"));
    assert_eq!(
        metadata.description.as_deref(),
        Some("A tour of futures and executors.")
    );
    assert_eq!(
        metadata.image_url.as_deref(),
        Some("https://example.com/cover.png")
    );
    assert_eq!(metadata.site_name.as_deref(), Some("Example Engineering"));
}

#[tokio::test]
async fn test_scrape_sends_identifying_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", defaults::SCRAPE_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let scraper = MetadataScraper::new(&ScrapeConfig::default());
    scraper
        .scrape(&format!("{}/ua", mock_server.uri()))
        .await
        .expect("scrape should succeed");
}

#[tokio::test]
async fn test_scrape_of_bare_page_yields_empty_metadata() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>no metadata here</body></html>"),
        )
        .mount(&mock_server)
        .await;

    let scraper = MetadataScraper::new(&ScrapeConfig::default());
    let metadata = scraper
        .scrape(&format!("{}/bare", mock_server.uri()))
        .await
        .expect("a page without metadata is still a successful scrape");

    assert!(metadata.is_empty());
}

#[tokio::test]
async fn test_scrape_fails_on_http_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let scraper = MetadataScraper::new(&ScrapeConfig::default());
    let result = scraper.scrape(&format!("{}/gone", mock_server.uri())).await;

    match result {
        Err(Error::Scrape(msg)) => assert!(msg.contains("404"), "message was: {}", msg),
        other => panic!("Expected scrape error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_scrape_times_out_on_slow_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html></html>")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let config = ScrapeConfig {
        timeout: Duration::from_millis(200),
        ..ScrapeConfig::default()
    };
    let scraper = MetadataScraper::new(&config);
    let result = scraper.scrape(&format!("{}/slow", mock_server.uri())).await;

    assert!(matches!(result, Err(Error::Scrape(_))));
}

#[tokio::test]
async fn test_scrape_fails_when_server_unreachable() {
    // Start a server just to reserve a port, then shut it down.
    let uri = {
        let mock_server = MockServer::start().await;
        mock_server.uri()
    };

    let scraper = MetadataScraper::new(&ScrapeConfig::default());
    let result = scraper.scrape(&format!("{}/offline", uri)).await;

    assert!(matches!(result, Err(Error::Scrape(_))));
}
