//! Integration tests for fetch → decode → render against a local HTTP server.
//!
//! Each test starts its own wiremock server and uses millisecond backoff
//! schedules so retries stay fast.

use std::time::Duration;

use readme_updater::category::{SYMBOL_CULTURE, SYMBOL_OTHER, SYMBOL_TECHNOLOGY};
use readme_updater::config::Config;
use readme_updater::feed::{fetch_entries, FeedError, FetchError, Fetcher, HttpTransport};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLES: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Articles</title>
    <id>tag:example.com,2024:articles</id>
    <updated>2024-03-04T17:00:00Z</updated>
    <entry>
        <title>Async Rust without tears</title>
        <id>tag:example.com,2024:async</id>
        <link href="https://example.com/articles/async"/>
        <summary>Futures, step by step.</summary>
        <published>2024-03-04T17:00:00Z</published>
        <category term="culture"/>
        <category term="technology"/>
    </entry>
    <entry>
        <title>Notes from the film festival</title>
        <id>tag:example.com,2024:festival</id>
        <link href="https://example.com/articles/festival"/>
        <summary>Five films worth seeing.</summary>
        <published>2024-02-10T12:00:00Z</published>
        <category term="culture"/>
        <category term="personal"/>
    </entry>
    <entry>
        <title>Leaving the timeline</title>
        <id>tag:example.com,2024:timeline</id>
        <link href="https://example.com/articles/timeline"/>
        <summary>Why I stopped posting.</summary>
        <published>2024-01-05T09:00:00Z</published>
        <category term="social-platforms"/>
    </entry>
</feed>"#;

fn fast_schedule() -> Vec<Duration> {
    vec![
        Duration::from_millis(10),
        Duration::from_millis(10),
        Duration::from_millis(10),
    ]
}

fn fetcher() -> Fetcher<HttpTransport> {
    let transport = HttpTransport::new(Duration::from_secs(5), 1024 * 1024).unwrap();
    Fetcher::new(transport, fast_schedule())
}

fn config_for(server: &MockServer) -> Config {
    Config {
        base_url: server.uri(),
        backoff_schedule_secs: vec![0, 0, 0],
        ..Config::default()
    }
}

async fn serve_articles(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/articles.atom"))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("Content-Type", "application/atom+xml"),
        )
        .mount(server)
        .await;
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_run_renders_readme() {
    let server = MockServer::start().await;
    serve_articles(&server, 200, ARTICLES).await;

    let mut out = Vec::new();
    readme_updater::run(&config_for(&server), &mut out)
        .await
        .unwrap();
    let readme = String::from_utf8(out).unwrap();

    assert!(readme.contains(&format!(
        "* {SYMBOL_TECHNOLOGY} [Async Rust without tears](https://example.com/articles/async) (March 4, 2024)"
    )));
    assert!(readme.contains(&format!(
        "* {SYMBOL_CULTURE} [Notes from the film festival](https://example.com/articles/festival) (February 10, 2024)"
    )));
    assert!(readme.contains(&format!(
        "* {SYMBOL_OTHER} [Leaving the timeline](https://example.com/articles/timeline) (January 5, 2024)"
    )));
}

#[tokio::test]
async fn test_run_writes_nothing_on_fetch_failure() {
    let server = MockServer::start().await;
    serve_articles(&server, 503, "down for maintenance").await;

    let mut out = Vec::new();
    let err = readme_updater::run(&config_for(&server), &mut out)
        .await
        .unwrap_err();

    assert!(out.is_empty());
    let message = format!("{err:#}");
    assert!(message.contains("Non-200 status code 503"));
    assert!(message.contains("/articles.atom"));
}

#[tokio::test]
async fn test_run_reports_malformed_feed() {
    let server = MockServer::start().await;
    serve_articles(&server, 200, "<not valid xml").await;

    let mut out = Vec::new();
    let err = readme_updater::run(&config_for(&server), &mut out)
        .await
        .unwrap_err();

    assert!(out.is_empty());
    assert!(format!("{err:#}").contains("Error unmarshaling Atom feed XML"));
}

// ============================================================================
// Fetch behavior over real HTTP
// ============================================================================

#[tokio::test]
async fn test_fetch_entries_decodes_feed() {
    let server = MockServer::start().await;
    serve_articles(&server, 200, ARTICLES).await;

    let entries = fetch_entries(&fetcher(), &format!("{}/articles.atom", server.uri()))
        .await
        .unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].title, "Async Rust without tears");
    assert_eq!(entries[0].categories, vec!["culture", "technology"]);
    assert_eq!(entries[1].summary, "Five films worth seeing.");
}

#[tokio::test]
async fn test_404_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such page"))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetch_entries(&fetcher(), &format!("{}/articles.atom", server.uri())).await;

    match result {
        Err(FeedError::Fetch(FetchError::HttpStatus { status, body, .. })) => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such page");
        }
        other => panic!("Expected HttpStatus(404), got {:?}", other),
    }
}

#[tokio::test]
async fn test_500_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetch_entries(&fetcher(), &format!("{}/articles.atom", server.uri())).await;

    assert!(matches!(
        result,
        Err(FeedError::Fetch(FetchError::HttpStatus { status: 500, .. }))
    ));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(Duration::from_secs(5), 1024).unwrap();
    let fetcher = Fetcher::new(transport, fast_schedule());
    let result = fetcher.fetch_ok(&format!("{}/articles.atom", server.uri())).await;

    assert!(matches!(
        result,
        Err(FetchError::ResponseTooLarge { limit: 1024, .. })
    ));
}

#[tokio::test]
async fn test_connection_refused_exhausts_schedule() {
    // Bind then drop a listener so its port is closed.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let err = fetcher()
        .fetch_with_retries(&format!("{uri}/articles.atom"))
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(err.to_string().contains("/articles.atom"));
}
