//! Tests for the reqwest-backed fetcher against a local HTML server

use axum::{
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::time::Duration;

use sentiscope::fetcher::BROWSER_USER_AGENT;
use sentiscope::HttpFetcher;
use sentiscope_core::{FetchError, Fetcher};

const ARTICLE: &str = r#"<!doctype html>
<html>
  <head><title>Local news</title><style>p { color: red; }</style></head>
  <body>
    <h1>Harbour reopens</h1>
    <p>The harbour reopened on Monday after repairs.</p>
    <p class="quote">&ldquo;It&rsquo;s a great day,&rdquo; said the mayor.</p>
    <footer>Copyright</footer>
  </body>
</html>"#;

/// Older markup: paragraphs never closed, entities outside the common set
const LEGACY_ARTICLE: &str = "<html><body>\
    <p>Shares rose 3&percnt; in Z&uuml;rich\
    <p>Tickets cost &euro;12 or &pound;10\
    </body></html>";

/// Start a throwaway HTML server and return its address
async fn start_html_server() -> SocketAddr {
    let app = Router::new()
        .route("/article", get(|| async { ([(header::CONTENT_TYPE, "text/html")], ARTICLE) }))
        .route("/legacy", get(|| async { LEGACY_ARTICLE }))
        .route(
            "/no-paragraphs",
            get(|| async { "<html><body><div>Only a div</div></body></html>" }),
        )
        .route("/gone", get(|| async { (StatusCode::NOT_FOUND, "<p>Not found</p>") }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "<p>Too late</p>"
            }),
        )
        .route(
            "/agent",
            get(|headers: HeaderMap| async move {
                let agent = headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                format!("<p>{}</p>", agent)
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

#[tokio::test]
async fn test_fetch_extracts_paragraphs() {
    let addr = start_html_server().await;
    let fetcher = HttpFetcher::new();

    let text = fetcher
        .fetch(&format!("http://{}/article", addr), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(
        text,
        "The harbour reopened on Monday after repairs. \u{201C}It\u{2019}s a great day,\u{201D} said the mayor."
    );
}

#[tokio::test]
async fn test_fetch_reads_unclosed_paragraphs() {
    let addr = start_html_server().await;

    let text = HttpFetcher::new()
        .fetch(&format!("http://{}/legacy", addr), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(text, "Shares rose 3% in Zürich Tickets cost €12 or £10");
}

#[tokio::test]
async fn test_page_without_paragraphs_is_empty() {
    let addr = start_html_server().await;

    let err = HttpFetcher::new()
        .fetch(&format!("http://{}/no-paragraphs", addr), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::Empty);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let addr = start_html_server().await;
    let url = format!("http://{}/gone", addr);

    let err = HttpFetcher::new()
        .fetch(&url, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        FetchError::Status {
            status: 404,
            identifier: url
        }
    );
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let addr = start_html_server().await;

    let err = HttpFetcher::new()
        .fetch(&format!("http://{}/slow", addr), Duration::from_millis(200))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        FetchError::Timeout {
            timeout: Duration::from_millis(200)
        }
    );
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // bind then drop so nothing listens on the port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = HttpFetcher::new()
        .fetch(&format!("http://{}/article", addr), Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Network(_)));
}

#[tokio::test]
async fn test_browser_user_agent_is_sent() {
    let addr = start_html_server().await;
    let url = format!("http://{}/agent", addr);

    let text = HttpFetcher::new()
        .fetch(&url, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(text, BROWSER_USER_AGENT);

    let text = HttpFetcher::new()
        .with_user_agent("sentiscope-test/1.0")
        .fetch(&url, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(text, "sentiscope-test/1.0");
}
