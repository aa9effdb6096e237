//! HTTP article fetcher
//!
//! Downloads a page and keeps the text of its `<p>` elements, which is where
//! news sites put the article body.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use sentiscope_core::{FetchError, Fetcher};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Desktop browser identity; several news sites answer 403 to unknown agents
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/107.0.0.0 Safari/537.36";

/// [`Fetcher`] backed by reqwest
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, identifier: &str, timeout: Duration) -> Result<String, FetchError> {
        info!("Downloading {}", identifier);

        let response = self
            .client
            .get(identifier)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(e, timeout))?;

        let response = response.error_for_status().map_err(|e| match e.status() {
            Some(status) => FetchError::Status {
                status: status.as_u16(),
                identifier: identifier.to_string(),
            },
            None => FetchError::Network(e.to_string()),
        })?;

        let html = response.text().await.map_err(|e| request_error(e, timeout))?;
        debug!("Received {} bytes from {}", html.len(), identifier);

        let text = extract_paragraph_text(&html);
        if text.trim().is_empty() {
            warn!("No paragraph text found at {}", identifier);
            return Err(FetchError::Empty);
        }

        Ok(text)
    }
}

fn request_error(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout { timeout }
    } else {
        FetchError::Network(error.to_string())
    }
}

fn paragraph_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("p").expect("Invalid paragraph selector"))
}

/// Join the text of every `<p>` element with single spaces
///
/// The page goes through a full HTML parser, so paragraphs without a closing
/// tag still count and every named or numeric entity is decoded. Text inside
/// `<script>`, `<style>` and `<noscript>` is skipped. Returns an empty string
/// when the page has no paragraph text.
pub fn extract_paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);

    document
        .select(paragraph_selector())
        .map(|paragraph| collapse_whitespace(&visible_text(paragraph)))
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn visible_text(paragraph: ElementRef<'_>) -> String {
    paragraph
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|el| el.name()))
                .is_some_and(|name| matches!(name, "script" | "style" | "noscript"));
            (!hidden).then_some(&**text)
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
