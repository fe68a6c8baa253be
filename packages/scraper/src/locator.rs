//! Search-page discovery.
//!
//! Probes a portal's candidate paths in order and stops at the first page
//! that either hosts a recognizable search form or mentions a keyword.

use std::time::Duration;

use scraper::Html;

use crate::form::find_search_form;
use crate::http::{HttpClient, HttpResponse};
use crate::{ScrapeError, resolve_url};

/// Relative paths probed when a portal does not configure its own.
pub const DEFAULT_CANDIDATE_PATHS: &[&str] = &[
    "/case_status",
    "/case-status",
    "/case_status.asp",
    "/case_status.php",
    "/case_status.html",
    "/search",
    "/case-search",
    "/status",
    "/",
];

/// Words whose presence marks a page as search-related.
pub const DEFAULT_PAGE_KEYWORDS: &[&str] = &["case", "search", "status", "court"];

/// Timeout for each probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// How to probe a portal.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Portal root URL.
    pub base_url: String,
    /// Paths joined onto `base_url`, in priority order.
    pub candidate_paths: Vec<String>,
    /// Lowercase keywords for the text heuristic.
    pub keywords: Vec<String>,
    /// Selectors for the search-form heuristic.
    pub form_selectors: Vec<String>,
    /// Whether to try the bare base URL after all candidates.
    pub fallback_to_base: bool,
    /// Timeout for each probe.
    pub timeout: Duration,
}

impl LocatorConfig {
    /// Creates a config with the default paths, keywords, and selectors.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            candidate_paths: crate::form::owned(DEFAULT_CANDIDATE_PATHS),
            keywords: crate::form::owned(DEFAULT_PAGE_KEYWORDS),
            form_selectors: crate::form::owned(crate::form::DEFAULT_FORM_SELECTORS),
            fallback_to_base: true,
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Replaces the candidate paths.
    #[must_use]
    pub fn with_candidate_paths(mut self, paths: Vec<String>) -> Self {
        self.candidate_paths = paths;
        self
    }

    /// Replaces the probe timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The page chosen to host the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedPage {
    /// Final URL of the page.
    pub url: String,
    /// Page HTML.
    pub html: String,
    /// Whether the page matched the search-form heuristic.
    pub has_search_form: bool,
}

/// Returns `true` if the page's visible text contains any keyword.
#[must_use]
pub fn mentions_keywords(html: &str, keywords: &[String]) -> bool {
    let document = Html::parse_document(html);
    let text = document.root_element().text().collect::<String>().to_lowercase();
    keywords.iter().any(|kw| text.contains(&kw.to_lowercase()))
}

fn classify(response: HttpResponse, config: &LocatorConfig) -> Option<LocatedPage> {
    let html = response.text();
    let has_search_form = find_search_form(&html, &response.url, &config.form_selectors).is_some();
    if !has_search_form && !mentions_keywords(&html, &config.keywords) {
        return None;
    }
    Some(LocatedPage {
        url: response.url,
        html,
        has_search_form,
    })
}

/// Finds the page that hosts the case search.
///
/// # Errors
///
/// Returns [`ScrapeError::PortalUnreachable`] if no candidate (nor the base
/// URL) answered with a usable page, or [`ScrapeError::InvalidUrl`] if the
/// base URL is malformed.
pub async fn locate_search_page(
    client: &dyn HttpClient,
    config: &LocatorConfig,
) -> Result<LocatedPage, ScrapeError> {
    let base = format!("{}/", config.base_url);
    let mut urls = config
        .candidate_paths
        .iter()
        .map(|path| resolve_url(&base, path))
        .collect::<Result<Vec<_>, _>>()?;
    if config.fallback_to_base && !urls.iter().any(|u| u.trim_end_matches('/') == config.base_url) {
        urls.push(config.base_url.clone());
    }

    let mut answered = 0_usize;

    for url in &urls {
        let response = match client.get(url, config.timeout).await {
            Ok(resp) => resp,
            Err(e) => {
                log::debug!("Probe {url} failed: {e}");
                continue;
            }
        };
        if !response.is_ok() {
            log::debug!("Probe {url} returned HTTP {}", response.status);
            continue;
        }
        answered += 1;

        if let Some(page) = classify(response, config) {
            if page.has_search_form {
                log::info!("Search form found at {}", page.url);
            } else {
                log::info!("Search page matched by keyword at {}", page.url);
            }
            return Ok(page);
        }
        log::debug!("Probe {url} looks unrelated");
    }

    Err(ScrapeError::PortalUnreachable(format!(
        "no usable search page at {} ({} of {} candidates answered)",
        config.base_url,
        answered,
        urls.len()
    )))
}
