#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Portal interaction for court case-status searches.
//!
//! Everything that touches the network goes through the [`http::HttpClient`]
//! trait so the pipeline can run against a real browser-like session
//! ([`http::ReqwestSession`]) or canned responses in tests.
//!
//! - [`locator`] probes candidate paths to find the page hosting the search
//! - [`form`] extracts the search form and the CAPTCHA image from that page
//! - [`submit`] builds the payload and classifies the submission outcome
//!
//! HTML parsing happens in synchronous helpers so no `scraper::Html` value
//! is ever held across an `.await`.

pub mod form;
pub mod http;
pub mod locator;
pub mod submit;

use scraper::Selector;
use serde::Deserialize;

pub use http::{HttpClient, HttpError, HttpResponse, ReqwestSession};

/// Errors that can occur while interacting with a portal.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Parsing a page or a configured selector failed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No candidate page of the portal answered usefully.
    #[error("Portal unreachable: {0}")]
    PortalUnreachable(String),

    /// A URL could not be parsed or resolved.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL or reference.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// HTTP method a search form submits with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMethod {
    /// Query-string submission.
    Get,
    /// URL-encoded body submission.
    #[default]
    Post,
}

impl FormMethod {
    /// Parses an HTML `method` attribute. Anything but `get` means POST.
    #[must_use]
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("get") => Self::Get,
            _ => Self::Post,
        }
    }

    /// Lowercase method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
        }
    }
}

/// Parses a CSS selector string, returning a [`ScrapeError`] on failure.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the selector is invalid.
pub fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))
}

/// Resolves a possibly relative reference against a base URL.
///
/// # Errors
///
/// Returns [`ScrapeError::InvalidUrl`] if either URL cannot be parsed.
pub fn resolve_url(base: &str, reference: &str) -> Result<String, ScrapeError> {
    let base_url = reqwest::Url::parse(base).map_err(|e| ScrapeError::InvalidUrl {
        url: base.to_owned(),
        reason: e.to_string(),
    })?;
    base_url
        .join(reference.trim())
        .map(String::from)
        .map_err(|e| ScrapeError::InvalidUrl {
            url: reference.to_owned(),
            reason: e.to_string(),
        })
}

/// Collapses the visible text of an element into single-spaced words.
#[must_use]
pub fn element_text(element: &scraper::ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_references() {
        assert_eq!(
            resolve_url("https://court.example/pcase/guiCaseWise.php", "captcha.php?x=1").unwrap(),
            "https://court.example/pcase/captcha.php?x=1"
        );
        assert_eq!(
            resolve_url("https://court.example/a/b", "/root.png").unwrap(),
            "https://court.example/root.png"
        );
        assert!(resolve_url("not a url", "x").is_err());
    }

    #[test]
    fn form_method_defaults_to_post() {
        assert_eq!(FormMethod::from_attr(Some(" GET ")), FormMethod::Get);
        assert_eq!(FormMethod::from_attr(Some("post")), FormMethod::Post);
        assert_eq!(FormMethod::from_attr(None), FormMethod::Post);
    }

    #[test]
    fn element_text_collapses_whitespace() {
        let html = scraper::Html::parse_fragment("<p>  Case \n <b>No.</b>\t 12 </p>");
        let sel = parse_selector("p").unwrap();
        let p = html.select(&sel).next().unwrap();
        assert_eq!(element_text(&p), "Case No. 12");
    }
}
