//! Browser-like HTTP session.
//!
//! [`HttpClient`] is the only way the pipeline talks to a portal. The
//! reqwest-backed [`ReqwestSession`] keeps cookies between requests, sends a
//! desktop browser's default headers, and follows redirects, which is what
//! court portals expect between loading the search page, fetching the
//! CAPTCHA, and submitting the form.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::FormMethod;

/// User-Agent sent with every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Headers a desktop browser sends on top-level navigations.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Cache-Control", "max-age=0"),
];

/// Errors from a single HTTP exchange.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// No response arrived within the timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The host could not be reached.
    #[error("connection error: {0}")]
    Connect(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    Request(String),

    /// Anything else (body read failure, redirect loop, etc.).
    #[error("{0}")]
    Other(String),
}

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    /// Raw body.
    pub body: Vec<u8>,
    /// Time from sending the request to reading the body.
    pub elapsed: Duration,
}

impl HttpResponse {
    /// Returns `true` for HTTP 200.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A cookie-keeping HTTP session.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetches a URL.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if no response could be read. Non-200 statuses
    /// are not errors.
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, HttpError>;

    /// Submits URL-encoded form fields with the given method.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if no response could be read. Non-200 statuses
    /// are not errors.
    async fn submit_form(
        &self,
        method: FormMethod,
        url: &str,
        fields: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError>;
}

/// [`HttpClient`] backed by a cookie-enabled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestSession {
    client: reqwest::Client,
}

impl ReqwestSession {
    /// Creates a session with the browser default headers.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Request`] if the client cannot be built.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_headers(&BTreeMap::new())
    }

    /// Creates a session with the browser default headers plus `extra`,
    /// which override defaults of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Request`] if a header is invalid or the client
    /// cannot be built.
    pub fn with_headers(extra: &BTreeMap<String, String>) -> Result<Self, HttpError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        let defaults = BROWSER_HEADERS.iter().map(|(k, v)| (*k, *v));
        let overrides = extra.iter().map(|(k, v)| (k.as_str(), v.as_str()));

        for (key, value) in defaults.chain(overrides) {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| HttpError::Request(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| HttpError::Request(format!("invalid header value '{value}': {e}")))?;
            header_map.insert(name, val);
        }

        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(header_map)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| HttpError::Request(e.to_string()))?;

        Ok(Self { client })
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        let started = Instant::now();
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(&e, timeout))?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(&e, timeout))?
            .to_vec();

        Ok(HttpResponse {
            status,
            url,
            body,
            elapsed: started.elapsed(),
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestSession {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, HttpError> {
        log::debug!("GET {url}");
        self.execute(self.client.get(url), timeout).await
    }

    async fn submit_form(
        &self,
        method: FormMethod,
        url: &str,
        fields: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        log::debug!("{} {url} ({} fields)", method.as_str().to_uppercase(), fields.len());
        let request = match method {
            FormMethod::Get => self.client.get(url).query(fields),
            FormMethod::Post => self.client.post(url).form(fields),
        };
        self.execute(request, timeout).await
    }
}

/// Maps a reqwest failure onto the pipeline's failure categories.
fn classify(err: &reqwest::Error, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout(timeout)
    } else if err.is_connect() {
        HttpError::Connect(err.to_string())
    } else if err.is_builder() {
        HttpError::Request(err.to_string())
    } else {
        HttpError::Other(err.to_string())
    }
}
