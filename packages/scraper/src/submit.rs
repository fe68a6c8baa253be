//! Search submission.
//!
//! Builds the form payload from a portal's [`FieldMap`] and classifies the
//! portal's answer into the failure modes callers report on.

use std::collections::BTreeMap;
use std::time::Duration;

use court_status_case_models::SearchRequest;
use serde::Deserialize;

use crate::FormMethod;
use crate::http::{HttpClient, HttpError, HttpResponse};

/// Default submission timeout.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(20);

/// Names of the form controls a portal expects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldMap {
    /// Control receiving the case type.
    pub case_type: String,
    /// Control receiving the case number.
    pub case_number: String,
    /// Control receiving the filing year.
    pub filing_year: String,
    /// Controls receiving the CAPTCHA answer (some portals read more than
    /// one name).
    #[serde(default)]
    pub captcha: Vec<String>,
    /// Constant controls sent with every search.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            case_type: "case_type".to_owned(),
            case_number: "case_number".to_owned(),
            filing_year: "filing_year".to_owned(),
            captcha: vec!["captcha".to_owned(), "verification_code".to_owned()],
            extra: BTreeMap::new(),
        }
    }
}

/// Why a submission did not produce a result page.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The portal answered with a non-200 status.
    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    /// No answer within the timeout.
    #[error("Request timeout - portal may be slow or unavailable")]
    Timeout,

    /// The portal could not be reached.
    #[error("Connection error - unable to reach {0}")]
    Connection(String),

    /// Any other failure.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Everything needed to send one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Endpoint URL.
    pub url: String,
    /// Method to send with.
    pub method: FormMethod,
    /// Ordered form fields.
    pub fields: Vec<(String, String)>,
}

/// Sets `name` to `value`, replacing an earlier entry of the same name.
fn set_field(fields: &mut Vec<(String, String)>, name: &str, value: &str) {
    if let Some(entry) = fields.iter_mut().find(|(n, _)| n == name) {
        value.clone_into(&mut entry.1);
    } else {
        fields.push((name.to_owned(), value.to_owned()));
    }
}

/// Builds the ordered payload.
///
/// Hidden form values come first, then the portal's constant fields, then
/// the request fields; later entries override earlier ones of the same
/// name. A non-empty CAPTCHA token is sent under every configured CAPTCHA
/// name; an empty token is left out entirely.
#[must_use]
pub fn build_payload(
    hidden: &[(String, String)],
    fields: &FieldMap,
    request: &SearchRequest,
    captcha_token: &str,
) -> Vec<(String, String)> {
    let mut payload: Vec<(String, String)> = Vec::new();

    for (name, value) in hidden {
        set_field(&mut payload, name, value);
    }
    for (name, value) in &fields.extra {
        set_field(&mut payload, name, value);
    }

    set_field(&mut payload, &fields.case_type, &request.case_type);
    set_field(&mut payload, &fields.case_number, &request.case_number);
    set_field(
        &mut payload,
        &fields.filing_year,
        &request.filing_year.to_string(),
    );

    if !captcha_token.is_empty() {
        for name in &fields.captcha {
            set_field(&mut payload, name, captcha_token);
        }
    }

    payload
}

/// Sends the search and returns the result page.
///
/// Waits `delay` first when it is non-zero.
///
/// # Errors
///
/// Returns [`SubmitError`] if the portal times out, cannot be reached,
/// answers with a non-200 status, or fails in any other way.
pub async fn submit_search(
    client: &dyn HttpClient,
    submission: &Submission,
    timeout: Duration,
    delay: Duration,
) -> Result<HttpResponse, SubmitError> {
    if !delay.is_zero() {
        log::debug!("Waiting {delay:?} before submitting");
        tokio::time::sleep(delay).await;
    }

    log::info!(
        "Submitting search to {} ({})",
        submission.url,
        submission.method.as_str()
    );

    let response = client
        .submit_form(submission.method, &submission.url, &submission.fields, timeout)
        .await
        .map_err(|e| match e {
            HttpError::Timeout(_) => SubmitError::Timeout,
            HttpError::Connect(_) => SubmitError::Connection(host_of(&submission.url)),
            HttpError::Request(msg) | HttpError::Other(msg) => SubmitError::Unexpected(msg),
        })?;

    if !response.is_ok() {
        return Err(SubmitError::HttpStatus(response.status));
    }

    Ok(response)
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
