//! Search form and CAPTCHA discovery on a fetched page.
//!
//! Both lookups walk an ordered selector list (first selector with a match
//! wins) and then fall back to keyword heuristics over attribute values.

use std::collections::BTreeSet;
use std::time::Duration;

use base64::Engine as _;
use scraper::{ElementRef, Html, Selector};

use crate::http::HttpClient;
use crate::{FormMethod, parse_selector, resolve_url};

/// Form selectors tried in order.
pub const DEFAULT_FORM_SELECTORS: &[&str] = &[
    r#"form[action*="search"]"#,
    r#"form[action*="case"]"#,
    r#"form[action*="status"]"#,
    r#"form[id*="search"]"#,
    r#"form[id*="case"]"#,
    r#"form[class*="search"]"#,
    r#"form[class*="case"]"#,
];

/// Control-name fragments that mark a form as a case search.
pub const FORM_FIELD_KEYWORDS: &[&str] = &["case", "number", "type", "year", "search"];

/// CAPTCHA image selectors tried in order.
pub const DEFAULT_CAPTCHA_SELECTORS: &[&str] = &[
    r#"img[src*="captcha"]"#,
    r#"img[src*="CAPTCHA"]"#,
    r#"img[src*="verify"]"#,
    r#"img[src*="security"]"#,
    r#"img[alt*="captcha"]"#,
    r#"img[alt*="CAPTCHA"]"#,
    r#"img[alt*="verification"]"#,
    r#"input[type="image"]"#,
];

/// `src`/`alt` fragments that mark an arbitrary image as a CAPTCHA.
pub const CAPTCHA_KEYWORDS: &[&str] = &["captcha", "verify", "verification", "security"];

/// Timeout for fetching a CAPTCHA image.
pub const CAPTCHA_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The search form found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDescriptor {
    /// Absolute submission URL.
    pub action_url: String,
    /// Submission method.
    pub method: FormMethod,
    /// Names of all named controls.
    pub field_names: BTreeSet<String>,
    /// Hidden controls and their values, in document order.
    pub hidden_fields: Vec<(String, String)>,
}

/// A fetched CAPTCHA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaChallenge {
    /// Encoded image bytes.
    pub image_bytes: Vec<u8>,
    /// Where the image came from (`data:` URIs are truncated).
    pub source_url: String,
}

/// A place a CAPTCHA image may be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptchaSource {
    /// Absolute URL to fetch over the session.
    Remote(String),
    /// Image embedded in the page as a base64 `data:` URI.
    Inline(Vec<u8>),
}

/// Compiles configured selectors, skipping (and logging) invalid ones.
fn compile(selectors: &[String]) -> Vec<(String, Selector)> {
    selectors
        .iter()
        .filter_map(|raw| match parse_selector(raw) {
            Ok(sel) => Some((raw.clone(), sel)),
            Err(e) => {
                log::warn!("Skipping selector: {e}");
                None
            }
        })
        .collect()
}

/// Returns the built-in selector list as owned strings.
#[must_use]
pub fn owned(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| (*s).to_owned()).collect()
}

/// Finds the case-search form on a page.
///
/// Selectors are tried in order and the first one with a match wins. If none
/// matches, the first form with a control whose name contains one of
/// [`FORM_FIELD_KEYWORDS`] is used.
#[must_use]
pub fn find_search_form(html: &str, page_url: &str, selectors: &[String]) -> Option<FormDescriptor> {
    let document = Html::parse_document(html);

    for (raw, sel) in compile(selectors) {
        if let Some(form) = document.select(&sel).next() {
            log::debug!("Search form matched '{raw}'");
            return Some(describe_form(&form, page_url));
        }
    }

    let form_sel = parse_selector("form").ok()?;
    document
        .select(&form_sel)
        .find(|form| {
            control_names(form).iter().any(|name| {
                let name = name.to_lowercase();
                FORM_FIELD_KEYWORDS.iter().any(|kw| name.contains(kw))
            })
        })
        .map(|form| {
            log::debug!("Search form matched by control names");
            describe_form(&form, page_url)
        })
}

fn control_names(form: &ElementRef<'_>) -> Vec<String> {
    let Ok(sel) = parse_selector("input[name], select[name], textarea[name]") else {
        return Vec::new();
    };
    form.select(&sel)
        .filter_map(|el| el.value().attr("name"))
        .map(str::to_owned)
        .collect()
}

fn describe_form(form: &ElementRef<'_>, page_url: &str) -> FormDescriptor {
    let action = form.value().attr("action").unwrap_or("").trim();
    let action_url = if action.is_empty() {
        page_url.to_owned()
    } else {
        resolve_url(page_url, action).unwrap_or_else(|e| {
            log::warn!("Unresolvable form action, submitting to the page itself: {e}");
            page_url.to_owned()
        })
    };

    let hidden_fields: Vec<(String, String)> = parse_selector("input[name]")
        .map(|sel| {
            form.select(&sel)
                .filter(|el| {
                    el.value()
                        .attr("type")
                        .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
                })
                .filter_map(|el| {
                    let name = el.value().attr("name")?;
                    let value = el.value().attr("value").unwrap_or("");
                    Some((name.to_owned(), value.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default();

    FormDescriptor {
        action_url,
        method: FormMethod::from_attr(form.value().attr("method")),
        field_names: control_names(form).into_iter().collect(),
        hidden_fields,
    }
}

/// Lists CAPTCHA image sources on a page, most likely first.
///
/// Each selector contributes its first match with a `src`; then every image
/// whose `src` or `alt` contains a [`CAPTCHA_KEYWORDS`] entry. Duplicates are
/// dropped and relative references are resolved against `page_url`.
#[must_use]
pub fn captcha_sources(html: &str, page_url: &str, selectors: &[String]) -> Vec<CaptchaSource> {
    let document = Html::parse_document(html);
    let mut refs: Vec<String> = Vec::new();

    for (_, sel) in compile(selectors) {
        if let Some(src) = document
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr("src"))
        {
            refs.push(src.trim().to_owned());
        }
    }

    if let Ok(img_sel) = parse_selector("img") {
        for img in document.select(&img_sel) {
            let Some(src) = img.value().attr("src") else {
                continue;
            };
            let alt = img.value().attr("alt").unwrap_or("").to_lowercase();
            let src_lower = src.to_lowercase();
            if CAPTCHA_KEYWORDS
                .iter()
                .any(|kw| src_lower.contains(kw) || alt.contains(kw))
            {
                refs.push(src.trim().to_owned());
            }
        }
    }

    let mut seen = BTreeSet::new();
    refs.into_iter()
        .filter(|r| !r.is_empty() && seen.insert(r.clone()))
        .filter_map(|r| to_source(&r, page_url))
        .collect()
}

fn to_source(reference: &str, page_url: &str) -> Option<CaptchaSource> {
    if let Some(payload) = reference.strip_prefix("data:") {
        let (meta, data) = payload.split_once(',')?;
        if !meta.ends_with(";base64") {
            log::debug!("Ignoring non-base64 data URI CAPTCHA");
            return None;
        }
        return match base64::engine::general_purpose::STANDARD.decode(data.trim()) {
            Ok(bytes) => Some(CaptchaSource::Inline(bytes)),
            Err(e) => {
                log::warn!("Undecodable inline CAPTCHA: {e}");
                None
            }
        };
    }

    match resolve_url(page_url, reference) {
        Ok(url) => Some(CaptchaSource::Remote(url)),
        Err(e) => {
            log::warn!("Skipping CAPTCHA reference: {e}");
            None
        }
    }
}

/// Finds and downloads the CAPTCHA image for a page.
///
/// Candidates from [`captcha_sources`] are tried in order and the first one
/// that yields a non-empty body wins. Returns `None` when the page has no
/// CAPTCHA or none could be fetched.
pub async fn fetch_captcha(
    client: &dyn HttpClient,
    html: &str,
    page_url: &str,
    selectors: &[String],
    timeout: Duration,
) -> Option<CaptchaChallenge> {
    let sources = captcha_sources(html, page_url, selectors);
    if sources.is_empty() {
        log::info!("No CAPTCHA image on {page_url}");
        return None;
    }

    for source in sources {
        match source {
            CaptchaSource::Inline(bytes) if !bytes.is_empty() => {
                return Some(CaptchaChallenge {
                    image_bytes: bytes,
                    source_url: "data:".to_owned(),
                });
            }
            CaptchaSource::Inline(_) => {}
            CaptchaSource::Remote(url) => match client.get(&url, timeout).await {
                Ok(resp) if resp.is_ok() && !resp.body.is_empty() => {
                    log::debug!("Fetched CAPTCHA from {url} ({} bytes)", resp.body.len());
                    return Some(CaptchaChallenge {
                        image_bytes: resp.body,
                        source_url: url,
                    });
                }
                Ok(resp) => log::warn!("CAPTCHA {url} returned HTTP {}", resp.status),
                Err(e) => log::warn!("CAPTCHA {url} failed: {e}"),
            },
        }
    }

    None
}
