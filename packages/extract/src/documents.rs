//! Order and judgment links on a result page.

use std::sync::LazyLock;

use court_status_case_models::{DocumentType, OrderDocument};
use court_status_scraper::{element_text, parse_selector, resolve_url};
use regex::Regex;
use scraper::Html;

static LINK_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{4}").unwrap_or_else(|_| unreachable!())
});

/// Extensions treated as downloadable documents when none are configured.
pub const DEFAULT_DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// Whether a link target ends in one of `extensions` (query and fragment
/// ignored, case-insensitive).
#[must_use]
pub fn has_document_extension(href: &str, extensions: &[String]) -> bool {
    let path = href
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .to_lowercase();
    extensions
        .iter()
        .any(|ext| path.ends_with(&format!(".{}", ext.trim_start_matches('.').to_lowercase())))
}

/// Collects every document link on the page, in document order.
///
/// The title is the link text (or `"Document"`), the date is the first
/// `d/m/yyyy`-shaped date in the title, and the type is inferred from the
/// title.
#[must_use]
pub fn extract_documents(html: &str, page_url: &str, extensions: &[String]) -> Vec<OrderDocument> {
    let Ok(anchor_sel) = parse_selector("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    document
        .select(&anchor_sel)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            if !has_document_extension(href, extensions) {
                return None;
            }
            let pdf_url = match resolve_url(page_url, href) {
                Ok(url) => url,
                Err(e) => {
                    log::debug!("Skipping document link: {e}");
                    return None;
                }
            };

            let text = element_text(&a);
            let title = if text.is_empty() {
                "Document".to_owned()
            } else {
                text
            };
            let date = LINK_DATE
                .find(&title)
                .map(|m| m.as_str().to_owned())
                .unwrap_or_default();
            let document_type = DocumentType::from_title(&title);
            let description = match document_type {
                DocumentType::Order => "Court order",
                DocumentType::Judgment => "Court judgment",
                DocumentType::Document => "Court document",
            };

            Some(OrderDocument {
                title,
                date,
                document_type,
                pdf_url,
                description: description.to_owned(),
            })
        })
        .collect()
}
