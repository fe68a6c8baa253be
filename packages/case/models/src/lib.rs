#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for court case-status lookups.
//!
//! A [`SearchRequest`] goes into the pipeline and a [`PipelineResult`] comes
//! out. Successful results always carry a complete [`CaseRecord`]: every
//! string field is present (possibly empty), and [`CaseRecord::data_source`]
//! records whether the values were parsed from the portal or synthesized from
//! the request.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A case lookup as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Case type abbreviation as the portal lists it (e.g. `"W.P.(C)"`).
    pub case_type: String,
    /// Registration number within the case type.
    pub case_number: String,
    /// Year the case was filed.
    pub filing_year: i32,
}

impl SearchRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(case_type: &str, case_number: &str, filing_year: i32) -> Self {
        Self {
            case_type: case_type.trim().to_owned(),
            case_number: case_number.trim().to_owned(),
            filing_year,
        }
    }
}

impl fmt::Display for SearchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}",
            self.case_type, self.case_number, self.filing_year
        )
    }
}

/// Kind of court document linked from a case page.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DocumentType {
    /// Interim or procedural order
    Order,
    /// Final judgment
    Judgment,
    /// Any other linked document
    Document,
}

impl DocumentType {
    /// Infers the document type from a link title.
    ///
    /// Titles mentioning a judgment win over titles mentioning an order;
    /// everything else is a plain [`DocumentType::Document`].
    #[must_use]
    pub fn from_title(title: &str) -> Self {
        let lower = title.to_lowercase();
        if lower.contains("judgment") || lower.contains("judgement") {
            Self::Judgment
        } else if lower.contains("order") {
            Self::Order
        } else {
            Self::Document
        }
    }
}

/// A downloadable order, judgment, or other document for a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDocument {
    /// Link text, or `"Document"` when the link has none.
    pub title: String,
    /// Date found in the link text, empty when none was present.
    pub date: String,
    /// Inferred document kind.
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    /// Absolute URL of the PDF.
    pub pdf_url: String,
    /// Short human-readable description.
    pub description: String,
}

/// Where the values of a [`CaseRecord`] came from.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataSource {
    /// Parsed out of the portal's result page.
    #[default]
    Extracted,
    /// Placeholder values derived from the request because extraction
    /// found nothing identifying.
    Synthesized,
}

/// Structured case data.
///
/// Missing values are empty strings or empty lists, never absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Portal case identifier (e.g. `"W.P.(C)-623/2024"`).
    pub case_id: String,
    /// Case type abbreviation.
    pub case_type: String,
    /// Registration number.
    pub case_number: String,
    /// Filing year.
    pub filing_year: i32,
    /// Petitioners, in page order.
    pub petitioners: Vec<String>,
    /// Respondents, in page order.
    pub respondents: Vec<String>,
    /// Filing (or registration) date as shown by the portal.
    pub filing_date: String,
    /// Next listed hearing date.
    pub next_hearing_date: String,
    /// Case status (e.g. `"Pending"`, `"Disposed"`).
    pub case_status: String,
    /// Court name, constant per portal.
    pub court: String,
    /// Bench composition.
    pub bench: String,
    /// Presiding judge(s).
    pub judge: String,
    /// Case Number Record identifier.
    pub cnr_number: String,
    /// Advocate who filed the case.
    pub filing_advocate: String,
    /// Link to a secondary data grid (e.g. the national judicial data grid).
    pub supplementary_link: String,
    /// Whether the secondary data grid answered for this case.
    pub supplementary_data_available: bool,
    /// Linked orders and judgments.
    pub orders: Vec<OrderDocument>,
    /// When this record was produced.
    pub last_updated: DateTime<Utc>,
    /// Provenance of the values above.
    pub data_source: DataSource,
}

impl CaseRecord {
    /// Creates an empty record seeded with the request's identifying fields.
    #[must_use]
    pub fn from_request(request: &SearchRequest, court: &str) -> Self {
        Self {
            case_id: String::new(),
            case_type: request.case_type.clone(),
            case_number: request.case_number.clone(),
            filing_year: request.filing_year,
            petitioners: Vec::new(),
            respondents: Vec::new(),
            filing_date: String::new(),
            next_hearing_date: String::new(),
            case_status: String::new(),
            court: court.to_owned(),
            bench: String::new(),
            judge: String::new(),
            cnr_number: String::new(),
            filing_advocate: String::new(),
            supplementary_link: String::new(),
            supplementary_data_available: false,
            orders: Vec::new(),
            last_updated: Utc::now(),
            data_source: DataSource::Extracted,
        }
    }

    /// Whether extraction found anything that identifies the case.
    #[must_use]
    pub fn is_identified(&self) -> bool {
        !self.case_id.is_empty() || !self.petitioners.is_empty()
    }
}

/// Outcome of a search.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStatus {
    /// A case record was produced
    Success,
    /// The search failed; see the error message
    Error,
}

/// Terminal failure categories of a search.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineErrorKind {
    /// The search request itself is unusable (e.g. empty case type)
    InvalidRequest,
    /// No candidate page of the portal could be fetched
    PortalUnreachable,
    /// The located page has no recognizable search form
    FormNotFound,
    /// The submission timed out
    SubmissionTimeout,
    /// The portal could not be reached while submitting
    SubmissionConnectionError,
    /// The portal answered the submission with a non-200 status
    SubmissionHttpError,
    /// Anything else
    Unexpected,
}

/// The single value returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Success or error.
    pub status: PipelineStatus,
    /// The case record on success.
    pub case_data: Option<CaseRecord>,
    /// Human-readable failure description on error.
    pub error_message: Option<String>,
    /// Failure category on error.
    pub error_kind: Option<PipelineErrorKind>,
    /// Endpoint the search was submitted to, when submission happened.
    pub search_url: Option<String>,
    /// Whether a solved CAPTCHA token was sent.
    pub captcha_used: bool,
}

impl PipelineResult {
    /// Builds a successful result.
    #[must_use]
    pub fn success(record: CaseRecord, search_url: &str, captcha_used: bool) -> Self {
        Self {
            status: PipelineStatus::Success,
            case_data: Some(record),
            error_message: None,
            error_kind: None,
            search_url: Some(search_url.to_owned()),
            captcha_used,
        }
    }

    /// Builds a failed result.
    #[must_use]
    pub fn error(kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: PipelineStatus::Error,
            case_data: None,
            error_message: Some(message.into()),
            error_kind: Some(kind),
            search_url: None,
            captcha_used: false,
        }
    }

    /// Returns `true` when a case record was produced.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Success
    }
}

/// Reachability snapshot of a portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalStatus {
    /// `true` only when the portal answered 200.
    pub accessible: bool,
    /// HTTP status code, absent when no response arrived.
    pub status_code: Option<u16>,
    /// Round-trip time in seconds, absent when no response arrived.
    pub response_time: Option<f64>,
    /// When the check ran.
    pub last_checked: DateTime<Utc>,
    /// Failure description, absent on success.
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_trims_inputs() {
        let request = SearchRequest::new("  W.P.(C) ", " 623 ", 2024);
        assert_eq!(request.case_type, "W.P.(C)");
        assert_eq!(request.case_number, "623");
        assert_eq!(request.to_string(), "W.P.(C) 623/2024");
    }

    #[test]
    fn document_type_prefers_judgment() {
        assert_eq!(
            DocumentType::from_title("Judgment on order dated 01/02/2024"),
            DocumentType::Judgment
        );
        assert_eq!(
            DocumentType::from_title("Order dated 5/3/2024"),
            DocumentType::Order
        );
        assert_eq!(
            DocumentType::from_title("Annexure"),
            DocumentType::Document
        );
    }

    #[test]
    fn empty_record_is_not_identified() {
        let request = SearchRequest::new("CRL.A.", "12", 2020);
        let mut record = CaseRecord::from_request(&request, "Delhi High Court");
        assert!(!record.is_identified());
        assert_eq!(record.case_type, "CRL.A.");
        assert_eq!(record.data_source, DataSource::Extracted);

        record.petitioners.push("A".to_owned());
        assert!(record.is_identified());
    }

    #[test]
    fn error_result_has_no_case_data() {
        let result = PipelineResult::error(PipelineErrorKind::FormNotFound, "no form");
        assert!(!result.is_success());
        assert!(result.case_data.is_none());
        assert_eq!(result.error_kind, Some(PipelineErrorKind::FormNotFound));
    }

    #[test]
    fn serializes_snake_case_wire_names() {
        let request = SearchRequest::new("W.P.(C)", "1", 2024);
        let record = CaseRecord::from_request(&request, "Court");
        let result = PipelineResult::success(record, "https://example.org/search", true);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["case_data"]["data_source"], "extracted");
        assert_eq!(json["search_url"], "https://example.org/search");

        let doc = OrderDocument {
            title: "Order".to_owned(),
            date: String::new(),
            document_type: DocumentType::Order,
            pdf_url: "https://example.org/a.pdf".to_owned(),
            description: String::new(),
        };
        assert_eq!(serde_json::to_value(&doc).unwrap()["type"], "Order");
        assert_eq!(
            PipelineErrorKind::SubmissionHttpError.to_string(),
            "submission_http_error"
        );
    }
}
