#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case data extraction from court portal result pages.
//!
//! A single engine evaluates an ordered list of [`rules::ExtractionRule`]s
//! against the page markup or its visible text. Document links are collected
//! separately ([`documents`]). When a page yields neither a case identifier
//! nor a petitioner, [`synthesize`] builds a placeholder record instead, so
//! callers always get a complete [`CaseRecord`].

pub mod documents;
pub mod parties;
pub mod rules;
pub mod synthesize;

use std::time::Duration;

use court_status_case_models::{CaseRecord, SearchRequest};
use court_status_scraper::HttpClient;
use scraper::Html;

use crate::parties::{clean_value, split_parties};
use crate::rules::{CaseField, CompiledRule, ExtractionRule, RuleMode, RuleSource};
use crate::synthesize::{SynthesisConfig, synthesize_record};

/// Timeout for the supplementary data-grid lookup.
pub const SUPPLEMENTARY_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur while building an extractor.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A rule's regex does not compile.
    #[error("Invalid pattern in rule '{label}': {reason}")]
    InvalidPattern {
        /// Rule label.
        label: String,
        /// Regex compiler message.
        reason: String,
    },
}

/// Extractor settings.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Rules in evaluation order.
    pub rules: Vec<ExtractionRule>,
    /// Link extensions treated as documents.
    pub document_extensions: Vec<String>,
    /// Inputs for placeholder records.
    pub synthesis: SynthesisConfig,
}

/// Compiled extractor for one portal.
#[derive(Debug, Clone)]
pub struct CaseExtractor {
    rules: Vec<CompiledRule>,
    document_extensions: Vec<String>,
    synthesis: SynthesisConfig,
}

/// Visible text of a page, one trimmed text node per line.
#[must_use]
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl CaseExtractor {
    /// Compiles the configured rules.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidPattern`] if any rule fails to compile.
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            rules: rules::compile_rules(&config.rules)?,
            document_extensions: config.document_extensions,
            synthesis: config.synthesis,
        })
    }

    /// Runs every rule over `html` and applies the matches to `record`.
    ///
    /// With `fill_only`, overriding rules behave like fill-if-empty ones so
    /// values already on the record are kept.
    pub fn apply_rules(&self, html: &str, record: &mut CaseRecord, fill_only: bool) {
        let text = page_text(html);

        for compiled in &self.rules {
            let rule = &compiled.rule;
            let input = match rule.source {
                RuleSource::Html => html,
                RuleSource::Text => text.as_str(),
            };
            let Some(found) = compiled.find(input) else {
                continue;
            };
            let overriding = rule.mode == RuleMode::Override && !fill_only;

            if rule.field.is_party_list() {
                let parties = split_parties(&clean_value(&found.value));
                let target = match rule.field {
                    CaseField::Petitioners => &mut record.petitioners,
                    _ => &mut record.respondents,
                };
                if !parties.is_empty() && (overriding || target.is_empty()) {
                    log::debug!("Rule '{}' matched {} parties", rule.label, parties.len());
                    *target = parties;
                }
                continue;
            }

            let value = clean_value(&found.value);
            if value.is_empty() {
                continue;
            }
            let Some(target) = scalar_field(record, rule.field) else {
                continue;
            };
            if !overriding && !target.is_empty() {
                continue;
            }
            log::debug!("Rule '{}' matched '{value}'", rule.label);
            *target = value;

            if rule.field == CaseField::CaseId {
                if let Some(case_type) = found.case_type {
                    record.case_type = case_type;
                }
                if let Some(number) = found.case_number {
                    record.case_number = number;
                }
                if let Some(year) = found.filing_year.and_then(|y| y.parse().ok()) {
                    record.filing_year = year;
                }
            }
        }
    }

    /// Parses a result page into a record without the placeholder fallback.
    #[must_use]
    pub fn extract(&self, html: &str, page_url: &str, request: &SearchRequest) -> CaseRecord {
        let mut record = CaseRecord::from_request(request, &self.synthesis.court);
        self.apply_rules(html, &mut record, false);
        record.orders =
            documents::extract_documents(html, page_url, &self.document_extensions);
        record
    }

    /// Replaces an unidentified record with a synthesized one.
    #[must_use]
    pub fn or_synthesized(&self, record: CaseRecord, request: &SearchRequest) -> CaseRecord {
        if record.is_identified() {
            return record;
        }
        log::warn!("No identifying data for {request}, synthesizing a placeholder record");
        synthesize_record(request, &self.synthesis)
    }

    /// Fetches the record's supplementary link and fills empty fields from
    /// it. Failures are logged and leave the record unchanged.
    pub async fn enrich(&self, client: &dyn HttpClient, record: &mut CaseRecord) {
        if record.supplementary_link.is_empty() {
            return;
        }
        let link = record.supplementary_link.clone();
        log::info!("Fetching supplementary case data from {link}");

        match client.get(&link, SUPPLEMENTARY_TIMEOUT).await {
            Ok(resp) if resp.is_ok() => {
                record.supplementary_data_available = true;
                let html = resp.text();
                self.apply_rules(&html, record, true);
                if record.orders.is_empty() {
                    record.orders =
                        documents::extract_documents(&html, &resp.url, &self.document_extensions);
                }
            }
            Ok(resp) => log::warn!("Supplementary lookup returned HTTP {}", resp.status),
            Err(e) => log::warn!("Supplementary lookup failed: {e}"),
        }
    }

    /// Full extraction: rules, documents, supplementary lookup, then the
    /// placeholder fallback.
    pub async fn extract_case(
        &self,
        client: &dyn HttpClient,
        html: &str,
        page_url: &str,
        request: &SearchRequest,
    ) -> CaseRecord {
        let mut record = self.extract(html, page_url, request);
        self.enrich(client, &mut record).await;
        self.or_synthesized(record, request)
    }
}

fn scalar_field(record: &mut CaseRecord, field: CaseField) -> Option<&mut String> {
    Some(match field {
        CaseField::CaseId => &mut record.case_id,
        CaseField::FilingDate => &mut record.filing_date,
        CaseField::NextHearingDate => &mut record.next_hearing_date,
        CaseField::CaseStatus => &mut record.case_status,
        CaseField::Bench => &mut record.bench,
        CaseField::Judge => &mut record.judge,
        CaseField::CnrNumber => &mut record.cnr_number,
        CaseField::FilingAdvocate => &mut record.filing_advocate,
        CaseField::SupplementaryLink => &mut record.supplementary_link,
        CaseField::Petitioners | CaseField::Respondents => return None,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use court_status_case_models::DataSource;
    use court_status_scraper::{FormMethod, HttpError, HttpResponse};

    use super::*;
    use crate::documents::DEFAULT_DOCUMENT_EXTENSIONS;

    const RESULT_URL: &str = "https://dhcmisc.nic.in/pcase/case_history.php";

    const DELHI_RESULT: &str = r#"
        <html><body><table>
        <tr><td><font><b>RAM KUMAR &amp; ANR. Vs.</b></td></tr><tr><td align="left"><font size="2"><b>STATE OF NCT OF DELHI</b></td></tr>
        <tr><td>W.P.(C)-623/2024</td></tr>
        <tr><td>Date of Filing : 02/01/2024</td></tr>
        <tr><td>Date of Registration : 05/01/2024</td></tr>
        <tr><td>CNR No. : DLHC010000012024</td></tr>
        <tr><td>Status : PENDING</td></tr>
        <tr><td>Filing Advocate : S. SHARMA</td></tr>
        </table>
        <form method="post" action="https://lobis.nic.in/dhcindex.php?cno=623&amp;yr=2024"></form>
        <a href="/orders/623_2024_1.pdf">Order dated 10/02/2024</a>
        </body></html>"#;

    struct Grid {
        pages: BTreeMap<String, (u16, String)>,
    }

    #[async_trait]
    impl HttpClient for Grid {
        async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, HttpError> {
            let (status, body) = self
                .pages
                .get(url)
                .cloned()
                .ok_or_else(|| HttpError::Connect(url.to_owned()))?;
            Ok(HttpResponse {
                status,
                url: url.to_owned(),
                body: body.into_bytes(),
                elapsed: Duration::ZERO,
            })
        }

        async fn submit_form(
            &self,
            _method: FormMethod,
            url: &str,
            _fields: &[(String, String)],
            timeout: Duration,
        ) -> Result<HttpResponse, HttpError> {
            self.get(url, timeout).await
        }
    }

    fn extractor() -> CaseExtractor {
        CaseExtractor::new(ExtractorConfig {
            rules: rules::default_rules(),
            document_extensions: DEFAULT_DOCUMENT_EXTENSIONS.iter().map(|s| (*s).to_owned()).collect(),
            synthesis: SynthesisConfig {
                court: "Delhi High Court".to_owned(),
                document_base_url: "https://delhihighcourt.nic.in".to_owned(),
                placeholder_respondents: vec!["State of Delhi".to_owned(), "Union of India".to_owned()],
            },
        })
        .unwrap()
    }

    fn request() -> SearchRequest {
        SearchRequest::new("W.P.(C)", "623", 2024)
    }

    #[test]
    fn extracts_delhi_result_page() {
        let record = extractor().extract(DELHI_RESULT, RESULT_URL, &request());

        assert_eq!(record.case_id, "W.P.(C)-623/2024");
        assert_eq!(record.case_type, "W.P.(C)");
        assert_eq!(record.case_number, "623");
        assert_eq!(record.filing_year, 2024);
        assert_eq!(record.cnr_number, "DLHC010000012024");
        assert_eq!(record.case_status, "PENDING");
        assert_eq!(record.filing_advocate, "S. SHARMA");
        assert_eq!(record.petitioners, vec!["RAM KUMAR & ANR."]);
        assert_eq!(record.respondents, vec!["STATE OF NCT OF DELHI"]);
        assert_eq!(
            record.supplementary_link,
            "https://lobis.nic.in/dhcindex.php?cno=623&yr=2024"
        );
        assert_eq!(record.orders.len(), 1);
        assert_eq!(record.orders[0].pdf_url, "https://dhcmisc.nic.in/orders/623_2024_1.pdf");
        assert_eq!(record.data_source, DataSource::Extracted);
    }

    #[test]
    fn registration_date_overrides_filing_date() {
        let record = extractor().extract(DELHI_RESULT, RESULT_URL, &request());
        assert_eq!(record.filing_date, "05/01/2024");

        let blank = DELHI_RESULT.replace("Date of Registration : 05/01/2024", "Date of Registration : ");
        let record = extractor().extract(&blank, RESULT_URL, &request());
        assert_eq!(record.filing_date, "02/01/2024");
    }

    #[test]
    fn text_rules_handle_labeled_layout() {
        let html = r"
            <div><span>Case No:</span> <span>CRL.A.-45/2021</span></div>
            <p>Petitioner: A. Singh, B. Singh and C. Singh</p>
            <p>Respondent: State</p>
            <p>Next Hearing: 15-11-2024</p>
            <p>Bench: Division Bench</p>
            <p>Coram: Hon'ble Mr. Justice X</p>";

        let record = extractor().extract(html, RESULT_URL, &SearchRequest::new("CRL.A.", "45", 2021));

        assert_eq!(record.case_id, "CRL.A.-45/2021");
        assert_eq!(record.petitioners, vec!["A. Singh", "B. Singh", "C. Singh"]);
        assert_eq!(record.respondents, vec!["State"]);
        assert_eq!(record.next_hearing_date, "15-11-2024");
        assert_eq!(record.bench, "Division Bench");
        assert_eq!(record.judge, "Hon'ble Mr. Justice X");
    }

    #[test]
    fn first_matching_party_rule_wins() {
        let html = "<p>Applicant: First Person</p><p>Respondent: X</p><p>Plaintiff: Second Person</p>";
        let record = extractor().extract(html, RESULT_URL, &request());
        assert_eq!(record.petitioners, vec!["First Person"]);
    }

    #[test]
    fn unidentified_page_is_synthesized() {
        let ex = extractor();
        let record = ex.extract("<html><body>No record found</body></html>", RESULT_URL, &request());
        assert!(!record.is_identified());

        let record = ex.or_synthesized(record, &request());
        assert_eq!(record.case_id, "W.P.(C)/623/2024");
        assert_eq!(record.orders.len(), 2);
        assert_eq!(record.data_source, DataSource::Synthesized);
    }

    #[test]
    fn no_record_page_with_party_hint_is_synthesized() {
        let html = r"
            <html><body>
            <p>No record found.</p>
            <p>Try searching by Petitioner/Respondent name.</p>
            </body></html>";
        let ex = extractor();
        let record = ex.extract(html, RESULT_URL, &request());
        assert!(record.petitioners.is_empty());
        assert!(record.respondents.is_empty());

        let record = ex.or_synthesized(record, &request());
        assert_eq!(record.data_source, DataSource::Synthesized);
        assert_eq!(record.petitioners, vec!["Petitioner 623", "Co-Petitioner 623"]);
    }

    #[test]
    fn party_capture_stops_before_footer() {
        let html = r"
            <table><tr><td>Petitioner: RAM KUMAR</td></tr></table>
            <div class='footer'>Copyright 2024, High Court of Delhi and All rights reserved</div>";
        let record = extractor().extract(html, RESULT_URL, &request());
        assert_eq!(record.petitioners, vec!["RAM KUMAR"]);
    }

    #[tokio::test]
    async fn supplementary_lookup_fills_empty_fields() {
        let html = r#"<td>WP(C)-9/2023</td><form action="https://lobis.nic.in/x.php?c=9"></form>"#;
        let grid = Grid {
            pages: BTreeMap::from([(
                "https://lobis.nic.in/x.php?c=9".to_owned(),
                (200, "<p>Next Hearing: 01/12/2024</p><p>Status : DISPOSED</p>".to_owned()),
            )]),
        };

        let record = extractor()
            .extract_case(&grid, html, RESULT_URL, &SearchRequest::new("WP(C)", "9", 2023))
            .await;

        assert!(record.supplementary_data_available);
        assert_eq!(record.case_id, "WP(C)-9/2023");
        assert_eq!(record.next_hearing_date, "01/12/2024");
        assert_eq!(record.case_status, "DISPOSED");
    }

    #[tokio::test]
    async fn failed_supplementary_lookup_is_not_fatal() {
        let grid = Grid {
            pages: BTreeMap::new(),
        };
        let record = extractor()
            .extract_case(&grid, DELHI_RESULT, RESULT_URL, &request())
            .await;

        assert!(!record.supplementary_data_available);
        assert_eq!(record.case_id, "W.P.(C)-623/2024");
    }
}
