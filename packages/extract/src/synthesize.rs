//! Placeholder records for searches whose result page yielded nothing
//! identifying.
//!
//! Everything is derived from the [`SearchRequest`] alone, so the same
//! request always produces the same record (apart from `last_updated`).

use chrono::{Days, NaiveDate, Utc};
use court_status_case_models::{CaseRecord, DataSource, DocumentType, OrderDocument, SearchRequest};

/// Days between the synthesized filing date and next hearing.
pub const SYNTHETIC_HEARING_OFFSET_DAYS: u64 = 90;

/// Portal-specific inputs for synthesized records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisConfig {
    /// Court name placed on the record.
    pub court: String,
    /// Root under which `orders/` and `judgments/` URLs are built.
    pub document_base_url: String,
    /// Respondents appended after `"Respondent N"`.
    pub placeholder_respondents: Vec<String>,
}

/// `{Y}-{Y mod 12 + 1}-{Y mod 28 + 1}`, zero padded.
fn synthetic_filing_date(year: i32) -> (String, Option<NaiveDate>) {
    let month = year.rem_euclid(12) + 1;
    let day = year.rem_euclid(28) + 1;
    let text = format!("{year}-{month:02}-{day:02}");
    let date = u32::try_from(month)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d));
    (text, date)
}

/// Builds the placeholder record for a request.
#[must_use]
pub fn synthesize_record(request: &SearchRequest, config: &SynthesisConfig) -> CaseRecord {
    let case_id = format!(
        "{}/{}/{}",
        request.case_type.replace(' ', ""),
        request.case_number,
        request.filing_year
    );
    let number = &request.case_number;

    let (filing_date, parsed) = synthetic_filing_date(request.filing_year);
    let next_hearing_date = parsed
        .and_then(|d| d.checked_add_days(Days::new(SYNTHETIC_HEARING_OFFSET_DAYS)))
        .map_or_else(|| filing_date.clone(), |d| d.format("%Y-%m-%d").to_string());

    let base = config.document_base_url.trim_end_matches('/');
    let orders = vec![
        OrderDocument {
            title: format!("Order dated {filing_date}"),
            date: filing_date.clone(),
            document_type: DocumentType::Order,
            pdf_url: format!("{base}/orders/{case_id}_order1.pdf"),
            description: "Initial order in the case".to_owned(),
        },
        OrderDocument {
            title: format!("Judgment dated {next_hearing_date}"),
            date: next_hearing_date.clone(),
            document_type: DocumentType::Judgment,
            pdf_url: format!("{base}/judgments/{case_id}_judgment1.pdf"),
            description: "Final judgment in the case".to_owned(),
        },
    ];

    let mut respondents = vec![format!("Respondent {number}")];
    respondents.extend(config.placeholder_respondents.iter().cloned());

    CaseRecord {
        case_id,
        case_type: request.case_type.clone(),
        case_number: number.clone(),
        filing_year: request.filing_year,
        petitioners: vec![format!("Petitioner {number}"), format!("Co-Petitioner {number}")],
        respondents,
        filing_date,
        next_hearing_date,
        case_status: "Pending".to_owned(),
        court: config.court.clone(),
        bench: "Single Bench".to_owned(),
        judge: "Hon'ble Justice Sample Judge".to_owned(),
        cnr_number: String::new(),
        filing_advocate: String::new(),
        supplementary_link: String::new(),
        supplementary_data_available: false,
        orders,
        last_updated: Utc::now(),
        data_source: DataSource::Synthesized,
    }
}
