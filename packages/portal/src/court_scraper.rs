//! The case search pipeline for one portal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use court_status_captcha::{CaptchaSolver, OcrEngine, SolvedCaptcha};
use court_status_case_models::{CaseRecord, PipelineResult, PortalStatus, SearchRequest};
use court_status_extract::CaseExtractor;
use court_status_scraper::form::{fetch_captcha, find_search_form};
use court_status_scraper::locator::locate_search_page;
use court_status_scraper::submit::{Submission, build_payload, submit_search};
use court_status_scraper::{HttpClient, ReqwestSession};

use crate::portal_def::{PortalDefinition, SubmitTarget};
use crate::registry::portal_by_id;
use crate::settings::ScraperSettings;
use crate::{PortalError, SearchError};

/// Timeout for the reachability check.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// A successful run before it is wrapped into a [`PipelineResult`].
struct SearchOutcome {
    record: CaseRecord,
    search_url: String,
    captcha_used: bool,
}

/// Searches one court portal over a single HTTP session.
pub struct CourtScraper {
    portal: PortalDefinition,
    client: Arc<dyn HttpClient>,
    solver: CaptchaSolver,
    extractor: CaseExtractor,
    debug_dir: Option<PathBuf>,
}

impl std::fmt::Debug for CourtScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourtScraper")
            .field("portal", &self.portal.id)
            .field("debug_dir", &self.debug_dir)
            .finish_non_exhaustive()
    }
}

impl CourtScraper {
    /// Creates a scraper over an existing client and OCR engine.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Extract`] if the portal's extraction rules do
    /// not compile.
    pub fn new(
        portal: PortalDefinition,
        client: Arc<dyn HttpClient>,
        engine: Arc<dyn OcrEngine>,
    ) -> Result<Self, PortalError> {
        let extractor = CaseExtractor::new(portal.extractor_config())?;
        Ok(Self {
            portal,
            client,
            solver: CaptchaSolver::new(engine),
            extractor,
            debug_dir: None,
        })
    }

    /// Creates a scraper with a fresh cookie-holding session carrying the
    /// portal's headers.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] if the session cannot be built or the rules
    /// do not compile.
    pub fn with_session(
        portal: PortalDefinition,
        engine: Arc<dyn OcrEngine>,
    ) -> Result<Self, PortalError> {
        let session = ReqwestSession::with_headers(&portal.headers)?;
        Self::new(portal, Arc::new(session), engine)
    }

    /// Creates a scraper for the embedded portal named in `settings`, using
    /// Tesseract as configured there.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] if the portal is unknown, the session cannot
    /// be built, or the rules do not compile.
    pub fn from_settings(settings: &ScraperSettings) -> Result<Self, PortalError> {
        Self::for_portal(portal_by_id(&settings.portal_id)?, settings)
    }

    /// Creates a scraper for `portal`, taking Tesseract and the debug
    /// directory from `settings`. The settings' portal id is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] if the session cannot be built or the rules
    /// do not compile.
    pub fn for_portal(
        portal: PortalDefinition,
        settings: &ScraperSettings,
    ) -> Result<Self, PortalError> {
        let scraper = Self::with_session(portal, Arc::new(settings.ocr_engine()))?;
        Ok(match &settings.debug_dir {
            Some(dir) => scraper.with_debug_dir(dir.clone()),
            None => scraper,
        })
    }

    /// Writes every result page into `dir`.
    #[must_use]
    pub fn with_debug_dir(mut self, dir: PathBuf) -> Self {
        self.debug_dir = Some(dir);
        self
    }

    /// The portal this scraper searches.
    #[must_use]
    pub const fn portal(&self) -> &PortalDefinition {
        &self.portal
    }

    /// Case types offered by the portal.
    #[must_use]
    pub fn get_case_types(&self) -> Vec<String> {
        self.portal.case_types.values.clone()
    }

    /// Checks whether the portal answers.
    pub async fn get_portal_status(&self) -> PortalStatus {
        let url = self.portal.status_url();
        log::debug!("[{}] Checking {url}", self.portal.id);

        match self.client.get(url, STATUS_TIMEOUT).await {
            Ok(resp) => {
                let accessible = resp.is_ok();
                PortalStatus {
                    accessible,
                    status_code: Some(resp.status),
                    response_time: Some(resp.elapsed.as_secs_f64()),
                    last_checked: Utc::now(),
                    error: (!accessible).then(|| format!("HTTP {}", resp.status)),
                }
            }
            Err(e) => {
                log::warn!("[{}] Status check failed: {e}", self.portal.id);
                PortalStatus {
                    accessible: false,
                    status_code: None,
                    response_time: None,
                    last_checked: Utc::now(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Runs one search end to end.
    ///
    /// Never fails: every failure is reported through the returned
    /// [`PipelineResult`]. Takes `&mut self` so one session serves one
    /// search at a time.
    #[allow(clippy::needless_pass_by_ref_mut)]
    pub async fn search_case(
        &mut self,
        case_type: &str,
        case_number: &str,
        filing_year: i32,
    ) -> PipelineResult {
        let request = SearchRequest::new(case_type, case_number, filing_year);
        log::info!("[{}] Searching {request}", self.portal.id);

        match self.run_search(&request).await {
            Ok(outcome) => {
                log::info!(
                    "[{}] Found {} ({})",
                    self.portal.id,
                    outcome.record.case_id,
                    outcome.record.data_source
                );
                PipelineResult::success(outcome.record, &outcome.search_url, outcome.captcha_used)
            }
            Err(e) => {
                log::error!("[{}] Search for {request} failed: {e}", self.portal.id);
                e.into()
            }
        }
    }

    async fn run_search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        if request.case_type.is_empty() {
            return Err(SearchError::InvalidRequest("case type is empty".to_owned()));
        }
        if request.case_number.is_empty() {
            return Err(SearchError::InvalidRequest("case number is empty".to_owned()));
        }

        let client = self.client.as_ref();
        let page = locate_search_page(client, &self.portal.locator_config()).await?;

        let solved = self.solve_captcha(&page.html, &page.url).await;

        let form = find_search_form(&page.html, &page.url, &self.portal.search.form_selectors);
        let (url, method, hidden) = match &self.portal.submit {
            SubmitTarget::Form { .. } => {
                let form = form.ok_or_else(|| SearchError::FormNotFound(page.url.clone()))?;
                (form.action_url, form.method, form.hidden_fields)
            }
            SubmitTarget::Fixed { url, method, .. } => (
                url.clone(),
                *method,
                form.map(|f| f.hidden_fields).unwrap_or_default(),
            ),
        };

        let submission = Submission {
            fields: build_payload(&hidden, &self.portal.fields, request, &solved.token),
            url,
            method,
        };
        let response = submit_search(
            client,
            &submission,
            self.portal.submit.timeout(),
            self.portal.submit.delay(),
        )
        .await?;

        let html = response.text();
        if let Some(dir) = &self.debug_dir {
            self.dump_result_page(dir, request, &html).await;
        }

        let record = self
            .extractor
            .extract_case(client, &html, &response.url, request)
            .await;

        Ok(SearchOutcome {
            record,
            search_url: submission.url,
            captcha_used: !solved.is_empty(),
        })
    }

    async fn solve_captcha(&self, html: &str, page_url: &str) -> SolvedCaptcha {
        let Some(challenge) = fetch_captcha(
            self.client.as_ref(),
            html,
            page_url,
            &self.portal.search.captcha_selectors,
            self.portal.captcha_timeout(),
        )
        .await
        else {
            return SolvedCaptcha::default();
        };

        let solved = self.solver.solve_async(challenge.image_bytes).await;
        if solved.is_empty() {
            log::warn!(
                "[{}] CAPTCHA from {} unsolved, submitting without it",
                self.portal.id,
                challenge.source_url
            );
        }
        solved
    }

    async fn dump_result_page(&self, dir: &Path, request: &SearchRequest, html: &str) {
        let path = dir.join(debug_file_name(&self.portal.id, request));
        let written = match tokio::fs::create_dir_all(dir).await {
            Ok(()) => tokio::fs::write(&path, html).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => log::debug!("[{}] Wrote result page to {}", self.portal.id, path.display()),
            Err(e) => log::warn!("[{}] Could not write {}: {e}", self.portal.id, path.display()),
        }
    }
}

/// `{portal}_{type}_{number}_{year}.html` with every non-alphanumeric
/// character of the request replaced by `_`.
fn debug_file_name(portal_id: &str, request: &SearchRequest) -> String {
    let safe = |s: &str| {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect::<String>()
    };
    format!(
        "{portal_id}_{}_{}_{}.html",
        safe(&request.case_type),
        safe(&request.case_number),
        request.filing_year
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use court_status_captcha::{CaptchaError, OcrOptions};
    use court_status_case_models::{DataSource, PipelineErrorKind, PipelineStatus};
    use court_status_scraper::{FormMethod, HttpError, HttpResponse};

    use super::*;
    use crate::portal_def::parse_portal_toml;

    type Request = (String, String, Vec<(String, String)>);

    /// Serves canned pages and records every request.
    #[derive(Default)]
    struct FakePortal {
        pages: BTreeMap<String, (u16, Vec<u8>)>,
        timeouts: Vec<String>,
        requests: Mutex<Vec<Request>>,
    }

    impl FakePortal {
        fn page(mut self, url: &str, status: u16, body: &str) -> Self {
            self.pages
                .insert(url.to_owned(), (status, body.as_bytes().to_vec()));
            self
        }

        fn bytes(mut self, url: &str, body: Vec<u8>) -> Self {
            self.pages.insert(url.to_owned(), (200, body));
            self
        }

        fn timing_out(mut self, url: &str) -> Self {
            self.timeouts.push(url.to_owned());
            self
        }

        fn submissions(&self) -> Vec<Request> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|(method, _, _)| method != "get")
                .cloned()
                .collect()
        }

        fn respond(&self, url: &str, timeout: Duration) -> Result<HttpResponse, HttpError> {
            if self.timeouts.iter().any(|u| u == url) {
                return Err(HttpError::Timeout(timeout));
            }
            let (status, body) = self
                .pages
                .get(url)
                .cloned()
                .ok_or_else(|| HttpError::Connect(format!("no route to {url}")))?;
            Ok(HttpResponse {
                status,
                url: url.to_owned(),
                body,
                elapsed: Duration::from_millis(120),
            })
        }
    }

    #[async_trait]
    impl HttpClient for FakePortal {
        async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, HttpError> {
            self.requests
                .lock()
                .unwrap()
                .push(("get".to_owned(), url.to_owned(), Vec::new()));
            self.respond(url, timeout)
        }

        async fn submit_form(
            &self,
            method: FormMethod,
            url: &str,
            fields: &[(String, String)],
            timeout: Duration,
        ) -> Result<HttpResponse, HttpError> {
            self.requests
                .lock()
                .unwrap()
                .push((method.as_str().to_owned(), url.to_owned(), fields.to_vec()));
            self.respond(url, timeout)
        }
    }

    /// Returns a fixed answer and counts calls.
    struct ScriptedOcr {
        answer: &'static str,
        calls: AtomicUsize,
    }

    impl ScriptedOcr {
        fn answering(answer: &'static str) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl OcrEngine for ScriptedOcr {
        fn recognize(&self, _png: &[u8], _options: &OcrOptions) -> Result<String, CaptchaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.to_owned())
        }
    }

    const FORM_PORTAL: &str = r#"
        id = "test_court"
        name = "Test Court"
        court = "Test High Court"
        base_url = "https://court.example"
        document_base_url = "https://court.example"
        placeholder_respondents = ["State"]

        [search]
        candidate_paths = ["/case_status", "/search"]

        [submit]
        type = "form"

        [case_types]
        values = ["W.P.(C)", "CRL.A."]
    "#;

    const FIXED_PORTAL: &str = r#"
        id = "test_fixed"
        name = "Test Fixed"
        court = "Test High Court"
        base_url = "https://court.example"
        status_url = "https://status.court.example"
        document_base_url = "https://court.example"

        [search]
        candidate_paths = ["/pcase/guiCaseWise.php"]
        fallback_to_base = false

        [submit]
        type = "fixed"
        url = "https://court.example/pcase/case_history.php"

        [fields]
        case_type = "ctype"
        case_number = "regno"
        filing_year = "regyr"
        captcha = ["captcha_code"]
    "#;

    const SEARCH_PAGE: &str = r#"
        <html><body>
        <h1>Case Status</h1>
        <form id="caseSearch" method="post" action="/result.php">
            <input type="hidden" name="token" value="abc123">
            <select name="case_type"><option>W.P.(C)</option></select>
            <input name="case_number"><input name="filing_year">
            <img src="/captcha.php" alt="captcha">
            <input name="captcha">
        </form>
        </body></html>"#;

    const RESULT_PAGE: &str = r#"
        <table>
        <tr><td>WP(C)-623/2024</td></tr>
        <tr><td>Petitioner: Ram Kumar and Shyam Lal</td></tr>
        <tr><td>Respondent: Union of India</td></tr>
        <tr><td>Next Hearing: 15/03/2025</td></tr>
        <tr><td>Status : PENDING</td></tr>
        </table>
        <a href="/orders/623_1.pdf">Order dated 10/02/2024</a>"#;

    fn captcha_png() -> Vec<u8> {
        let img = image::GrayImage::from_fn(40, 16, |x, _| {
            if x % 7 < 3 {
                image::Luma([20])
            } else {
                image::Luma([230])
            }
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn setup(toml: &str, portal: FakePortal, ocr: Arc<ScriptedOcr>) -> (CourtScraper, Arc<FakePortal>) {
        let portal_client = Arc::new(portal);
        let scraper = CourtScraper::new(
            parse_portal_toml(toml).unwrap(),
            portal_client.clone(),
            ocr,
        )
        .unwrap();
        (scraper, portal_client)
    }

    #[tokio::test]
    async fn extracts_case_from_result_page() {
        let fake = FakePortal::default()
            .page("https://court.example/case_status", 200, SEARCH_PAGE)
            .bytes("https://court.example/captcha.php", captcha_png())
            .page("https://court.example/result.php", 200, RESULT_PAGE);
        let ocr = ScriptedOcr::answering(" AB12 \n");
        let (mut scraper, fake) = setup(FORM_PORTAL, fake, ocr.clone());

        let result = scraper.search_case("W.P.(C)", "623", 2024).await;

        assert_eq!(result.status, PipelineStatus::Success);
        assert!(result.captcha_used);
        assert_eq!(result.search_url.as_deref(), Some("https://court.example/result.php"));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);

        let record = result.case_data.unwrap();
        assert_eq!(record.case_id, "WP(C)-623/2024");
        assert_eq!(record.petitioners, vec!["Ram Kumar", "Shyam Lal"]);
        assert_eq!(record.respondents, vec!["Union of India"]);
        assert_eq!(record.next_hearing_date, "15/03/2025");
        assert_eq!(record.case_status, "PENDING");
        assert_eq!(record.court, "Test High Court");
        assert_eq!(record.orders.len(), 1);
        assert_eq!(record.data_source, DataSource::Extracted);

        let submissions = fake.submissions();
        assert_eq!(submissions.len(), 1);
        let (method, _, fields) = &submissions[0];
        assert_eq!(method, "post");
        assert_eq!(
            fields,
            &vec![
                ("token".to_owned(), "abc123".to_owned()),
                ("case_type".to_owned(), "W.P.(C)".to_owned()),
                ("case_number".to_owned(), "623".to_owned()),
                ("filing_year".to_owned(), "2024".to_owned()),
                ("captcha".to_owned(), "AB12".to_owned()),
                ("verification_code".to_owned(), "AB12".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn unidentified_result_is_synthesized() {
        let fake = FakePortal::default()
            .page("https://court.example/case_status", 200, SEARCH_PAGE)
            .bytes("https://court.example/captcha.php", captcha_png())
            .page("https://court.example/result.php", 200, "<p>No record found</p>");
        let (mut scraper, _) = setup(FORM_PORTAL, fake, ScriptedOcr::answering("XY9"));

        let result = scraper.search_case("W.P. (C)", "623", 2024).await;

        assert!(result.is_success());
        let record = result.case_data.unwrap();
        assert_eq!(record.case_id, "W.P.(C)/623/2024");
        assert_eq!(record.orders.len(), 2);
        assert_eq!(record.respondents, vec!["Respondent 623", "State"]);
        assert_eq!(record.data_source, DataSource::Synthesized);
    }

    #[tokio::test]
    async fn unreachable_portal_is_reported() {
        let fake = FakePortal::default()
            .page("https://court.example/case_status", 503, "down")
            .page("https://court.example/search", 404, "missing")
            .page("https://court.example", 500, "error");
        let (mut scraper, _) = setup(FORM_PORTAL, fake, ScriptedOcr::answering("AB12"));

        let status = scraper.get_portal_status().await;
        assert!(!status.accessible);
        assert_eq!(status.status_code, Some(500));
        assert_eq!(status.error.as_deref(), Some("HTTP 500"));

        let result = scraper.search_case("W.P.(C)", "623", 2024).await;
        assert_eq!(result.status, PipelineStatus::Error);
        assert_eq!(result.error_kind, Some(PipelineErrorKind::PortalUnreachable));
        assert!(result.error_message.unwrap().contains("unreachable"));
        assert!(result.case_data.is_none());
    }

    #[tokio::test]
    async fn proceeds_without_captcha_when_page_has_none() {
        let page = SEARCH_PAGE.replace(r#"<img src="/captcha.php" alt="captcha">"#, "");
        let fake = FakePortal::default()
            .page("https://court.example/case_status", 200, &page)
            .page("https://court.example/result.php", 200, RESULT_PAGE);
        let ocr = ScriptedOcr::answering("AB12");
        let (mut scraper, fake) = setup(FORM_PORTAL, fake, ocr.clone());

        let result = scraper.search_case("W.P.(C)", "623", 2024).await;

        assert!(result.is_success());
        assert!(!result.captcha_used);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
        let (_, _, fields) = &fake.submissions()[0];
        assert!(fields.iter().all(|(name, _)| name != "captcha"));
    }

    #[tokio::test]
    async fn unreadable_captcha_is_left_out() {
        let fake = FakePortal::default()
            .page("https://court.example/case_status", 200, SEARCH_PAGE)
            .page("https://court.example/captcha.php", 200, "not an image")
            .page("https://court.example/result.php", 200, RESULT_PAGE);
        let (mut scraper, fake) = setup(FORM_PORTAL, fake, ScriptedOcr::answering("AB12"));

        let result = scraper.search_case("W.P.(C)", "623", 2024).await;

        assert!(result.is_success());
        assert!(!result.captcha_used);
        let (_, _, fields) = &fake.submissions()[0];
        assert!(fields.iter().all(|(name, _)| name != "captcha"));
    }

    #[tokio::test]
    async fn form_portal_without_form_fails() {
        let fake = FakePortal::default().page(
            "https://court.example/case_status",
            200,
            "<p>Case status service is under maintenance</p>",
        );
        let (mut scraper, _) = setup(FORM_PORTAL, fake, ScriptedOcr::answering("AB12"));

        let result = scraper.search_case("W.P.(C)", "623", 2024).await;

        assert_eq!(result.error_kind, Some(PipelineErrorKind::FormNotFound));
        assert_eq!(
            result.error_message.as_deref(),
            Some("No search form found on https://court.example/case_status")
        );
    }

    #[tokio::test]
    async fn fixed_endpoint_uses_portal_field_names() {
        let page = r#"<h2>Case Wise Search</h2>
            <img src="captcha_code_file.php?rand=1">"#;
        let fake = FakePortal::default()
            .page("https://court.example/pcase/guiCaseWise.php", 200, page)
            .bytes(
                "https://court.example/pcase/captcha_code_file.php?rand=1",
                captcha_png(),
            )
            .page("https://court.example/pcase/case_history.php", 200, RESULT_PAGE);
        let (mut scraper, fake) = setup(FIXED_PORTAL, fake, ScriptedOcr::answering("k7Q2"));

        let result = scraper.search_case("W.P.(C)", "623", 2024).await;

        assert!(result.is_success());
        assert_eq!(
            result.search_url.as_deref(),
            Some("https://court.example/pcase/case_history.php")
        );
        let (_, url, fields) = &fake.submissions()[0];
        assert_eq!(url, "https://court.example/pcase/case_history.php");
        assert_eq!(
            fields,
            &vec![
                ("ctype".to_owned(), "W.P.(C)".to_owned()),
                ("regno".to_owned(), "623".to_owned()),
                ("regyr".to_owned(), "2024".to_owned()),
                ("captcha_code".to_owned(), "k7Q2".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn submission_timeout_is_classified() {
        let page = "<h2>Case Wise Search</h2>";
        let fake = FakePortal::default()
            .page("https://court.example/pcase/guiCaseWise.php", 200, page)
            .timing_out("https://court.example/pcase/case_history.php");
        let (mut scraper, _) = setup(FIXED_PORTAL, fake, ScriptedOcr::answering(""));

        let result = scraper.search_case("W.P.(C)", "623", 2024).await;

        assert_eq!(result.error_kind, Some(PipelineErrorKind::SubmissionTimeout));
        assert_eq!(
            result.error_message.as_deref(),
            Some("Request timeout - portal may be slow or unavailable")
        );
    }

    #[tokio::test]
    async fn submission_http_error_is_classified() {
        let fake = FakePortal::default()
            .page("https://court.example/pcase/guiCaseWise.php", 200, "<p>Case search</p>")
            .page("https://court.example/pcase/case_history.php", 502, "bad gateway");
        let (mut scraper, _) = setup(FIXED_PORTAL, fake, ScriptedOcr::answering(""));

        let result = scraper.search_case("W.P.(C)", "623", 2024).await;

        assert_eq!(result.error_kind, Some(PipelineErrorKind::SubmissionHttpError));
        assert_eq!(result.error_message.as_deref(), Some("HTTP error: 502"));
    }

    #[tokio::test]
    async fn empty_case_type_is_rejected_before_any_request() {
        let (mut scraper, fake) =
            setup(FORM_PORTAL, FakePortal::default(), ScriptedOcr::answering(""));

        let result = scraper.search_case("  ", "623", 2024).await;

        assert_eq!(result.error_kind, Some(PipelineErrorKind::InvalidRequest));
        assert!(fake.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_reports_response_time() {
        let fake = FakePortal::default().page("https://status.court.example", 200, "ok");
        let (scraper, _) = setup(FIXED_PORTAL, fake, ScriptedOcr::answering(""));

        let status = scraper.get_portal_status().await;

        assert!(status.accessible);
        assert_eq!(status.status_code, Some(200));
        assert_eq!(status.response_time, Some(0.12));
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn status_without_response_has_no_code() {
        let (scraper, _) = setup(FIXED_PORTAL, FakePortal::default(), ScriptedOcr::answering(""));

        let status = scraper.get_portal_status().await;

        assert!(!status.accessible);
        assert_eq!(status.status_code, None);
        assert_eq!(status.response_time, None);
        assert!(status.error.unwrap().contains("no route"));
    }

    #[tokio::test]
    async fn writes_result_page_to_debug_dir() {
        let dir = std::env::temp_dir().join(format!("court_status_debug_{}", std::process::id()));
        let fake = FakePortal::default()
            .page("https://court.example/pcase/guiCaseWise.php", 200, "<p>Case search</p>")
            .page("https://court.example/pcase/case_history.php", 200, RESULT_PAGE);
        let (scraper, _) = setup(FIXED_PORTAL, fake, ScriptedOcr::answering(""));
        let mut scraper = scraper.with_debug_dir(dir.clone());

        let result = scraper.search_case("W.P.(C)", "623", 2024).await;
        assert!(result.is_success());

        let written = tokio::fs::read_to_string(dir.join("test_fixed_W_P__C__623_2024.html"))
            .await
            .unwrap();
        assert_eq!(written, RESULT_PAGE);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn builds_from_settings() {
        let settings = ScraperSettings {
            debug_dir: Some(PathBuf::from("/tmp/court_status")),
            ..ScraperSettings::default()
        };
        let scraper = CourtScraper::from_settings(&settings).unwrap();
        assert_eq!(scraper.portal().id(), "delhi_high_court");
        assert_eq!(scraper.debug_dir, Some(PathBuf::from("/tmp/court_status")));

        let unknown = ScraperSettings {
            portal_id: "nowhere".to_owned(),
            ..ScraperSettings::default()
        };
        assert!(matches!(
            CourtScraper::from_settings(&unknown),
            Err(PortalError::UnknownPortal(_))
        ));
    }

    #[test]
    fn builds_for_file_portal_with_settings() {
        let settings = ScraperSettings {
            portal_id: "nowhere".to_owned(),
            debug_dir: Some(PathBuf::from("/tmp/court_status")),
            ..ScraperSettings::default()
        };
        let scraper =
            CourtScraper::for_portal(parse_portal_toml(FIXED_PORTAL).unwrap(), &settings).unwrap();
        assert_eq!(scraper.portal().id(), "test_fixed");
        assert_eq!(scraper.debug_dir, Some(PathBuf::from("/tmp/court_status")));
    }

    #[test]
    fn lists_case_types() {
        let (scraper, _) = setup(FORM_PORTAL, FakePortal::default(), ScriptedOcr::answering(""));
        assert_eq!(scraper.get_case_types(), vec!["W.P.(C)", "CRL.A."]);
    }
}
