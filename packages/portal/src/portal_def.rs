//! Config-driven court portal definition.
//!
//! [`PortalDefinition`] captures everything unique about a portal (where
//! its search page lives, how the search is submitted, which payload names
//! it expects, and how its result pages are read) in a serializable config
//! struct, so a single [`crate::CourtScraper`] serves every portal.

use std::collections::BTreeMap;
use std::time::Duration;

use court_status_extract::ExtractorConfig;
use court_status_extract::documents::DEFAULT_DOCUMENT_EXTENSIONS;
use court_status_extract::rules::{ExtractionRule, default_rules};
use court_status_extract::synthesize::SynthesisConfig;
use court_status_scraper::FormMethod;
use court_status_scraper::form::{
    CAPTCHA_FETCH_TIMEOUT, DEFAULT_CAPTCHA_SELECTORS, DEFAULT_FORM_SELECTORS, owned,
};
use court_status_scraper::locator::{
    DEFAULT_CANDIDATE_PATHS, DEFAULT_PAGE_KEYWORDS, LocatorConfig, PROBE_TIMEOUT,
};
use court_status_scraper::submit::{FieldMap, SUBMIT_TIMEOUT};
use serde::Deserialize;

// ── Top-level portal definition ──────────────────────────────────────────

/// A complete, config-driven court portal definition.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalDefinition {
    /// Unique identifier (e.g., `"delhi_high_court"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Court name placed on every record.
    pub court: String,
    /// Portal root URL that candidate paths are joined onto.
    pub base_url: String,
    /// URL probed by the status check. Defaults to `base_url`.
    #[serde(default)]
    pub status_url: Option<String>,
    /// Root for synthesized document URLs.
    pub document_base_url: String,
    /// Respondents appended to synthesized records.
    #[serde(default)]
    pub placeholder_respondents: Vec<String>,
    /// Extra request headers, overriding the browser defaults.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Link extensions treated as documents.
    #[serde(default = "default_document_extensions")]
    pub document_extensions: Vec<String>,
    /// How the search page is found.
    #[serde(default)]
    pub search: SearchConfig,
    /// Where and how the search is sent.
    pub submit: SubmitTarget,
    /// Payload field names.
    #[serde(default)]
    pub fields: FieldMap,
    /// Case types offered by the portal.
    #[serde(default)]
    pub case_types: CaseTypeList,
    /// Extraction rules. Empty means the built-in rule set.
    #[serde(default)]
    pub rules: Vec<ExtractionRule>,
}

fn default_document_extensions() -> Vec<String> {
    owned(DEFAULT_DOCUMENT_EXTENSIONS)
}

// ── Search page discovery ────────────────────────────────────────────────

/// Search page discovery settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Relative paths probed in order.
    pub candidate_paths: Vec<String>,
    /// Keywords marking a page as search-related.
    pub keywords: Vec<String>,
    /// Whether the bare base URL is probed last.
    pub fallback_to_base: bool,
    /// Selectors identifying the search form.
    pub form_selectors: Vec<String>,
    /// Selectors identifying the CAPTCHA image.
    pub captcha_selectors: Vec<String>,
    /// Timeout for each probe, in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidate_paths: owned(DEFAULT_CANDIDATE_PATHS),
            keywords: owned(DEFAULT_PAGE_KEYWORDS),
            fallback_to_base: true,
            form_selectors: owned(DEFAULT_FORM_SELECTORS),
            captcha_selectors: owned(DEFAULT_CAPTCHA_SELECTORS),
            timeout_secs: PROBE_TIMEOUT.as_secs(),
        }
    }
}

// ── Submission target ────────────────────────────────────────────────────

/// Where the search payload is sent.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmitTarget {
    /// The action of the form found on the search page.
    Form {
        /// Submission timeout in seconds.
        #[serde(default = "default_submit_timeout_secs")]
        timeout_secs: u64,
        /// Pause before submitting, in milliseconds.
        #[serde(default)]
        delay_ms: u64,
    },
    /// A known endpoint. A form on the search page is optional and only
    /// contributes its hidden fields.
    Fixed {
        /// Endpoint URL.
        url: String,
        /// Method to send with.
        #[serde(default)]
        method: FormMethod,
        /// Submission timeout in seconds.
        #[serde(default = "default_submit_timeout_secs")]
        timeout_secs: u64,
        /// Pause before submitting, in milliseconds.
        #[serde(default)]
        delay_ms: u64,
    },
}

const fn default_submit_timeout_secs() -> u64 {
    SUBMIT_TIMEOUT.as_secs()
}

impl SubmitTarget {
    /// Submission timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        match self {
            Self::Form { timeout_secs, .. } | Self::Fixed { timeout_secs, .. } => {
                Duration::from_secs(*timeout_secs)
            }
        }
    }

    /// Pause before submitting.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        match self {
            Self::Form { delay_ms, .. } | Self::Fixed { delay_ms, .. } => {
                Duration::from_millis(*delay_ms)
            }
        }
    }
}

// ── Case types ───────────────────────────────────────────────────────────

/// The case types a portal lists in its search form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseTypeList {
    /// Case type labels, in the portal's order.
    #[serde(default)]
    pub values: Vec<String>,
}

impl PortalDefinition {
    /// Returns the unique portal identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable portal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL probed by the status check.
    #[must_use]
    pub fn status_url(&self) -> &str {
        self.status_url.as_deref().unwrap_or(&self.base_url)
    }

    /// Timeout for fetching the CAPTCHA image.
    #[must_use]
    pub const fn captcha_timeout(&self) -> Duration {
        CAPTCHA_FETCH_TIMEOUT
    }

    /// Locator settings for this portal.
    #[must_use]
    pub fn locator_config(&self) -> LocatorConfig {
        let mut config = LocatorConfig::new(&self.base_url)
            .with_candidate_paths(self.search.candidate_paths.clone())
            .with_timeout(Duration::from_secs(self.search.timeout_secs));
        config.keywords.clone_from(&self.search.keywords);
        config.form_selectors.clone_from(&self.search.form_selectors);
        config.fallback_to_base = self.search.fallback_to_base;
        config
    }

    /// Extractor settings for this portal.
    #[must_use]
    pub fn extractor_config(&self) -> ExtractorConfig {
        let rules = if self.rules.is_empty() {
            default_rules()
        } else {
            self.rules.clone()
        };
        ExtractorConfig {
            rules,
            document_extensions: self.document_extensions.clone(),
            synthesis: SynthesisConfig {
                court: self.court.clone(),
                document_base_url: self.document_base_url.clone(),
                placeholder_respondents: self.placeholder_respondents.clone(),
            },
        }
    }
}

/// Parses a [`PortalDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or missing required fields.
pub fn parse_portal_toml(toml_str: &str) -> Result<PortalDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}
