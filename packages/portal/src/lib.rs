#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Court portal definitions and the case search pipeline.
//!
//! Every portal is described by a TOML [`portal_def::PortalDefinition`]
//! (embedded ones live in [`registry`]). A [`CourtScraper`] drives one
//! portal end to end: locate the search page, solve the CAPTCHA, submit the
//! search, and extract the case record. Failures never escape as `Err`;
//! every search ends in a [`PipelineResult`].

pub mod court_scraper;
pub mod portal_def;
pub mod registry;
pub mod settings;

pub use court_scraper::CourtScraper;
pub use court_status_case_models::{
    CaseRecord, PipelineErrorKind, PipelineResult, PipelineStatus, PortalStatus,
};
pub use portal_def::PortalDefinition;
pub use settings::ScraperSettings;

use court_status_extract::ExtractError;
use court_status_scraper::submit::SubmitError;
use court_status_scraper::{HttpError, ScrapeError};

/// Errors that can occur while setting up a scraper.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// A portal definition is invalid.
    #[error("Portal config error: {0}")]
    Config(String),

    /// No embedded portal has the requested id.
    #[error("Unknown portal '{0}'")]
    UnknownPortal(String),

    /// Reading a definition from disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP session could not be created.
    #[error("HTTP session error: {0}")]
    Http(#[from] HttpError),

    /// The portal's extraction rules are invalid.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Terminal failures of a single search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request cannot be searched.
    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    /// No search page could be fetched.
    #[error("Portal unreachable: {0}")]
    PortalUnreachable(String),

    /// The search page has no recognizable form.
    #[error("No search form found on {0}")]
    FormNotFound(String),

    /// Submitting the search failed.
    #[error(transparent)]
    Submission(#[from] SubmitError),

    /// Anything else.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl SearchError {
    /// The failure category reported on the [`PipelineResult`].
    #[must_use]
    pub const fn kind(&self) -> PipelineErrorKind {
        match self {
            Self::InvalidRequest(_) => PipelineErrorKind::InvalidRequest,
            Self::PortalUnreachable(_) => PipelineErrorKind::PortalUnreachable,
            Self::FormNotFound(_) => PipelineErrorKind::FormNotFound,
            Self::Submission(SubmitError::HttpStatus(_)) => PipelineErrorKind::SubmissionHttpError,
            Self::Submission(SubmitError::Timeout) => PipelineErrorKind::SubmissionTimeout,
            Self::Submission(SubmitError::Connection(_)) => {
                PipelineErrorKind::SubmissionConnectionError
            }
            Self::Submission(SubmitError::Unexpected(_)) | Self::Unexpected(_) => {
                PipelineErrorKind::Unexpected
            }
        }
    }
}

impl From<ScrapeError> for SearchError {
    fn from(e: ScrapeError) -> Self {
        match e {
            ScrapeError::PortalUnreachable(msg) => Self::PortalUnreachable(msg),
            ScrapeError::Http(e) => Self::PortalUnreachable(e.to_string()),
            other @ (ScrapeError::Parse(_) | ScrapeError::InvalidUrl { .. }) => {
                Self::Unexpected(other.to_string())
            }
        }
    }
}

impl From<SearchError> for PipelineResult {
    fn from(e: SearchError) -> Self {
        Self::error(e.kind(), e.to_string())
    }
}
