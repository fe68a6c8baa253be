//! Runtime settings read from the environment.

use std::path::PathBuf;

use court_status_captcha::TesseractCli;
use court_status_captcha::tesseract::DEFAULT_TESSERACT_CMD;

/// Portal used when `COURT_STATUS_PORTAL` is unset.
pub const DEFAULT_PORTAL_ID: &str = "delhi_high_court";

/// Settings for building a [`crate::CourtScraper`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperSettings {
    /// Tesseract binary (`TESSERACT_CMD`).
    pub tesseract_cmd: PathBuf,
    /// Tesseract language data directory (`TESSDATA_PREFIX`).
    pub tessdata_dir: Option<PathBuf>,
    /// Embedded portal id (`COURT_STATUS_PORTAL`).
    pub portal_id: String,
    /// Directory receiving raw result pages (`COURT_STATUS_DEBUG_DIR`).
    pub debug_dir: Option<PathBuf>,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from(DEFAULT_TESSERACT_CMD),
            tessdata_dir: None,
            portal_id: DEFAULT_PORTAL_ID.to_owned(),
            debug_dir: None,
        }
    }
}

impl ScraperSettings {
    /// Reads settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; empty values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            tesseract_cmd: get("TESSERACT_CMD").map_or(defaults.tesseract_cmd, PathBuf::from),
            tessdata_dir: get("TESSDATA_PREFIX").map(PathBuf::from),
            portal_id: get("COURT_STATUS_PORTAL").unwrap_or(defaults.portal_id),
            debug_dir: get("COURT_STATUS_DEBUG_DIR").map(PathBuf::from),
        }
    }

    /// The OCR engine these settings describe.
    #[must_use]
    pub fn ocr_engine(&self) -> TesseractCli {
        let engine = TesseractCli::new(&self.tesseract_cmd);
        match &self.tessdata_dir {
            Some(dir) => engine.with_tessdata_dir(dir),
            None => engine,
        }
    }
}
