#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CAPTCHA solving for court portal search forms.
//!
//! [`preprocess`] normalizes the raw image, an [`OcrEngine`] reads it, and
//! [`CaptchaSolver`] cleans the result down to an alphanumeric token. The
//! solver never fails: any error yields an empty [`SolvedCaptcha`], which
//! callers treat as "submit without a CAPTCHA".

pub mod preprocess;
pub mod tesseract;

use std::sync::Arc;

pub use tesseract::TesseractCli;

/// Errors that can occur while reading a CAPTCHA.
#[derive(Debug, thiserror::Error)]
pub enum CaptchaError {
    /// The image bytes could not be decoded.
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// The preprocessed image could not be encoded for OCR.
    #[error("Image encode error: {0}")]
    Encode(image::ImageError),

    /// The decoded image has no pixels.
    #[error("Image is empty")]
    EmptyImage,

    /// The decoded image exceeds [`preprocess::MAX_SOURCE_DIMENSION`].
    #[error("Image too large: {width}x{height}")]
    TooLarge {
        /// Source width in pixels.
        width: u32,
        /// Source height in pixels.
        height: u32,
    },

    /// The OCR engine failed.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Characters a CAPTCHA token may contain.
pub const ALPHANUMERIC_WHITELIST: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Recognition settings handed to the [`OcrEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOptions {
    /// Allowed output characters.
    pub whitelist: String,
    /// Tesseract page segmentation mode (8 = single word).
    pub page_segmentation: u8,
    /// Tesseract engine mode (3 = default, LSTM when available).
    pub engine_mode: u8,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            whitelist: ALPHANUMERIC_WHITELIST.to_owned(),
            page_segmentation: 8,
            engine_mode: 3,
        }
    }
}

/// Text recognition over a preprocessed PNG image.
///
/// Implementations are blocking; [`CaptchaSolver::solve_async`] moves them
/// off the async runtime.
pub trait OcrEngine: Send + Sync {
    /// Returns the raw recognized text.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError`] if recognition fails.
    fn recognize(&self, png: &[u8], options: &OcrOptions) -> Result<String, CaptchaError>;
}

/// A cleaned CAPTCHA answer. Empty when solving failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolvedCaptcha {
    /// Alphanumeric token, possibly empty.
    pub token: String,
}

impl SolvedCaptcha {
    /// Returns `true` when there is nothing to submit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

/// Preprocesses CAPTCHA images and reads them with an [`OcrEngine`].
#[derive(Clone)]
pub struct CaptchaSolver {
    engine: Arc<dyn OcrEngine>,
    options: OcrOptions,
}

impl std::fmt::Debug for CaptchaSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaSolver")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl CaptchaSolver {
    /// Creates a solver with single-word alphanumeric recognition.
    #[must_use]
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            engine,
            options: OcrOptions::default(),
        }
    }

    /// Preprocesses and reads the image, returning the cleaned token.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError`] if preprocessing or recognition fails.
    pub fn try_solve(&self, image_bytes: &[u8]) -> Result<String, CaptchaError> {
        let png = preprocess::preprocess_to_png(image_bytes)?;
        let raw = self.engine.recognize(&png, &self.options)?;
        Ok(clean_token(&raw, &self.options.whitelist))
    }

    /// Like [`Self::try_solve`] but maps every failure to an empty token.
    #[must_use]
    pub fn solve(&self, image_bytes: &[u8]) -> SolvedCaptcha {
        match self.try_solve(image_bytes) {
            Ok(token) => {
                log::debug!("CAPTCHA read as '{token}'");
                SolvedCaptcha { token }
            }
            Err(e) => {
                log::warn!("CAPTCHA could not be solved: {e}");
                SolvedCaptcha::default()
            }
        }
    }

    /// Runs [`Self::solve`] on the blocking thread pool.
    pub async fn solve_async(&self, image_bytes: Vec<u8>) -> SolvedCaptcha {
        let solver = self.clone();
        match tokio::task::spawn_blocking(move || solver.solve(&image_bytes)).await {
            Ok(solved) => solved,
            Err(e) => {
                log::warn!("CAPTCHA task failed: {e}");
                SolvedCaptcha::default()
            }
        }
    }
}

/// Keeps only whitelisted characters of raw OCR output.
#[must_use]
pub fn clean_token(raw: &str, whitelist: &str) -> String {
    raw.chars().filter(|c| whitelist.contains(*c)).collect()
}
