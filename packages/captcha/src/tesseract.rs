//! [`OcrEngine`] backed by the Tesseract command-line binary.
//!
//! The preprocessed PNG is piped through stdin and the recognized text is
//! read from stdout, so no temporary files are involved.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::{CaptchaError, OcrEngine, OcrOptions};

/// Default binary name, resolved through `PATH`.
pub const DEFAULT_TESSERACT_CMD: &str = "tesseract";

/// Recognition language passed to `-l`.
const LANGUAGE: &str = "eng";

/// Runs the `tesseract` executable for each recognition.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new(DEFAULT_TESSERACT_CMD)
    }
}

impl TesseractCli {
    /// Creates an engine that runs the given binary.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            tessdata_dir: None,
        }
    }

    /// Points Tesseract at an explicit language data directory.
    #[must_use]
    pub fn with_tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }

    /// The binary this engine runs.
    #[must_use]
    pub const fn binary(&self) -> &PathBuf {
        &self.binary
    }

    fn command(&self, options: &OcrOptions) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("stdin").arg("stdout");
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.arg("-l")
            .arg(LANGUAGE)
            .arg("--oem")
            .arg(options.engine_mode.to_string())
            .arg("--psm")
            .arg(options.page_segmentation.to_string())
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", options.whitelist))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, png: &[u8], options: &OcrOptions) -> Result<String, CaptchaError> {
        let mut child = self.command(options).spawn().map_err(|e| {
            CaptchaError::Ocr(format!(
                "failed to start {}: {e}",
                self.binary.display()
            ))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(png)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(CaptchaError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
