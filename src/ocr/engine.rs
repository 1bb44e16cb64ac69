use anyhow::{anyhow, Result};
use image::GrayImage;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;

/// Turns a preprocessed image into text.
///
/// `Sync` so one recognizer can serve both region workers.
pub trait TextRecognizer: Sync {
    fn recognize(&self, img: &GrayImage) -> Result<String>;
}

/// Runs the Tesseract command line tool.
#[derive(Clone, Debug)]
pub struct Tesseract {
    paths: TesseractPaths,
    psm: u8,
    lang: String,
}

impl Tesseract {
    pub fn new(paths: TesseractPaths, psm: u8) -> Self {
        Self {
            paths,
            psm,
            lang: "eng".to_string(),
        }
    }

    /// Arguments for reading `input` and printing the text to stdout.
    fn args(&self, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![input.into(), "stdout".into()];
        if let Some(tessdata) = &self.paths.tessdata {
            args.push("--tessdata-dir".into());
            args.push(tessdata.into());
        }
        args.push("-l".into());
        args.push(self.lang.clone().into());
        args.push("--psm".into());
        args.push(self.psm.to_string().into());
        args
    }
}

impl TextRecognizer for Tesseract {
    fn recognize(&self, img: &GrayImage) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        let output = Command::new(&self.paths.executable)
            .args(self.args(temp_input.path()))
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
