pub mod setup;
pub mod preprocess;
pub mod engine;
pub mod extract;

pub use setup::ensure_tesseract;
pub use preprocess::{crop_region, preprocess_for_digits};
pub use engine::{Tesseract, TextRecognizer};
pub use extract::{extract_pair, extract_single};

use anyhow::Result;
use image::RgbaImage;

/// High-level function: cropped region → raw OCR text.
///
/// Preprocesses the crop for digits and runs the recognizer on it.
/// An empty crop yields empty text without invoking the recognizer.
pub fn recognize_crop(recognizer: &dyn TextRecognizer, cropped: &RgbaImage) -> Result<String> {
    if cropped.width() == 0 || cropped.height() == 0 {
        crate::log("OCR skipped: empty crop");
        return Ok(String::new());
    }
    let preprocessed = preprocess_for_digits(cropped);
    let text = recognizer.recognize(&preprocessed)?;
    crate::log(&format!("OCR result: {}", text.trim()));
    Ok(text)
}
