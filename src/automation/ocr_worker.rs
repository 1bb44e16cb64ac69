//! OCR workers for the two-region layout.
//!
//! Each region is recognized on its own scoped thread and both are joined
//! before the loop compares anything.

use anyhow::{anyhow, Result};
use image::RgbaImage;
use std::thread;

use crate::ocr::{recognize_crop, TextRecognizer};

/// Recognizes both crops, concurrently if `parallel` is set.
///
/// Always returns one result per crop, in input order.
pub fn recognize_regions(
    recognizer: &dyn TextRecognizer,
    crops: &[RgbaImage; 2],
    parallel: bool,
) -> [Result<String>; 2] {
    if !parallel {
        return [
            recognize_crop(recognizer, &crops[0]),
            recognize_crop(recognizer, &crops[1]),
        ];
    }

    thread::scope(|s| {
        let first = s.spawn(|| recognize_crop(recognizer, &crops[0]));
        let second = s.spawn(|| recognize_crop(recognizer, &crops[1]));
        [join_worker(first), join_worker(second)]
    })
}

fn join_worker(handle: thread::ScopedJoinHandle<'_, Result<String>>) -> Result<String> {
    handle
        .join()
        .unwrap_or_else(|_| Err(anyhow!("OCR worker thread panicked")))
}
