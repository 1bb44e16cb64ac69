//! Automation runner - the capture/crop/recognize/compare/draw loop.
//!
//! Every iteration starts from a fresh screenshot. Failures are logged and
//! the loop moves on to the next iteration.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::automation::compare::{compare_numbers, draw_symbol};
use crate::automation::config::{BotConfig, PixelRect, RegionMode};
use crate::automation::ocr_worker::recognize_regions;
use crate::automation::state::{LoopSummary, Outcome};
use crate::capture::Device;
use crate::ocr::{crop_region, extract_pair, extract_single, recognize_crop, TextRecognizer};

/// Everything one iteration needs.
pub struct BotContext<'a> {
    pub device: &'a dyn Device,
    pub recognizer: &'a dyn TextRecognizer,
    pub config: BotConfig,
    pub mode: RegionMode,
    /// Directory for the screenshot and crop files
    pub screenshot_dir: PathBuf,
}

impl<'a> BotContext<'a> {
    /// Creates a new context, validating the configured regions.
    pub fn new(
        device: &'a dyn Device,
        recognizer: &'a dyn TextRecognizer,
        config: BotConfig,
        screenshot_dir: PathBuf,
    ) -> Result<Self> {
        let mode = config.region_mode()?;
        Ok(Self {
            device,
            recognizer,
            config,
            mode,
            screenshot_dir,
        })
    }

    fn screenshot_path(&self) -> PathBuf {
        self.screenshot_dir.join("screenshot.png")
    }

    /// Crops `region` and saves it under `file_name` for inspection.
    fn crop_and_save(
        &self,
        img: &RgbaImage,
        region: &PixelRect,
        file_name: &str,
    ) -> Result<RgbaImage> {
        let cropped = crop_region(img, region);
        let path = self.screenshot_dir.join(file_name);
        if cropped.width() > 0 && cropped.height() > 0 {
            cropped
                .save(&path)
                .with_context(|| format!("Failed to save {}", path.display()))?;
            crate::log(&format!("Cropped region saved to {}", path.display()));
        } else {
            crate::log(&format!(
                "Crop region {:?} lies outside the {}x{} screenshot",
                region,
                img.width(),
                img.height()
            ));
        }
        Ok(cropped)
    }

    /// Reads both operands from the screenshot.
    fn read_operands(&self, img: &RgbaImage) -> Result<Option<(String, String)>> {
        match &self.mode {
            RegionMode::Single(region) => {
                let cropped = self.crop_and_save(img, region, "cropped_area.png")?;
                let text = recognize_crop(self.recognizer, &cropped)?;
                extract_pair(&text)
            }
            RegionMode::Dual([left, right]) => {
                let crops = [
                    self.crop_and_save(img, left, "cropped_area_1.png")?,
                    self.crop_and_save(img, right, "cropped_area_2.png")?,
                ];
                let [first, second] =
                    recognize_regions(self.recognizer, &crops, self.config.parallel_ocr);
                let first = extract_single(&first?)?;
                let second = extract_single(&second?)?;
                Ok(first.zip(second))
            }
        }
    }

    /// Runs one iteration: sleep, capture, crop, recognize, compare and draw.
    pub fn run_iteration(&self) -> Result<Outcome> {
        thread::sleep(Duration::from_millis(self.config.poll_interval_ms));

        let screenshot_path = self.screenshot_path();
        // Never read last iteration's screenshot
        remove_stale_screenshot(&screenshot_path)?;
        self.device.capture_screenshot(&screenshot_path)?;

        if !screenshot_path.exists() {
            crate::log(&format!(
                "Image file does not exist: {}",
                screenshot_path.display()
            ));
            return Ok(Outcome::MissingImage);
        }

        let img = load_screenshot(&screenshot_path)?;

        let Some((left, right)) = self.read_operands(&img)? else {
            crate::log("Could not recognize two valid numbers.");
            return Ok(Outcome::Unrecognized);
        };

        crate::log(&format!("Recognized numbers: {}, {}", left, right));

        match compare_numbers(&left, &right) {
            Ok(symbol) => {
                crate::log(&format!("{} {} {}", left, symbol, right));
                draw_symbol(self.device, symbol, &self.config.strokes)?;
                Ok(Outcome::Drawn(symbol))
            }
            Err(e) => {
                crate::log(&format!("Recognized numbers are invalid, cannot compare: {}", e));
                Ok(Outcome::Incomparable)
            }
        }
    }

    /// Repeats `run_iteration` until `abort` is set or `max_iterations` is reached.
    pub fn run_loop(&self, max_iterations: Option<u64>, abort: &AtomicBool) -> LoopSummary {
        let mut summary = LoopSummary::default();
        let start_time = Instant::now();

        match max_iterations {
            Some(n) => crate::log(&format!("Starting loop: {} iterations", n)),
            None => crate::log("Starting loop (type q + Enter to stop)"),
        }

        loop {
            if abort.load(Ordering::SeqCst) {
                crate::log("Abort requested, stopping loop");
                break;
            }
            if max_iterations.is_some_and(|n| summary.iterations >= n) {
                break;
            }

            let outcome = self.run_iteration();
            if let Err(e) = &outcome {
                crate::log(&format!(
                    "Iteration {} failed: {:#}",
                    summary.iterations + 1,
                    e
                ));
            }
            summary.record(&outcome);
        }

        crate::log(&format!(
            "Loop finished after {:.1}s: {}",
            start_time.elapsed().as_secs_f32(),
            summary
        ));
        summary
    }
}

fn remove_stale_screenshot(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

fn load_screenshot(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::compare::Symbol;
    use crate::automation::config::SymbolStrokes;
    use crate::automation::input::Swipe;
    use anyhow::anyhow;
    use image::{GrayImage, ImageBuffer, Rgba};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Writes a blank screenshot and records swipes.
    struct FakeDevice {
        write_screenshot: bool,
        fail_capture: bool,
        swipes: Mutex<Vec<Swipe>>,
    }

    impl FakeDevice {
        fn new() -> Self {
            Self {
                write_screenshot: true,
                fail_capture: false,
                swipes: Mutex::new(Vec::new()),
            }
        }

        fn swipes(&self) -> Vec<Swipe> {
            self.swipes.lock().unwrap().clone()
        }
    }

    impl Device for FakeDevice {
        fn capture_screenshot(&self, local: &Path) -> Result<()> {
            if self.fail_capture {
                return Err(anyhow!("device offline"));
            }
            if self.write_screenshot {
                let img: RgbaImage = ImageBuffer::from_pixel(1080, 1920, Rgba([240, 240, 240, 255]));
                img.save(local)?;
            }
            Ok(())
        }

        fn swipe(&self, swipe: &Swipe) -> Result<()> {
            self.swipes.lock().unwrap().push(*swipe);
            Ok(())
        }
    }

    /// Hands out canned OCR texts in call order.
    struct ScriptedRecognizer {
        texts: Mutex<Vec<&'static str>>,
    }

    impl ScriptedRecognizer {
        fn new(texts: &[&'static str]) -> Self {
            let mut texts = texts.to_vec();
            texts.reverse();
            Self {
                texts: Mutex::new(texts),
            }
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize(&self, _img: &GrayImage) -> Result<String> {
            self.texts
                .lock()
                .unwrap()
                .pop()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("no more scripted text"))
        }
    }

    fn test_config(regions: Vec<PixelRect>) -> BotConfig {
        BotConfig {
            poll_interval_ms: 0,
            regions,
            ..BotConfig::default()
        }
    }

    #[test]
    fn test_single_region_draws_greater() {
        let dir = tempdir().unwrap();
        let device = FakeDevice::new();
        let recognizer = ScriptedRecognizer::new(&["12 ? 7\n"]);
        let ctx = BotContext::new(
            &device,
            &recognizer,
            BotConfig {
                poll_interval_ms: 0,
                ..BotConfig::default()
            },
            dir.path().to_path_buf(),
        )
        .unwrap();

        let outcome = ctx.run_iteration().unwrap();

        assert_eq!(outcome, Outcome::Drawn(Symbol::Greater));
        assert_eq!(device.swipes(), SymbolStrokes::default().greater.to_vec());
        assert!(dir.path().join("screenshot.png").exists());
        assert!(dir.path().join("cropped_area.png").exists());
    }

    #[test]
    fn test_dual_region_draws_equal() {
        let dir = tempdir().unwrap();
        let device = FakeDevice::new();
        let recognizer = ScriptedRecognizer::new(&["33", "33"]);
        let config = test_config(vec![
            PixelRect::new(100, 500, 400, 700),
            PixelRect::new(600, 500, 900, 700),
        ]);
        let ctx = BotContext::new(&device, &recognizer, config, dir.path().to_path_buf()).unwrap();

        let outcome = ctx.run_iteration().unwrap();

        assert_eq!(outcome, Outcome::Drawn(Symbol::Equal));
        assert_eq!(device.swipes(), SymbolStrokes::default().equal.to_vec());
        assert!(dir.path().join("cropped_area_1.png").exists());
        assert!(dir.path().join("cropped_area_2.png").exists());
    }

    #[test]
    fn test_dual_region_sequential_keeps_order() {
        let dir = tempdir().unwrap();
        let device = FakeDevice::new();
        let recognizer = ScriptedRecognizer::new(&["4", "15"]);
        let mut config = test_config(vec![
            PixelRect::new(100, 500, 400, 700),
            PixelRect::new(600, 500, 900, 700),
        ]);
        config.parallel_ocr = false;
        let ctx = BotContext::new(&device, &recognizer, config, dir.path().to_path_buf()).unwrap();

        assert_eq!(ctx.run_iteration().unwrap(), Outcome::Drawn(Symbol::Less));
    }

    #[test]
    fn test_unrecognized_text_draws_nothing() {
        let dir = tempdir().unwrap();
        let device = FakeDevice::new();
        let recognizer = ScriptedRecognizer::new(&["?? ~"]);
        let ctx = BotContext::new(
            &device,
            &recognizer,
            test_config(vec![PixelRect::new(250, 570, 870, 750)]),
            dir.path().to_path_buf(),
        )
        .unwrap();

        assert_eq!(ctx.run_iteration().unwrap(), Outcome::Unrecognized);
        assert!(device.swipes().is_empty());
    }

    #[test]
    fn test_oversized_number_is_incomparable() {
        let dir = tempdir().unwrap();
        let device = FakeDevice::new();
        let recognizer = ScriptedRecognizer::new(&["99999999999999999999999 ? 1"]);
        let ctx = BotContext::new(
            &device,
            &recognizer,
            test_config(vec![PixelRect::new(250, 570, 870, 750)]),
            dir.path().to_path_buf(),
        )
        .unwrap();

        assert_eq!(ctx.run_iteration().unwrap(), Outcome::Incomparable);
        assert!(device.swipes().is_empty());
    }

    #[test]
    fn test_missing_screenshot_is_reported() {
        let dir = tempdir().unwrap();
        let mut device = FakeDevice::new();
        device.write_screenshot = false;
        let recognizer = ScriptedRecognizer::new(&[]);
        let ctx = BotContext::new(
            &device,
            &recognizer,
            test_config(vec![PixelRect::new(250, 570, 870, 750)]),
            dir.path().to_path_buf(),
        )
        .unwrap();

        assert_eq!(ctx.run_iteration().unwrap(), Outcome::MissingImage);
    }

    #[test]
    fn test_loop_continues_after_errors() {
        let dir = tempdir().unwrap();
        let mut device = FakeDevice::new();
        device.fail_capture = true;
        let recognizer = ScriptedRecognizer::new(&[]);
        let ctx = BotContext::new(
            &device,
            &recognizer,
            test_config(vec![PixelRect::new(250, 570, 870, 750)]),
            dir.path().to_path_buf(),
        )
        .unwrap();

        let summary = ctx.run_loop(Some(3), &AtomicBool::new(false));
        assert_eq!(summary.iterations, 3);
        assert_eq!(summary.errors, 3);
    }

    #[test]
    fn test_loop_mixes_outcomes() {
        let dir = tempdir().unwrap();
        let device = FakeDevice::new();
        let recognizer = ScriptedRecognizer::new(&["3 ? 9", "garbage", "5 ? 2"]);
        let ctx = BotContext::new(
            &device,
            &recognizer,
            test_config(vec![PixelRect::new(250, 570, 870, 750)]),
            dir.path().to_path_buf(),
        )
        .unwrap();

        let summary = ctx.run_loop(Some(3), &AtomicBool::new(false));
        assert_eq!(summary.drawn, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(device.swipes().len(), 4);
    }

    #[test]
    fn test_loop_stops_when_aborted() {
        let dir = tempdir().unwrap();
        let device = FakeDevice::new();
        let recognizer = ScriptedRecognizer::new(&[]);
        let ctx = BotContext::new(
            &device,
            &recognizer,
            test_config(vec![PixelRect::new(250, 570, 870, 750)]),
            dir.path().to_path_buf(),
        )
        .unwrap();

        let summary = ctx.run_loop(None, &AtomicBool::new(true));
        assert_eq!(summary.iterations, 0);
    }

    #[test]
    fn test_invalid_regions_rejected() {
        let dir = tempdir().unwrap();
        let device = FakeDevice::new();
        let recognizer = ScriptedRecognizer::new(&[]);
        let result = BotContext::new(
            &device,
            &recognizer,
            test_config(vec![]),
            dir.path().to_path_buf(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_region_outside_screenshot_is_unrecognized() {
        let dir = tempdir().unwrap();
        let device = FakeDevice::new();
        // Would hand back two numbers if it were ever asked
        let recognizer = ScriptedRecognizer::new(&["8 ? 3"]);
        let ctx = BotContext::new(
            &device,
            &recognizer,
            test_config(vec![PixelRect::new(5000, 5000, 5100, 5100)]),
            dir.path().to_path_buf(),
        )
        .unwrap();

        assert_eq!(ctx.run_iteration().unwrap(), Outcome::Unrecognized);
        assert!(device.swipes().is_empty());
        assert!(!dir.path().join("cropped_area.png").exists());
    }

    #[test]
    fn test_stale_screenshot_removed_before_capture() {
        let dir = tempdir().unwrap();
        let stale: RgbaImage = ImageBuffer::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        stale.save(dir.path().join("screenshot.png")).unwrap();

        let mut device = FakeDevice::new();
        device.write_screenshot = false;
        let recognizer = ScriptedRecognizer::new(&[]);
        let ctx = BotContext::new(
            &device,
            &recognizer,
            test_config(vec![PixelRect::new(250, 570, 870, 750)]),
            dir.path().to_path_buf(),
        )
        .unwrap();

        assert_eq!(ctx.run_iteration().unwrap(), Outcome::MissingImage);
    }

    #[test]
    fn test_remove_stale_screenshot_errors() {
        let dir = tempdir().unwrap();
        assert!(remove_stale_screenshot(&dir.path().join("absent.png")).is_ok());

        // A directory in place of the file cannot be removed with remove_file
        let blocked = dir.path().join("screenshot.png");
        fs::create_dir(&blocked).unwrap();
        assert!(remove_stale_screenshot(&blocked).is_err());
    }
}
